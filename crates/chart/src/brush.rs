//! # Range Selection Controller
//!
//! Two-handled brush over the price axis. Gestures move a *live* extent that
//! is never snapped, so handles track the pointer smoothly; releasing the
//! pointer snaps both bounds to usable ticks and commits the result.
//!
//! Gesture lifecycle: `Idle -> Dragging -> SnapPending -> Idle`.
//!
//! All extents here are in display orientation. With a reverted pair the
//! display lower bound sits on the higher raw tick, so committed ticks are
//! stored raw and display values are always derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tickrange_math::{
    is_usable_tick, max_usable_tick, min_usable_tick, validate_tick_spacing, PriceTickConverter, TICK_BASE_F64,
};
use tickrange_types::{Bound, PriceRangeExtent};

use crate::error::{ChartError, ChartResult};
use crate::labels::{LabelFormatter, Sentinel};
use crate::viewport::ZoomViewport;

/// Part of the brush a gesture grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragHandle {
    /// Lower bound handle (left)
    West,
    /// Upper bound handle (right)
    East,
    /// Selection body, moves both bounds
    Whole,
}

impl DragHandle {
    pub fn bound(&self) -> Option<Bound> {
        match self {
            DragHandle::West => Some(Bound::Lower),
            DragHandle::East => Some(Bound::Upper),
            DragHandle::Whole => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging {
        handle: DragHandle,
        /// Pointer position when the gesture started
        anchor_px: f64,
        /// Live extent when the gesture started
        origin: PriceRangeExtent,
    },
    /// Gesture released, bounds being snapped
    SnapPending,
}

/// Bounds resting on a usable tick limit, in display orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TicksAtLimit {
    pub lower: bool,
    pub upper: bool,
}

impl TicksAtLimit {
    pub fn get(&self, bound: Bound) -> bool {
        match bound {
            Bound::Lower => self.lower,
            Bound::Upper => self.upper,
        }
    }

    /// Lower at its limit reads "0", upper at its limit reads "∞"
    pub fn sentinel(&self, bound: Bound) -> Option<Sentinel> {
        match bound {
            Bound::Lower if self.lower => Some(Sentinel::Zero),
            Bound::Upper if self.upper => Some(Sentinel::Infinity),
            _ => None,
        }
    }
}

/// A snapped selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommittedRange {
    /// Display prices of the two ticks
    pub extent: PriceRangeExtent,
    /// Raw pool ticks, `lower_tick < upper_tick`
    pub lower_tick: i32,
    pub upper_tick: i32,
    pub at_limit: TicksAtLimit,
}

impl CommittedRange {
    /// Range between two distinct usable raw ticks, in any order
    pub fn from_ticks(
        converter: &PriceTickConverter,
        tick_spacing: i32,
        tick_a: i32,
        tick_b: i32,
    ) -> ChartResult<Self> {
        validate_tick_spacing(tick_spacing)?;
        if let Some(tick) = [tick_a, tick_b].into_iter().find(|&t| !is_usable_tick(t, tick_spacing)) {
            return Err(ChartError::InvalidBoundInput(format!(
                "tick {} is not usable with spacing {}",
                tick, tick_spacing
            )));
        }

        let (lower_tick, upper_tick) = (tick_a.min(tick_b), tick_a.max(tick_b));
        let price_at_lower = converter.tick_to_price_f64(lower_tick)?;
        let price_at_upper = converter.tick_to_price_f64(upper_tick)?;

        let (lower, upper) = if converter.revert {
            (price_at_upper, price_at_lower)
        } else {
            (price_at_lower, price_at_upper)
        };
        let extent = PriceRangeExtent::new(lower, upper).ok_or(ChartError::InvalidRange { lower, upper })?;

        let min = min_usable_tick(tick_spacing)?;
        let max = max_usable_tick(tick_spacing)?;
        let at_limit = if converter.revert {
            TicksAtLimit {
                lower: upper_tick >= max,
                upper: lower_tick <= min,
            }
        } else {
            TicksAtLimit {
                lower: lower_tick <= min,
                upper: upper_tick >= max,
            }
        };

        Ok(Self {
            extent,
            lower_tick,
            upper_tick,
            at_limit,
        })
    }

    /// Raw tick behind a display bound
    pub fn display_tick(&self, bound: Bound, revert: bool) -> i32 {
        match (bound, revert) {
            (Bound::Lower, false) | (Bound::Upper, true) => self.lower_tick,
            (Bound::Upper, false) | (Bound::Lower, true) => self.upper_tick,
        }
    }

    pub fn is_full_range(&self) -> bool {
        self.at_limit.lower && self.at_limit.upper
    }
}

/// What produced a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One handle dragged
    Handle,
    /// Whole selection dragged
    Drag,
    Typed,
    Step,
    FullRange,
    Reset,
}

/// Display-price direction of a single-step edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Up,
    Down,
}

/// Where a handle projects under the current zoom
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleVisibility {
    Visible(f64),
    OffscreenWest,
    OffscreenEast,
}

pub type RangeCommittedCallback = Box<dyn FnMut(&CommittedRange, CommitMode)>;

pub struct RangeSelectionController {
    converter: PriceTickConverter,
    tick_spacing: i32,

    /// Display prices of the usable tick limits, lowest first
    price_limits: (f64, f64),

    hit_tolerance_px: f64,
    state: GestureState,
    live: PriceRangeExtent,
    committed: CommittedRange,
    starting: CommittedRange,
    on_range_committed: Option<RangeCommittedCallback>,
}

impl fmt::Debug for RangeSelectionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeSelectionController")
            .field("converter", &self.converter)
            .field("tick_spacing", &self.tick_spacing)
            .field("state", &self.state)
            .field("live", &self.live)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

impl RangeSelectionController {
    /// Controller whose starting range is `starting` snapped to usable ticks
    pub fn new(
        converter: PriceTickConverter,
        tick_spacing: i32,
        starting: PriceRangeExtent,
        hit_tolerance_px: f64,
    ) -> ChartResult<Self> {
        validate_tick_spacing(tick_spacing)?;
        if !starting.is_valid() {
            return Err(ChartError::InvalidRange {
                lower: starting.lower,
                upper: starting.upper,
            });
        }

        let range = snap_extent(&converter, tick_spacing, &starting, None)?;
        Self::from_committed(converter, tick_spacing, range, hit_tolerance_px)
    }

    /// Controller starting from an existing pair of raw ticks
    pub fn with_ticks(
        converter: PriceTickConverter,
        tick_spacing: i32,
        lower_tick: i32,
        upper_tick: i32,
        hit_tolerance_px: f64,
    ) -> ChartResult<Self> {
        validate_tick_spacing(tick_spacing)?;
        if lower_tick == upper_tick {
            return Err(ChartError::InvalidBoundInput(format!(
                "ticks {} and {} coincide",
                lower_tick, upper_tick
            )));
        }

        let range = CommittedRange::from_ticks(&converter, tick_spacing, lower_tick, upper_tick)?;
        Self::from_committed(converter, tick_spacing, range, hit_tolerance_px)
    }

    fn from_committed(
        converter: PriceTickConverter,
        tick_spacing: i32,
        range: CommittedRange,
        hit_tolerance_px: f64,
    ) -> ChartResult<Self> {
        let price_limits = converter.usable_price_bounds(tick_spacing)?;

        Ok(Self {
            converter,
            tick_spacing,
            price_limits,
            hit_tolerance_px,
            state: GestureState::Idle,
            live: range.extent,
            committed: range,
            starting: range,
            on_range_committed: None,
        })
    }

    pub fn set_on_range_committed(&mut self, callback: impl FnMut(&CommittedRange, CommitMode) + 'static) {
        self.on_range_committed = Some(Box::new(callback));
    }

    pub fn set_boxed_on_range_committed(&mut self, callback: RangeCommittedCallback) {
        self.on_range_committed = Some(callback);
    }

    pub fn take_on_range_committed(&mut self) -> Option<RangeCommittedCallback> {
        self.on_range_committed.take()
    }

    pub fn converter(&self) -> &PriceTickConverter {
        &self.converter
    }

    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Extent currently on screen: unsnapped during a drag, committed otherwise
    pub fn live_extent(&self) -> PriceRangeExtent {
        self.live
    }

    pub fn committed(&self) -> &CommittedRange {
        &self.committed
    }

    pub fn starting(&self) -> &CommittedRange {
        &self.starting
    }

    pub fn price_limits(&self) -> (f64, f64) {
        self.price_limits
    }

    fn ensure_idle(&self) -> ChartResult<()> {
        match self.state {
            GestureState::Idle => Ok(()),
            _ => Err(ChartError::GestureInProgress),
        }
    }

    fn commit(&mut self, range: CommittedRange, mode: CommitMode) {
        self.committed = range;
        self.live = range.extent;

        debug!(
            lower_tick = range.lower_tick,
            upper_tick = range.upper_tick,
            ?mode,
            "range committed"
        );

        if let Some(callback) = self.on_range_committed.as_mut() {
            callback(&range, mode);
        }
    }

    /// Raw tick at the display-side limit of `bound`
    fn limit_tick(&self, bound: Bound) -> ChartResult<i32> {
        let at_low_end = matches!(bound, Bound::Lower) != self.converter.revert;
        Ok(if at_low_end {
            min_usable_tick(self.tick_spacing)?
        } else {
            max_usable_tick(self.tick_spacing)?
        })
    }

    // ------------------------------------------------------------------------
    // Pointer gestures
    // ------------------------------------------------------------------------

    /// Which part of the brush sits under `px`
    pub fn hit_test(&self, px: f64, viewport: &ZoomViewport) -> Option<DragHandle> {
        if !px.is_finite() {
            return None;
        }

        let west = viewport.price_to_pixel(self.live.lower);
        let east = viewport.price_to_pixel(self.live.upper);
        let to_west = (px - west).abs();
        let to_east = (px - east).abs();

        if to_west <= self.hit_tolerance_px || to_east <= self.hit_tolerance_px {
            // overlapping handles: whichever side of them the pointer is on
            let handle = if to_west < to_east || (to_west == to_east && px < east) {
                DragHandle::West
            } else {
                DragHandle::East
            };
            return Some(handle);
        }

        (px > west && px < east).then_some(DragHandle::Whole)
    }

    pub fn start_gesture(&mut self, handle: DragHandle, px: f64) -> ChartResult<()> {
        self.ensure_idle()?;
        self.state = GestureState::Dragging {
            handle,
            anchor_px: px,
            origin: self.live,
        };
        debug!(?handle, px, "gesture started");
        Ok(())
    }

    /// Move the grabbed part to `px` and return the new live extent.
    ///
    /// A handle stops one tick short of the other instead of crossing it.
    pub fn move_gesture(&mut self, px: f64, viewport: &ZoomViewport) -> Option<PriceRangeExtent> {
        let (handle, anchor_px, origin) = match self.state {
            GestureState::Dragging {
                handle,
                anchor_px,
                origin,
            } => (handle, anchor_px, origin),
            _ => return None,
        };
        if !px.is_finite() {
            return Some(self.live);
        }

        let (low_limit, high_limit) = self.price_limits;
        let price = viewport.pixel_to_price(px);

        let candidate = match handle {
            DragHandle::West => {
                let lower = price.max(low_limit).min(self.live.upper / TICK_BASE_F64);
                self.live.with_bound(Bound::Lower, lower)
            }
            DragHandle::East => {
                let upper = price.min(high_limit).max(self.live.lower * TICK_BASE_F64);
                self.live.with_bound(Bound::Upper, upper)
            }
            DragHandle::Whole => {
                let delta = price - viewport.pixel_to_price(anchor_px);
                let width = origin.width();
                let mut lower = (origin.lower + delta).max(low_limit);
                let mut upper = lower + width;
                if upper > high_limit {
                    upper = high_limit;
                    lower = (upper - width).max(low_limit);
                }
                PriceRangeExtent { lower, upper }
            }
        };

        // width lost to rounding at extreme magnitudes; hold position
        if candidate.is_valid() {
            self.live = candidate;
        }
        Some(self.live)
    }

    /// Snap the live extent and commit it.
    ///
    /// Returns `Ok(None)` when no gesture was in progress. On failure the
    /// prior committed range is kept and the live extent returns to it.
    pub fn end_gesture(&mut self) -> ChartResult<Option<CommittedRange>> {
        let handle = match self.state {
            GestureState::Dragging { handle, .. } => handle,
            _ => return Ok(None),
        };

        self.state = GestureState::SnapPending;
        let snapped = snap_extent(&self.converter, self.tick_spacing, &self.live, handle.bound());
        self.state = GestureState::Idle;

        match snapped {
            Ok(range) => {
                let mode = match handle {
                    DragHandle::Whole => CommitMode::Drag,
                    DragHandle::West | DragHandle::East => CommitMode::Handle,
                };
                self.commit(range, mode);
                Ok(Some(range))
            }
            Err(err) => {
                warn!(error = %err, "failed to snap range, keeping previous selection");
                self.live = self.committed.extent;
                Err(err)
            }
        }
    }

    /// Abandon the gesture and restore the extent it started from
    pub fn cancel_gesture(&mut self) -> bool {
        match self.state {
            GestureState::Dragging { origin, .. } => {
                self.live = origin;
                self.state = GestureState::Idle;
                debug!("gesture cancelled");
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Direct edits
    // ------------------------------------------------------------------------

    /// Commit a typed bound. `"0"` (lower) and `"∞"` (upper) select the limit.
    ///
    /// Anything unparsable, non-positive, or crossing the other bound is
    /// rejected and the committed range is left as it was.
    pub fn set_typed_bound(&mut self, bound: Bound, text: &str) -> ChartResult<CommittedRange> {
        self.ensure_idle()?;

        let input = text.trim();
        let tick = match (bound, input) {
            (Bound::Lower, "0") | (Bound::Upper, "∞") => self.limit_tick(bound)?,
            _ => {
                let price = input
                    .parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite() && *p > 0.0)
                    .ok_or_else(|| ChartError::InvalidBoundInput(text.to_string()))?;

                let candidate = self.committed.extent.with_bound(bound, price);
                if !candidate.is_valid() {
                    return Err(ChartError::InvalidRange {
                        lower: candidate.lower,
                        upper: candidate.upper,
                    });
                }
                self.converter.price_to_nearest_usable_tick(price, self.tick_spacing)?
            }
        };

        let range = self.range_with_display_tick(bound, tick)?;
        self.commit(range, CommitMode::Typed);
        Ok(range)
    }

    /// Move one bound by a single tick spacing in display-price direction.
    /// A bound already at its limit stays put.
    pub fn step_bound(&mut self, bound: Bound, direction: StepDirection) -> ChartResult<CommittedRange> {
        self.ensure_idle()?;

        let raw_step = match (direction, self.converter.revert) {
            (StepDirection::Up, false) | (StepDirection::Down, true) => self.tick_spacing,
            (StepDirection::Down, false) | (StepDirection::Up, true) => -self.tick_spacing,
        };
        let current = self.committed.display_tick(bound, self.converter.revert);
        let min = min_usable_tick(self.tick_spacing)?;
        let max = max_usable_tick(self.tick_spacing)?;

        let tick = current.saturating_add(raw_step);
        if tick < min || tick > max {
            debug!(?bound, ?direction, "step would leave usable range");
            return Ok(self.committed);
        }

        let range = self.range_with_display_tick(bound, tick)?;
        self.commit(range, CommitMode::Step);
        Ok(range)
    }

    pub fn set_full_range(&mut self) -> ChartResult<CommittedRange> {
        self.ensure_idle()?;
        let range = CommittedRange::from_ticks(
            &self.converter,
            self.tick_spacing,
            min_usable_tick(self.tick_spacing)?,
            max_usable_tick(self.tick_spacing)?,
        )?;
        self.commit(range, CommitMode::FullRange);
        Ok(range)
    }

    /// Return to the range the controller started with
    pub fn reset_range(&mut self) -> ChartResult<CommittedRange> {
        self.ensure_idle()?;
        let range = self.starting;
        self.commit(range, CommitMode::Reset);
        Ok(range)
    }

    /// Committed range with the display `bound` moved to raw `tick`,
    /// rejected if it would meet or cross the other bound
    fn range_with_display_tick(&self, bound: Bound, tick: i32) -> ChartResult<CommittedRange> {
        let revert = self.converter.revert;
        let other = self.committed.display_tick(bound.opposite(), revert);

        let crossing = || {
            let extent = self.committed.extent;
            ChartError::InvalidRange {
                lower: extent.lower,
                upper: extent.upper,
            }
        };

        if tick == other {
            return Err(crossing());
        }
        let range = CommittedRange::from_ticks(&self.converter, self.tick_spacing, tick, other)?;
        if range.display_tick(bound, revert) != tick {
            return Err(crossing());
        }
        Ok(range)
    }

    /// Switch price orientation. Display values are re-derived from the
    /// committed ticks, so sentinels carry over unchanged.
    pub fn set_converter(&mut self, converter: PriceTickConverter) -> ChartResult<()> {
        self.ensure_idle()?;

        let rederive = |range: &CommittedRange| {
            CommittedRange::from_ticks(&converter, self.tick_spacing, range.lower_tick, range.upper_tick)
        };
        let committed = rederive(&self.committed)?;
        let starting = rederive(&self.starting)?;
        let price_limits = converter.usable_price_bounds(self.tick_spacing)?;

        self.converter = converter;
        self.price_limits = price_limits;
        self.committed = committed;
        self.starting = starting;
        self.live = committed.extent;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------------

    /// Sentinel for a bound of the extent on screen
    pub fn sentinel(&self, bound: Bound) -> Option<Sentinel> {
        match self.state {
            GestureState::Idle => self.committed.at_limit.sentinel(bound),
            _ => {
                let at_limit = TicksAtLimit {
                    lower: self.live.lower <= self.price_limits.0,
                    upper: self.live.upper >= self.price_limits.1,
                };
                at_limit.sentinel(bound)
            }
        }
    }

    pub fn label(&self, bound: Bound, formatter: &LabelFormatter, current_price: f64) -> String {
        formatter.format(self.live.get(bound), current_price, self.sentinel(bound))
    }

    /// `(lower, upper)` labels for the extent on screen
    pub fn labels(&self, formatter: &LabelFormatter, current_price: f64) -> (String, String) {
        (
            self.label(Bound::Lower, formatter, current_price),
            self.label(Bound::Upper, formatter, current_price),
        )
    }

    pub fn handle_visibility(&self, bound: Bound, viewport: &ZoomViewport) -> HandleVisibility {
        let px = viewport.price_to_pixel(self.live.get(bound));
        if px < 0.0 {
            HandleVisibility::OffscreenWest
        } else if px > viewport.width() {
            HandleVisibility::OffscreenEast
        } else {
            HandleVisibility::Visible(px)
        }
    }
}

/// Snap both bounds of `extent` to usable ticks.
///
/// Bounds that land on the same tick are pushed one spacing apart. The
/// `yielding` display bound gives way and the other keeps its tick, unless
/// the yielding side is already at a usable limit. Without a yielding
/// bound the upper raw tick gives way.
fn snap_extent(
    converter: &PriceTickConverter,
    tick_spacing: i32,
    extent: &PriceRangeExtent,
    yielding: Option<Bound>,
) -> ChartResult<CommittedRange> {
    let tick_a = converter.price_to_nearest_usable_tick(extent.lower, tick_spacing)?;
    let tick_b = converter.price_to_nearest_usable_tick(extent.upper, tick_spacing)?;
    if tick_a != tick_b {
        return CommittedRange::from_ticks(converter, tick_spacing, tick_a, tick_b);
    }

    // raw direction the yielding display bound moves away in
    let away = match (yielding, converter.revert) {
        (Some(Bound::Lower), false) | (Some(Bound::Upper), true) => -tick_spacing,
        _ => tick_spacing,
    };
    let min = min_usable_tick(tick_spacing)?;
    let max = max_usable_tick(tick_spacing)?;

    let moved = tick_a + away;
    let (tick_a, tick_b) = if (min..=max).contains(&moved) {
        (tick_a, moved)
    } else {
        debug!(tick = tick_a, ?yielding, "collision at usable limit, other bound gives way");
        (tick_a - away, tick_a)
    };
    CommittedRange::from_ticks(converter, tick_spacing, tick_a, tick_b)
}
