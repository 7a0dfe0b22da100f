//! # Liquidity Range Chart
//!
//! Owns the curve, viewport and range controller for one pool and routes
//! pool refreshes, orientation changes and pointer input between them.
//!
//! Snapshot refreshes never interrupt a gesture. A snapshot arriving while a
//! handle is being dragged is parked and applied as soon as the gesture ends.

use std::sync::Arc;

use tracing::{debug, info, warn};

use tickrange_math::{PriceTickConverter, MAX_TICK, MIN_TICK};
use tickrange_types::{PoolSnapshot, PriceRangeExtent};

use crate::brush::{CommitMode, CommittedRange, DragHandle, RangeSelectionController};
use crate::config::ChartConfig;
use crate::curve::{Curve, CurveCache};
use crate::error::{ChartError, ChartResult};
use crate::labels::LabelFormatter;
use crate::viewport::ZoomViewport;

/// Display state of the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartStatus {
    Ready,
    /// Curve built from inconsistent data; still drawable
    Degraded,
    NoLiquidityData,
}

/// What happened to an incoming snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotOutcome {
    Applied,
    /// Parked until the current gesture ends
    Deferred,
    /// Older than the snapshot already held, discarded
    Stale,
}

/// How the selection starts out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartingRange {
    /// Range around the current price sized by the fee tier
    Default,
    Extent(PriceRangeExtent),
    /// Raw pool ticks of an existing position
    Ticks(i32, i32),
}

#[derive(Debug)]
pub struct LiquidityRangeChart {
    config: ChartConfig,
    formatter: LabelFormatter,
    cache: CurveCache,

    snapshot: PoolSnapshot,
    pending: Option<PoolSnapshot>,
    revert: bool,

    curve: Option<Arc<Curve>>,
    current_price: f64,
    viewport: ZoomViewport,
    controller: RangeSelectionController,
}

impl LiquidityRangeChart {
    pub fn new(
        snapshot: PoolSnapshot,
        config: ChartConfig,
        revert: bool,
        starting: StartingRange,
    ) -> ChartResult<Self> {
        config.validate()?;

        let mut cache = CurveCache::new(config.price_digits);
        let curve = cache.get_or_build(&snapshot, revert)?;
        let (current_price, controller, viewport) =
            selection_for(&snapshot, &config, revert, starting, config.default_width_px)?;

        info!(
            pool = %snapshot.pool_id,
            fee_tier = %snapshot.fee_tier,
            revert,
            "liquidity range chart ready"
        );

        Ok(Self {
            formatter: LabelFormatter::from_config(&config.labels),
            config,
            cache,
            snapshot,
            pending: None,
            revert,
            curve,
            current_price,
            viewport,
            controller,
        })
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn formatter(&self) -> &LabelFormatter {
        &self.formatter
    }

    pub fn snapshot(&self) -> &PoolSnapshot {
        &self.snapshot
    }

    pub fn has_pending_snapshot(&self) -> bool {
        self.pending.is_some()
    }

    pub fn revert(&self) -> bool {
        self.revert
    }

    pub fn curve(&self) -> Option<&Curve> {
        self.curve.as_deref()
    }

    pub fn status(&self) -> ChartStatus {
        match self.curve.as_deref() {
            None => ChartStatus::NoLiquidityData,
            Some(curve) if curve.degraded => ChartStatus::Degraded,
            Some(_) => ChartStatus::Ready,
        }
    }

    /// Display price at the pool's current tick
    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn viewport(&self) -> &ZoomViewport {
        &self.viewport
    }

    /// Zoom and pan access. Zooming never touches the selection.
    pub fn viewport_mut(&mut self) -> &mut ZoomViewport {
        &mut self.viewport
    }

    pub fn controller(&self) -> &RangeSelectionController {
        &self.controller
    }

    /// Typed, stepped, full-range and reset edits
    pub fn controller_mut(&mut self) -> &mut RangeSelectionController {
        &mut self.controller
    }

    pub fn on_range_committed(&mut self, callback: impl FnMut(&CommittedRange, CommitMode) + 'static) {
        self.controller.set_on_range_committed(callback);
    }

    /// `(lower, upper)` labels for the selection on screen
    pub fn labels(&self) -> (String, String) {
        self.controller.labels(&self.formatter, self.current_price)
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    /// Accept a refreshed snapshot. The latest generation wins.
    pub fn apply_snapshot(&mut self, snapshot: PoolSnapshot) -> ChartResult<SnapshotOutcome> {
        let newest_held = self.pending.as_ref().unwrap_or(&self.snapshot);
        if snapshot.pool_id == newest_held.pool_id && snapshot.generation < newest_held.generation {
            warn!(
                pool = %snapshot.pool_id,
                generation = snapshot.generation,
                held = newest_held.generation,
                "discarding stale snapshot"
            );
            return Ok(SnapshotOutcome::Stale);
        }

        if self.controller.is_dragging() {
            debug!(generation = snapshot.generation, "gesture in progress, deferring snapshot");
            self.pending = Some(snapshot);
            return Ok(SnapshotOutcome::Deferred);
        }

        self.install(snapshot)?;
        Ok(SnapshotOutcome::Applied)
    }

    fn install(&mut self, snapshot: PoolSnapshot) -> ChartResult<()> {
        let same_market = snapshot.pool_id == self.snapshot.pool_id
            && snapshot.tick_spacing == self.snapshot.tick_spacing
            && snapshot.decimals0 == self.snapshot.decimals0
            && snapshot.decimals1 == self.snapshot.decimals1;

        let curve = self.cache.get_or_build(&snapshot, self.revert)?;

        if same_market {
            self.current_price = current_price(&snapshot, self.revert)?;
        } else {
            info!(from = %self.snapshot.pool_id, to = %snapshot.pool_id, "switching pool");
            let (current_price, mut controller, viewport) = selection_for(
                &snapshot,
                &self.config,
                self.revert,
                StartingRange::Default,
                self.viewport.width(),
            )?;
            if let Some(callback) = self.controller.take_on_range_committed() {
                controller.set_boxed_on_range_committed(callback);
            }
            self.cache.invalidate(&self.snapshot.pool_id);
            self.current_price = current_price;
            self.controller = controller;
            self.viewport = viewport;
        }

        debug!(pool = %snapshot.pool_id, generation = snapshot.generation, "snapshot applied");
        self.curve = curve;
        self.snapshot = snapshot;
        Ok(())
    }

    /// Install the snapshot deferred by a gesture. A snapshot that cannot be
    /// installed is dropped and the current one stays.
    fn apply_pending(&mut self) {
        if let Some(snapshot) = self.pending.take() {
            let generation = snapshot.generation;
            if let Err(err) = self.install(snapshot) {
                warn!(
                    error = %err,
                    generation,
                    held = self.snapshot.generation,
                    "failed to apply deferred snapshot, keeping current one"
                );
            }
        }
    }

    // ------------------------------------------------------------------------
    // Orientation
    // ------------------------------------------------------------------------

    /// Flip the price orientation. The committed ticks are kept as they are
    /// and the view is rebuilt around the inverted current price.
    pub fn set_revert(&mut self, revert: bool) -> ChartResult<()> {
        if revert == self.revert {
            return Ok(());
        }
        if self.controller.is_dragging() {
            return Err(ChartError::GestureInProgress);
        }

        let converter = converter_for(&self.snapshot, revert);
        let current_price = current_price(&self.snapshot, revert)?;
        let curve = self.cache.get_or_build(&self.snapshot, revert)?;
        self.controller.set_converter(converter)?;

        let levels = self.config.zoom_levels(self.snapshot.fee_tier);
        self.viewport = ZoomViewport::new(
            current_price,
            self.viewport.width(),
            levels,
            viewport_anchor(self.controller.committed()),
        )?;

        self.revert = revert;
        self.current_price = current_price;
        self.curve = curve;
        debug!(revert, "price orientation changed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------------

    /// Start a gesture on whatever part of the brush is under `px`
    pub fn pointer_down(&mut self, px: f64) -> ChartResult<Option<DragHandle>> {
        let hit = self.controller.hit_test(px, &self.viewport);
        if let Some(handle) = hit {
            self.controller.start_gesture(handle, px)?;
        }
        Ok(hit)
    }

    pub fn pointer_move(&mut self, px: f64) -> Option<PriceRangeExtent> {
        self.controller.move_gesture(px, &self.viewport)
    }

    /// End the gesture, commit the snapped range, then apply any snapshot
    /// that arrived meanwhile
    pub fn pointer_up(&mut self) -> ChartResult<Option<CommittedRange>> {
        let committed = self.controller.end_gesture();
        self.apply_pending();
        committed
    }

    /// Abandon the gesture, then apply any deferred snapshot
    pub fn cancel_gesture(&mut self) -> bool {
        let cancelled = self.controller.cancel_gesture();
        self.apply_pending();
        cancelled
    }

    /// Wheel zoom anchored at the pointer
    pub fn wheel(&mut self, px: f64, factor: f64) {
        self.viewport.zoom_at(px, factor);
    }
}

fn converter_for(snapshot: &PoolSnapshot, revert: bool) -> PriceTickConverter {
    PriceTickConverter::new(snapshot.decimals0, snapshot.decimals1, revert)
}

fn current_price(snapshot: &PoolSnapshot, revert: bool) -> ChartResult<f64> {
    let tick = snapshot.tick_current.clamp(MIN_TICK, MAX_TICK);
    Ok(converter_for(snapshot, revert).tick_to_price_f64(tick)?)
}

/// Selection the initial view should keep on screen. Limit bounds sit at
/// astronomically small or large prices and are left out.
fn viewport_anchor(range: &CommittedRange) -> Option<PriceRangeExtent> {
    (!range.at_limit.lower && !range.at_limit.upper).then_some(range.extent)
}

fn selection_for(
    snapshot: &PoolSnapshot,
    config: &ChartConfig,
    revert: bool,
    starting: StartingRange,
    width: f64,
) -> ChartResult<(f64, RangeSelectionController, ZoomViewport)> {
    let converter = converter_for(snapshot, revert);
    let current_price = current_price(snapshot, revert)?;
    let levels = config.zoom_levels(snapshot.fee_tier);
    let tolerance = config.handle_hit_tolerance_px;

    let controller = match starting {
        StartingRange::Default => {
            let extent = levels.default_range(current_price).ok_or(ChartError::InvalidRange {
                lower: current_price,
                upper: current_price,
            })?;
            RangeSelectionController::new(converter, snapshot.tick_spacing, extent, tolerance)?
        }
        StartingRange::Extent(extent) => {
            RangeSelectionController::new(converter, snapshot.tick_spacing, extent, tolerance)?
        }
        StartingRange::Ticks(lower, upper) => {
            RangeSelectionController::with_ticks(converter, snapshot.tick_spacing, lower, upper, tolerance)?
        }
    };

    let viewport = ZoomViewport::new(current_price, width, levels, viewport_anchor(controller.committed()))?;
    Ok((current_price, controller, viewport))
}
