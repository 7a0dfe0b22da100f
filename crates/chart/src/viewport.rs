//! # Zoom Viewport
//!
//! Linear price scale over `[0, width]` pixels with a zoom transform
//! `px = k * base(price) + x` applied on top. Zooming and panning only change
//! `k` and `x`; the base domain is fixed when the viewport is built, so
//! resetting to the identity transform restores the initial view exactly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tickrange_types::{FeeTier, PriceRangeExtent};

use crate::error::{ChartError, ChartResult};

/// Padding applied around a starting extent that falls outside the default view
const EXTENT_PADDING: f64 = 1.1;

/// Zoom bounds and initial view for a fee tier, as multiples of current price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLevels {
    /// Left edge of the initial view
    pub initial_min: f64,
    /// Right edge of the initial view
    pub initial_max: f64,
    /// Smallest zoom factor
    pub min_zoom: f64,
    /// Largest zoom factor
    pub max_zoom: f64,
    /// Half-width of a brand-new selection around the current price
    pub default_range_half_width: f64,
}

impl ZoomLevels {
    pub fn for_fee_tier(fee_tier: FeeTier) -> Self {
        if fee_tier.is_stable() {
            Self {
                initial_min: 0.999,
                initial_max: 1.001,
                min_zoom: 0.00001,
                max_zoom: 1.5,
                default_range_half_width: 0.001,
            }
        } else {
            Self {
                initial_min: 0.5,
                initial_max: 2.0,
                min_zoom: 0.00001,
                max_zoom: 20.0,
                default_range_half_width: 0.25,
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !(positive(self.initial_min) && positive(self.initial_max)) || self.initial_min >= self.initial_max {
            return Err(format!(
                "initial view [{}, {}] must be positive and ordered",
                self.initial_min, self.initial_max
            ));
        }
        if !(positive(self.min_zoom) && positive(self.max_zoom)) || self.min_zoom > self.max_zoom {
            return Err(format!(
                "zoom extent [{}, {}] must be positive and ordered",
                self.min_zoom, self.max_zoom
            ));
        }
        if !(self.default_range_half_width > 0.0 && self.default_range_half_width < 1.0) {
            return Err(format!(
                "default_range_half_width {} must lie in (0, 1)",
                self.default_range_half_width
            ));
        }
        Ok(())
    }

    /// Default selection around `current_price`
    pub fn default_range(&self, current_price: f64) -> Option<PriceRangeExtent> {
        PriceRangeExtent::new(
            current_price * (1.0 - self.default_range_half_width),
            current_price * (1.0 + self.default_range_half_width),
        )
    }
}

/// Scale factor `k` and translation `x` in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform { k: 1.0, x: 0.0 };

    pub fn apply(&self, base_px: f64) -> f64 {
        self.k * base_px + self.x
    }

    pub fn invert(&self, px: f64) -> f64 {
        (px - self.x) / self.k
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomViewport {
    levels: ZoomLevels,
    domain_min: f64,
    domain_max: f64,
    width: f64,
    transform: ZoomTransform,
}

impl ZoomViewport {
    /// Build the initial view around `current_price`, widened so a
    /// `starting` selection stays visible
    pub fn new(
        current_price: f64,
        width: f64,
        levels: ZoomLevels,
        starting: Option<PriceRangeExtent>,
    ) -> ChartResult<Self> {
        if !(current_price.is_finite() && current_price > 0.0) {
            return Err(ChartError::InvalidViewport(format!("current price {}", current_price)));
        }
        validate_width(width)?;
        levels.validate().map_err(ChartError::InvalidViewport)?;

        let mut domain_min = current_price * levels.initial_min;
        let mut domain_max = current_price * levels.initial_max;

        if let Some(extent) = starting.filter(PriceRangeExtent::is_valid) {
            if extent.lower < domain_min {
                domain_min = extent.lower / EXTENT_PADDING;
            }
            if extent.upper > domain_max {
                domain_max = extent.upper * EXTENT_PADDING;
            }
        }

        if !(domain_min.is_finite() && domain_max.is_finite() && domain_min < domain_max) {
            return Err(ChartError::InvalidViewport(format!(
                "empty price domain [{}, {}]",
                domain_min, domain_max
            )));
        }

        debug!(domain_min, domain_max, width, "initialized zoom viewport");

        Ok(Self {
            levels,
            domain_min,
            domain_max,
            width,
            transform: ZoomTransform::IDENTITY,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn levels(&self) -> &ZoomLevels {
        &self.levels
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Unzoomed price domain
    pub fn base_domain(&self) -> (f64, f64) {
        (self.domain_min, self.domain_max)
    }

    fn base_scale(&self, price: f64) -> f64 {
        (price - self.domain_min) / (self.domain_max - self.domain_min) * self.width
    }

    fn base_invert(&self, base_px: f64) -> f64 {
        self.domain_min + base_px / self.width * (self.domain_max - self.domain_min)
    }

    pub fn price_to_pixel(&self, price: f64) -> f64 {
        self.transform.apply(self.base_scale(price))
    }

    pub fn pixel_to_price(&self, px: f64) -> f64 {
        self.base_invert(self.transform.invert(px))
    }

    /// Prices at the left and right chart edges
    pub fn visible_domain(&self) -> (f64, f64) {
        (self.pixel_to_price(0.0), self.pixel_to_price(self.width))
    }

    pub fn is_visible(&self, px: f64) -> bool {
        (0.0..=self.width).contains(&px)
    }

    /// Scale by `factor` keeping the price under `px` in place.
    /// The resulting `k` is clamped to the zoom extent.
    pub fn zoom_at(&mut self, px: f64, factor: f64) {
        if !(factor.is_finite() && factor > 0.0 && px.is_finite()) {
            return;
        }

        let k = (self.transform.k * factor).clamp(self.levels.min_zoom, self.levels.max_zoom);
        let x = px - (px - self.transform.x) * k / self.transform.k;
        self.transform = ZoomTransform { k, x };
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.width / 2.0, 2.0);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.width / 2.0, 0.5);
    }

    pub fn pan(&mut self, dx: f64) {
        if dx.is_finite() {
            self.transform.x += dx;
        }
    }

    /// Change the pixel width, keeping the visible price domain
    pub fn resize(&mut self, width: f64) -> ChartResult<()> {
        validate_width(width)?;
        self.transform.x *= width / self.width;
        self.width = width;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.transform = ZoomTransform::IDENTITY;
    }
}

fn validate_width(width: f64) -> ChartResult<()> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(ChartError::InvalidViewport(format!("width {}", width)))
    }
}
