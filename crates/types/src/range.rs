//! # Range Types
//!
//! Price-space extents selected by the user.

use serde::{Deserialize, Serialize};

/// One side of a price range, in display orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Lower,
    Upper,
}

impl Bound {
    pub fn opposite(&self) -> Bound {
        match self {
            Bound::Lower => Bound::Upper,
            Bound::Upper => Bound::Lower,
        }
    }
}

/// `[lower, upper]` in price space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRangeExtent {
    pub lower: f64,
    pub upper: f64,
}

impl PriceRangeExtent {
    /// Returns `None` unless both bounds are finite and `lower < upper`
    pub fn new(lower: f64, upper: f64) -> Option<Self> {
        let extent = Self { lower, upper };
        extent.is_valid().then_some(extent)
    }

    pub fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper
    }

    pub fn get(&self, bound: Bound) -> f64 {
        match bound {
            Bound::Lower => self.lower,
            Bound::Upper => self.upper,
        }
    }

    /// Copy of this extent with one bound replaced; ordering is not checked
    pub fn with_bound(&self, bound: Bound, value: f64) -> Self {
        match bound {
            Bound::Lower => Self { lower: value, ..*self },
            Bound::Upper => Self { upper: value, ..*self },
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}
