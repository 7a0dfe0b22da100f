//! # Bound Labels
//!
//! Text shown next to each brush handle, either as a signed distance from the
//! current price or as an absolute price. Bounds sitting on a usable tick
//! limit render as a sentinel instead of a number.

use serde::{Deserialize, Serialize};
use tickrange_math::{to_fixed_f64, to_significant_f64};

use crate::config::LabelConfig;

/// How a numeric bound is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// Signed percent distance from the current price
    Percent,
    /// Absolute price
    Amount,
}

/// Categorical label for a bound on a usable tick limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Display-lowest usable price
    Zero,
    /// Display-highest usable price
    Infinity,
}

impl Sentinel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::Zero => "0",
            Sentinel::Infinity => "∞",
        }
    }
}

const COMPACT_SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

#[derive(Debug, Clone, PartialEq)]
pub struct LabelFormatter {
    pub mode: LabelMode,
    /// Significant digits of an amount label
    pub significant_digits: u32,
    /// Decimal places of a percent label at or under the threshold
    pub percent_decimals: u32,
    /// Percent magnitude above which labels switch to compact form
    pub percent_compact_threshold: f64,
    /// Significant digits of a compact percent label
    pub percent_compact_digits: u32,
}

impl Default for LabelFormatter {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

impl LabelFormatter {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            mode: config.mode,
            significant_digits: config.significant_digits,
            percent_decimals: config.percent_decimals,
            percent_compact_threshold: config.percent_compact_threshold,
            percent_compact_digits: config.percent_compact_digits,
        }
    }

    pub fn with_mode(self, mode: LabelMode) -> Self {
        Self { mode, ..self }
    }

    /// Label for one bound. A sentinel always wins over the numeric value.
    pub fn format(&self, price: f64, current_price: f64, sentinel: Option<Sentinel>) -> String {
        if let Some(sentinel) = sentinel {
            return sentinel.as_str().to_string();
        }

        match self.mode {
            LabelMode::Percent if current_price.is_finite() && current_price > 0.0 => {
                self.format_percent(price, current_price)
            }
            // no reference price to measure against
            LabelMode::Percent | LabelMode::Amount => self.format_amount(price),
        }
    }

    pub fn format_amount(&self, price: f64) -> String {
        to_significant_f64(price, self.significant_digits)
    }

    pub fn format_percent(&self, price: f64, current_price: f64) -> String {
        let percent = (price - current_price) / current_price * 100.0;
        let magnitude = percent.abs();

        let body = if magnitude <= self.percent_compact_threshold {
            to_fixed_f64(magnitude, self.percent_decimals)
        } else {
            self.compact(magnitude)
        };

        let is_zero = body.parse::<f64>().map(|v| v == 0.0).unwrap_or(false);
        let sign = if is_zero {
            ""
        } else if percent < 0.0 {
            "-"
        } else {
            "+"
        };

        format!("{}{}%", sign, body)
    }

    fn compact(&self, magnitude: f64) -> String {
        for (divisor, suffix) in COMPACT_SUFFIXES {
            if magnitude >= divisor {
                return format!(
                    "{}{}",
                    to_significant_f64(magnitude / divisor, self.percent_compact_digits),
                    suffix
                );
            }
        }
        to_significant_f64(magnitude, self.percent_compact_digits)
    }
}
