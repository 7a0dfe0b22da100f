//! # Tick Types
//!
//! Raw initialized-tick records as reported by a pool, and the processed
//! points of a liquidity-density curve derived from them.

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::{bigint_string, biguint_string};

/// One initialized tick of a pool. Array order is irrelevant until normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTick {
    /// Tick index
    pub index: i32,

    /// Total liquidity referencing this tick (unused by curve math)
    #[serde(with = "biguint_string", default)]
    pub liquidity_gross: BigUint,

    /// Signed delta applied to active liquidity when price crosses upward
    #[serde(with = "bigint_string")]
    pub liquidity_net: BigInt,
}

impl RawTick {
    pub fn new(index: i32, liquidity_net: impl Into<BigInt>) -> Self {
        let liquidity_net = liquidity_net.into();
        Self {
            index,
            liquidity_gross: liquidity_net.magnitude().clone(),
            liquidity_net,
        }
    }
}

/// One point of the liquidity-density curve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTick {
    pub tick: i32,

    /// Display price, already formatted to a stable digit count
    pub price: String,

    /// In-range liquidity once price sits at this tick; never negative
    #[serde(with = "bigint_string")]
    pub liquidity_active: BigInt,

    #[serde(with = "bigint_string")]
    pub liquidity_net: BigInt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_tick_accepts_strings_and_numbers() {
        let json = r#"[
            {"index": -100, "liquidityGross": "1000", "liquidityNet": "1000"},
            {"index": 0, "liquidityGross": 1000, "liquidityNet": -1000}
        ]"#;
        let ticks: Vec<RawTick> = serde_json::from_str(json).unwrap();

        assert_eq!(ticks[0], RawTick::new(-100, 1000));
        assert_eq!(ticks[1], RawTick::new(0, -1000));
    }

    #[test]
    fn test_liquidity_beyond_u64_survives_json() {
        let big = "340282366920938463463374607431768211455";
        let json = format!(r#"{{"index": 60, "liquidityNet": "-{}"}}"#, big);
        let tick: RawTick = serde_json::from_str(&json).unwrap();

        assert_eq!(tick.liquidity_net.to_string(), format!("-{}", big));
        assert_eq!(tick.liquidity_gross, BigUint::default());

        let back = serde_json::to_string(&tick).unwrap();
        assert!(back.contains(&format!("\"-{}\"", big)));
    }
}
