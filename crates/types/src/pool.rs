//! # Pool Types
//!
//! Immutable pool snapshots as handed over by an external data provider.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::biguint_string;
use crate::tick::RawTick;

/// Fee tier of a pool, in hundredths of a basis point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FeeTier {
    /// 0.01%
    Lowest,
    /// 0.05%
    Low,
    /// 0.3%
    Medium,
    /// 1%
    High,
}

impl FeeTier {
    pub const ALL: [FeeTier; 4] = [FeeTier::Lowest, FeeTier::Low, FeeTier::Medium, FeeTier::High];

    /// Fee amount in hundredths of a basis point
    pub fn amount(&self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10_000,
        }
    }

    /// Tick spacing a pool of this tier is deployed with by default
    pub fn default_tick_spacing(&self) -> i32 {
        match self {
            FeeTier::Lowest => 1,
            FeeTier::Low => 10,
            FeeTier::Medium => 60,
            FeeTier::High => 200,
        }
    }

    /// Stable and correlated pairs live in the two lowest tiers
    pub fn is_stable(&self) -> bool {
        matches!(self, FeeTier::Lowest | FeeTier::Low)
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = String;

    fn try_from(amount: u32) -> Result<Self, Self::Error> {
        FeeTier::ALL
            .into_iter()
            .find(|tier| tier.amount() == amount)
            .ok_or_else(|| format!("unknown fee tier {}", amount))
    }
}

impl From<FeeTier> for u32 {
    fn from(tier: FeeTier) -> Self {
        tier.amount()
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.amount();
        write!(f, "{}.{:02}%", amount / 10_000, (amount % 10_000) / 100)
    }
}

/// Snapshot of a pool's tick state. A new fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    /// Identifier used to key memoized curves
    pub pool_id: String,

    /// Monotonic refresh counter (block number or fetch sequence)
    #[serde(default)]
    pub generation: u64,

    pub tick_current: i32,
    pub tick_spacing: i32,
    pub fee_tier: FeeTier,
    pub decimals0: u8,
    pub decimals1: u8,

    /// Pool-reported in-range liquidity at `tick_current`
    #[serde(with = "biguint_string")]
    pub liquidity: BigUint,

    pub ticks: Vec<RawTick>,
}

impl PoolSnapshot {
    pub fn has_liquidity_data(&self) -> bool {
        !self.ticks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_tier_round_trip() {
        for tier in FeeTier::ALL {
            assert_eq!(FeeTier::try_from(tier.amount()), Ok(tier));
        }
        assert!(FeeTier::try_from(2500).is_err());
        assert_eq!(FeeTier::Medium.to_string(), "0.30%");
        assert_eq!(FeeTier::Lowest.to_string(), "0.01%");
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "poolId": "eth-usdc",
            "tickCurrent": 10,
            "tickSpacing": 10,
            "feeTier": 500,
            "decimals0": 18,
            "decimals1": 6,
            "liquidity": "2088207984683946894",
            "ticks": [{"index": 0, "liquidityNet": "5"}, {"index": 20, "liquidityNet": "-5"}]
        }"#;
        let snapshot: PoolSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.fee_tier, FeeTier::Low);
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.ticks.len(), 2);
        assert!(snapshot.has_liquidity_data());
    }
}
