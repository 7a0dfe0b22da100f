//! # Curve Property Tests
//!
//! Liquidity curves built from self-consistent position sets: every tick's
//! net deltas sum to zero and the pool-reported liquidity matches the
//! positions spanning the current tick.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use num_bigint::{BigInt, BigUint};
    use num_traits::{Signed, Zero};
    use proptest::prelude::*;

    use tickrange_chart::{build_curve, CurveCache};
    use tickrange_math::DigitPolicy;
    use tickrange_types::{FeeTier, PoolSnapshot, RawTick};

    const SPACING: i32 = 10;

    /// `(lower, upper, liquidity)` with ticks on the spacing grid
    fn positions() -> impl Strategy<Value = Vec<(i32, i32, u64)>> {
        prop::collection::vec(
            (-50i32..50, 1i32..20, 1u64..1_000_000).prop_map(|(lower, width, liquidity)| {
                (lower * SPACING, (lower + width) * SPACING, liquidity)
            }),
            1..12,
        )
    }

    fn fixture(positions: &[(i32, i32, u64)], tick_current: i32) -> PoolSnapshot {
        let mut net: BTreeMap<i32, BigInt> = BTreeMap::new();
        let mut active = BigUint::zero();

        for &(lower, upper, liquidity) in positions {
            *net.entry(lower).or_default() += BigInt::from(liquidity);
            *net.entry(upper).or_default() -= BigInt::from(liquidity);
            if lower <= tick_current && tick_current < upper {
                active += BigUint::from(liquidity);
            }
        }

        PoolSnapshot {
            pool_id: "fixture".to_string(),
            generation: 0,
            tick_current,
            tick_spacing: SPACING,
            fee_tier: FeeTier::Low,
            decimals0: 18,
            decimals1: 18,
            liquidity: active,
            ticks: net.into_iter().map(|(index, net)| RawTick::new(index, net)).collect(),
        }
    }

    proptest! {
        #[test]
        fn prop_fixture_conserves_liquidity(
            positions in positions(),
            tick_current in -600i32..600,
        ) {
            let snapshot = fixture(&positions, tick_current);
            let total: BigInt = snapshot.ticks.iter().map(|t| &t.liquidity_net).sum();
            prop_assert_eq!(total, BigInt::zero());
        }

        #[test]
        fn prop_active_liquidity_never_negative(
            positions in positions(),
            tick_current in -600i32..600,
            revert in any::<bool>(),
        ) {
            let snapshot = fixture(&positions, tick_current);
            let curve = build_curve(&snapshot, revert, DigitPolicy::Fixed(8)).unwrap().unwrap();
            prop_assert!(curve.ticks.iter().all(|t| !t.liquidity_active.is_negative()));
        }

        #[test]
        fn prop_consistent_snapshot_curve_shape(
            positions in positions(),
            tick_current in -600i32..600,
        ) {
            let snapshot = fixture(&positions, tick_current);
            let active_tick = tick_current.div_euclid(SPACING) * SPACING;
            let has_pivot = snapshot.ticks.iter().any(|t| t.index <= active_tick);
            let pivot_on_active = snapshot.ticks.iter().any(|t| t.index == active_tick);

            let curve = build_curve(&snapshot, false, DigitPolicy::Fixed(8)).unwrap().unwrap();
            prop_assert!(curve.ticks.windows(2).all(|w| w[0].tick < w[1].tick));

            if pivot_on_active {
                prop_assert!(!curve.degraded);
            }
            // every position has closed past the highest tick
            let last = curve.ticks.last().unwrap();
            if last.tick > active_tick {
                prop_assert_eq!(&last.liquidity_active, &BigInt::zero());
            }
            if !has_pivot {
                prop_assert!(curve.degraded);
                prop_assert_eq!(curve.ticks.len(), snapshot.ticks.len() + 1);
            }
        }

        #[test]
        fn prop_cached_curve_matches_fresh_build(
            positions in positions(),
            tick_current in -600i32..600,
        ) {
            let snapshot = fixture(&positions, tick_current);
            let mut cache = CurveCache::new(DigitPolicy::Significant(12));

            let cached = cache.get_or_build(&snapshot, true).unwrap().unwrap();
            let again = cache.get_or_build(&snapshot, true).unwrap().unwrap();
            let fresh = build_curve(&snapshot, true, DigitPolicy::Significant(12)).unwrap().unwrap();

            prop_assert_eq!(&*cached, &fresh);
            prop_assert_eq!(&*again, &fresh);
        }
    }

    #[test]
    fn test_single_position_curve() {
        let snapshot = fixture(&[(-100, 0, 1000)], -50);
        assert_eq!(snapshot.liquidity, BigUint::from(1000u32));

        let curve = build_curve(&snapshot, false, DigitPolicy::Fixed(8)).unwrap().unwrap();
        let active = curve.active();
        assert_eq!(active.tick, -50);
        assert_eq!(active.liquidity_active, BigInt::from(1000));

        let at_zero = curve.ticks.iter().find(|t| t.tick == 0).unwrap();
        assert_eq!(at_zero.liquidity_active, BigInt::zero());
    }
}
