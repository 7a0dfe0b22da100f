//! # Tick Data Normalizer
//!
//! Sorts raw tick records, drops malformed ones, and locates the pivot the
//! curve builder walks outward from.

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use tracing::{debug, warn};

use tickrange_math::{
    is_tick_valid, max_usable_tick, min_usable_tick, DigitPolicy, MathResult, PriceTickConverter, MAX_TICK, MIN_TICK,
};
use tickrange_types::{ProcessedTick, RawTick};

/// Sorted tick records positioned relative to the current pool tick
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTicks {
    /// Ascending by index, unique, every index within the tick range
    pub ticks: Vec<RawTick>,

    /// Position of the last record at or below `active_tick`
    pub pivot: usize,

    /// No record sits at or below `active_tick`; `pivot` was clamped to 0
    pub pivot_clamped: bool,

    /// `tick_current` aligned down to the tick spacing
    pub active_tick: i32,

    /// Net liquidity recorded exactly at `active_tick`, zero when absent
    pub active_liquidity_net: BigInt,

    /// Records removed for an out-of-range or duplicate index
    pub dropped: usize,
}

impl NormalizedTicks {
    /// Record the walks start from, `None` when the active tick lies below
    /// every record
    pub fn pivot_record(&self) -> Option<usize> {
        (!self.pivot_clamped).then_some(self.pivot)
    }

    /// Curve point for the active tick, seeded with the pool-reported
    /// in-range liquidity rather than a recomputed sum
    pub fn active_processed(
        &self,
        pool_liquidity: &BigUint,
        converter: &PriceTickConverter,
        digits: DigitPolicy,
    ) -> MathResult<ProcessedTick> {
        let price = converter.tick_to_price(self.active_tick)?;
        Ok(ProcessedTick {
            tick: self.active_tick,
            price: digits.format(&price),
            liquidity_active: BigInt::from(pool_liquidity.clone()),
            liquidity_net: self.active_liquidity_net.clone(),
        })
    }
}

/// Align the current tick to spacing and clamp it into the usable range.
///
/// An invalid spacing leaves the tick unaligned within the full tick range.
pub fn active_tick(tick_current: i32, tick_spacing: i32) -> i32 {
    match (min_usable_tick(tick_spacing), max_usable_tick(tick_spacing)) {
        (Ok(min), Ok(max)) => (tick_current.div_euclid(tick_spacing) * tick_spacing).clamp(min, max),
        _ => tick_current.clamp(MIN_TICK, MAX_TICK),
    }
}

/// Sort and validate `ticks`, then locate the pivot for `tick_current`.
///
/// Returns `None` when no usable record remains, which callers surface as
/// "no liquidity data" rather than as an error.
pub fn normalize_ticks(ticks: &[RawTick], tick_current: i32, tick_spacing: i32) -> Option<NormalizedTicks> {
    if ticks.is_empty() {
        debug!("no tick records in snapshot");
        return None;
    }

    let mut sorted: Vec<RawTick> = ticks.iter().filter(|t| is_tick_valid(t.index)).cloned().collect();
    let out_of_range = ticks.len() - sorted.len();

    sorted.sort_by_key(|t| t.index);
    let before_dedup = sorted.len();
    sorted.dedup_by_key(|t| t.index);
    let duplicates = before_dedup - sorted.len();

    let dropped = out_of_range + duplicates;
    if dropped > 0 {
        warn!(out_of_range, duplicates, "dropped malformed tick records");
    }

    if sorted.is_empty() {
        return None;
    }

    let active = active_tick(tick_current, tick_spacing);
    let at_or_below = sorted.partition_point(|t| t.index <= active);
    let pivot_clamped = at_or_below == 0;
    let pivot = at_or_below.saturating_sub(1);

    let active_liquidity_net = match sorted.get(pivot) {
        Some(tick) if tick.index == active => tick.liquidity_net.clone(),
        _ => BigInt::zero(),
    };

    debug!(
        ticks = sorted.len(),
        pivot,
        active_tick = active,
        pivot_clamped,
        "normalized tick data"
    );

    Some(NormalizedTicks {
        ticks: sorted,
        pivot,
        pivot_clamped,
        active_tick: active,
        active_liquidity_net,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(records: &[(i32, i64)]) -> Vec<RawTick> {
        records.iter().map(|&(index, net)| RawTick::new(index, net)).collect()
    }

    #[test]
    fn test_empty_input_has_no_curve() {
        assert!(normalize_ticks(&[], 0, 10).is_none());
    }

    #[test]
    fn test_sorts_and_finds_pivot_below_current() {
        let raw = ticks(&[(0, -1000), (-100, 1000), (200, 5), (-300, -5)]);
        let normalized = normalize_ticks(&raw, -50, 10).unwrap();

        let indices: Vec<i32> = normalized.ticks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![-300, -100, 0, 200]);
        assert_eq!(normalized.active_tick, -50);
        assert_eq!(normalized.pivot, 1);
        assert!(!normalized.pivot_clamped);
        assert_eq!(normalized.active_liquidity_net, BigInt::zero());
    }

    #[test]
    fn test_pivot_exactly_at_active_tick_carries_its_net() {
        let raw = ticks(&[(-60, 10), (0, 7), (60, -17)]);
        let normalized = normalize_ticks(&raw, 59, 60).unwrap();

        assert_eq!(normalized.active_tick, 0);
        assert_eq!(normalized.pivot, 1);
        assert_eq!(normalized.active_liquidity_net, BigInt::from(7));
    }

    #[test]
    fn test_pivot_clamps_to_ends() {
        let raw = ticks(&[(100, 1), (200, -1)]);

        let below_all = normalize_ticks(&raw, -500, 10).unwrap();
        assert_eq!(below_all.pivot, 0);
        assert!(below_all.pivot_clamped);
        assert_eq!(below_all.pivot_record(), None);

        let above_all = normalize_ticks(&raw, 5000, 10).unwrap();
        assert_eq!(above_all.pivot, 1);
        assert!(!above_all.pivot_clamped);
        assert_eq!(above_all.pivot_record(), Some(1));
    }

    #[test]
    fn test_drops_malformed_and_duplicate_indices() {
        let raw = ticks(&[(MAX_TICK + 10, 3), (10, 1), (10, 2), (20, -1)]);
        let normalized = normalize_ticks(&raw, 15, 10).unwrap();

        assert_eq!(normalized.dropped, 2);
        assert_eq!(normalized.ticks.len(), 2);
        // stable sort keeps the first record for a duplicated index
        assert_eq!(normalized.ticks[0].liquidity_net, BigInt::from(1));

        let only_bad = ticks(&[(MIN_TICK - 1, 3)]);
        assert!(normalize_ticks(&only_bad, 0, 10).is_none());
    }

    #[test]
    fn test_active_tick_alignment() {
        assert_eq!(active_tick(-1, 60), -60);
        assert_eq!(active_tick(61, 60), 60);
        assert_eq!(active_tick(MAX_TICK, 200), 887_200);
        assert_eq!(active_tick(7, 0), 7);
    }

    #[test]
    fn test_active_tick_stays_usable_at_the_limits() {
        assert_eq!(active_tick(MIN_TICK, 60), -887_220);
        assert_eq!(active_tick(MAX_TICK, 60), 887_220);
        assert_eq!(active_tick(MIN_TICK, 200), -887_200);
        assert_eq!(active_tick(MIN_TICK, 1), MIN_TICK);
    }

    #[test]
    fn test_active_processed_uses_pool_liquidity() {
        let raw = ticks(&[(-100, 1000), (0, -1000)]);
        let normalized = normalize_ticks(&raw, -50, 1).unwrap();
        let converter = PriceTickConverter::new(18, 18, false);

        let active = normalized
            .active_processed(&BigUint::from(1000u32), &converter, DigitPolicy::Fixed(8))
            .unwrap();

        assert_eq!(active.tick, -50);
        assert_eq!(active.liquidity_active, BigInt::from(1000));
        assert_eq!(active.liquidity_net, BigInt::zero());
        assert_eq!(active.price, "0.99501273");
    }
}
