//! # Liquidity Curve Builder
//!
//! Walks outward from the pivot tick in both directions, accumulating signed
//! liquidity deltas into an ascending liquidity-density curve.
//!
//! The two directions are not symmetric. Walking up, the delta recorded at
//! the tick being entered applies immediately. Walking down, the delta
//! removed is the one recorded at the tick just left: crossing a tick
//! downward undoes exactly what crossing it upward added, and that delta
//! belongs to the tick on the upper side of the crossing.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use tracing::{debug, warn};

use tickrange_math::{DigitPolicy, MathResult, PriceTickConverter};
use tickrange_types::{PoolSnapshot, ProcessedTick, RawTick};

use crate::normalizer::normalize_ticks;

/// Direction of a walk away from the pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Ascending,
    Descending,
}

/// Active liquidity after stepping onto the next tick.
///
/// `previous` is the tick just left, `entered_net` the net liquidity recorded
/// at the tick being entered.
pub fn step_liquidity(previous: &ProcessedTick, entered_net: &BigInt, traversal: Traversal) -> BigInt {
    match traversal {
        Traversal::Ascending => &previous.liquidity_active + entered_net,
        Traversal::Descending if previous.liquidity_net.is_zero() => previous.liquidity_active.clone(),
        Traversal::Descending => &previous.liquidity_active - &previous.liquidity_net,
    }
}

/// Processed ticks on one side of the pivot, ascending by tick
#[derive(Debug, Clone, PartialEq)]
pub struct SurroundingTicks {
    pub ticks: Vec<ProcessedTick>,
    /// Some accumulated liquidity went negative and was clamped to zero
    pub degraded: bool,
}

/// Every processed tick strictly beyond `pivot` in `traversal` direction,
/// in a single pass.
///
/// A `None` pivot places the active tick below every record: the ascending
/// walk enters all of them and the descending walk enters none.
pub fn compute_surrounding_ticks(
    active: &ProcessedTick,
    sorted: &[RawTick],
    pivot: Option<usize>,
    traversal: Traversal,
    converter: &PriceTickConverter,
    digits: DigitPolicy,
) -> MathResult<SurroundingTicks> {
    let entered: Box<dyn Iterator<Item = &RawTick>> = match (traversal, pivot) {
        (Traversal::Ascending, Some(pivot)) => Box::new(sorted.iter().skip(pivot + 1)),
        (Traversal::Ascending, None) => Box::new(sorted.iter()),
        (Traversal::Descending, Some(pivot)) => Box::new(sorted[..pivot.min(sorted.len())].iter().rev()),
        (Traversal::Descending, None) => Box::new(std::iter::empty()),
    };

    let mut processed: Vec<ProcessedTick> = Vec::new();
    let mut degraded = false;

    for raw in entered {
        let previous = processed.last().unwrap_or(active);
        let mut liquidity_active = step_liquidity(previous, &raw.liquidity_net, traversal);

        if liquidity_active.is_negative() {
            warn!(
                tick = raw.index,
                liquidity = %liquidity_active,
                "negative active liquidity, clamping to zero"
            );
            liquidity_active = BigInt::zero();
            degraded = true;
        }

        let price = converter.tick_to_price(raw.index)?;
        processed.push(ProcessedTick {
            tick: raw.index,
            price: digits.format(&price),
            liquidity_active,
            liquidity_net: raw.liquidity_net.clone(),
        });
    }

    if traversal == Traversal::Descending {
        processed.reverse();
    }

    Ok(SurroundingTicks {
        ticks: processed,
        degraded,
    })
}

/// Liquidity-density curve, ascending by tick
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub ticks: Vec<ProcessedTick>,

    /// Position of the active tick in `ticks`
    pub active_index: usize,

    /// Built from inconsistent data: clamped liquidity, dropped records,
    /// or a pivot that had to be clamped
    pub degraded: bool,
}

impl Curve {
    pub fn active(&self) -> &ProcessedTick {
        &self.ticks[self.active_index]
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// `(price, liquidity)` pairs for plotting. Orientation follows the
    /// converter the curve was built with, so prices descend when reverted.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ticks.iter().filter_map(|t| {
            let price = t.price.parse::<f64>().ok()?;
            let liquidity = t.liquidity_active.to_f64()?;
            Some((price, liquidity))
        })
    }

    pub fn max_liquidity(&self) -> Option<&BigInt> {
        self.ticks.iter().map(|t| &t.liquidity_active).max()
    }
}

/// Build the full curve for a snapshot.
///
/// `Ok(None)` means the snapshot carries no usable liquidity data.
pub fn build_curve(snapshot: &PoolSnapshot, revert: bool, digits: DigitPolicy) -> MathResult<Option<Curve>> {
    let normalized = match normalize_ticks(&snapshot.ticks, snapshot.tick_current, snapshot.tick_spacing) {
        Some(normalized) => normalized,
        None => return Ok(None),
    };

    let converter = PriceTickConverter::new(snapshot.decimals0, snapshot.decimals1, revert);
    let active = normalized.active_processed(&snapshot.liquidity, &converter, digits)?;

    let below = compute_surrounding_ticks(
        &active,
        &normalized.ticks,
        normalized.pivot_record(),
        Traversal::Descending,
        &converter,
        digits,
    )?;
    let above = compute_surrounding_ticks(
        &active,
        &normalized.ticks,
        normalized.pivot_record(),
        Traversal::Ascending,
        &converter,
        digits,
    )?;

    let degraded = below.degraded || above.degraded || normalized.pivot_clamped || normalized.dropped > 0;
    let active_index = below.ticks.len();

    let mut ticks = below.ticks;
    ticks.reserve(above.ticks.len() + 1);
    ticks.push(active);
    ticks.extend(above.ticks);

    debug!(
        pool = %snapshot.pool_id,
        points = ticks.len(),
        degraded,
        "built liquidity curve"
    );

    Ok(Some(Curve {
        ticks,
        active_index,
        degraded,
    }))
}

// ============================================================================
// Memoization
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CurveKey {
    pool_id: String,
    revert: bool,
}

#[derive(Debug, Clone)]
struct CachedCurve {
    fingerprint: u64,
    curve: Option<Arc<Curve>>,
}

/// Curves memoized per `(pool, orientation)`. Output is identical to an
/// uncached build for the same snapshot; a changed snapshot replaces the entry.
#[derive(Debug, Clone)]
pub struct CurveCache {
    digits: DigitPolicy,
    entries: HashMap<CurveKey, CachedCurve>,
}

impl CurveCache {
    pub fn new(digits: DigitPolicy) -> Self {
        Self {
            digits,
            entries: HashMap::new(),
        }
    }

    pub fn digits(&self) -> DigitPolicy {
        self.digits
    }

    pub fn get_or_build(&mut self, snapshot: &PoolSnapshot, revert: bool) -> MathResult<Option<Arc<Curve>>> {
        let key = CurveKey {
            pool_id: snapshot.pool_id.clone(),
            revert,
        };
        let fingerprint = fingerprint(snapshot);

        if let Some(cached) = self.entries.get(&key) {
            if cached.fingerprint == fingerprint {
                debug!(pool = %snapshot.pool_id, revert, "curve cache hit");
                return Ok(cached.curve.clone());
            }
        }

        let curve = build_curve(snapshot, revert, self.digits)?.map(Arc::new);
        self.entries.insert(
            key,
            CachedCurve {
                fingerprint,
                curve: curve.clone(),
            },
        );
        Ok(curve)
    }

    /// Forget both orientations of a pool
    pub fn invalidate(&mut self, pool_id: &str) {
        self.entries.retain(|key, _| key.pool_id != pool_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fingerprint(snapshot: &PoolSnapshot) -> u64 {
    let mut hasher = DefaultHasher::new();
    snapshot.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use tickrange_types::FeeTier;

    fn snapshot(tick_current: i32, liquidity: u64, records: &[(i32, i64)]) -> PoolSnapshot {
        PoolSnapshot {
            pool_id: "test-pool".to_string(),
            generation: 1,
            tick_current,
            tick_spacing: 1,
            fee_tier: FeeTier::Lowest,
            decimals0: 18,
            decimals1: 18,
            liquidity: BigUint::from(liquidity),
            ticks: records.iter().map(|&(i, n)| RawTick::new(i, n)).collect(),
        }
    }

    fn liquidity_by_tick(curve: &Curve) -> Vec<(i32, i64)> {
        curve
            .ticks
            .iter()
            .map(|t| (t.tick, t.liquidity_active.to_i64().unwrap()))
            .collect()
    }

    #[test]
    fn test_single_position_scenario() {
        let pool = snapshot(-50, 1000, &[(-100, 1000), (0, -1000)]);
        let curve = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap().unwrap();

        assert_eq!(curve.active().tick, -50);
        assert_eq!(curve.active().liquidity_active, BigInt::from(1000));
        assert_eq!(liquidity_by_tick(&curve), vec![(-50, 1000), (0, 0)]);
        assert!(!curve.degraded);
    }

    #[test]
    fn test_descending_walk_lags_one_tick() {
        // positions [-200, 100) with 300 and [-100, 100) with 500; price at 0
        let pool = snapshot(
            0,
            800,
            &[(-200, 300), (-100, 500), (0, 0), (100, -800)],
        );
        let curve = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap().unwrap();

        // Entering -100 from above removes the net of the tick just left (0, zero),
        // entering -200 removes the net of -100.
        assert_eq!(
            liquidity_by_tick(&curve),
            vec![(-200, 300), (-100, 800), (0, 800), (100, 0)]
        );
    }

    #[test]
    fn test_step_liquidity_directions() {
        let previous = ProcessedTick {
            tick: 0,
            price: "1".to_string(),
            liquidity_active: BigInt::from(100),
            liquidity_net: BigInt::from(40),
        };
        let entered = BigInt::from(-25);

        assert_eq!(step_liquidity(&previous, &entered, Traversal::Ascending), BigInt::from(75));
        // descending ignores the entered tick's own net
        assert_eq!(step_liquidity(&previous, &entered, Traversal::Descending), BigInt::from(60));

        let flat = ProcessedTick {
            liquidity_net: BigInt::zero(),
            ..previous
        };
        assert_eq!(step_liquidity(&flat, &entered, Traversal::Descending), BigInt::from(100));
    }

    #[test]
    fn test_negative_liquidity_clamps_and_marks_degraded() {
        // pool reports less liquidity than the ticks imply
        let pool = snapshot(0, 10, &[(0, 0), (50, -500), (100, 490)]);
        let curve = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap().unwrap();

        assert!(curve.degraded);
        assert_eq!(liquidity_by_tick(&curve), vec![(0, 10), (50, 0), (100, 490)]);
        assert!(curve.ticks.iter().all(|t| !t.liquidity_active.is_negative()));
    }

    #[test]
    fn test_active_below_every_record_walks_all_of_them() {
        let pool = snapshot(-500, 0, &[(100, 1000), (200, -1000)]);
        let curve = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap().unwrap();

        assert_eq!(curve.active_index, 0);
        assert_eq!(liquidity_by_tick(&curve), vec![(-500, 0), (100, 1000), (200, 0)]);
        assert!(curve.degraded);
    }

    #[test]
    fn test_empty_snapshot_builds_nothing() {
        let pool = snapshot(0, 0, &[]);
        assert!(build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap().is_none());
    }

    #[test]
    fn test_curve_is_ascending_and_contiguous() {
        let pool = snapshot(
            15,
            70,
            &[(40, -20), (-30, 50), (10, 20), (-10, 0), (30, -50)],
        );
        let curve = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap().unwrap();

        let ticks: Vec<i32> = curve.ticks.iter().map(|t| t.tick).collect();
        assert_eq!(ticks, vec![-30, -10, 15, 30, 40]);
        assert_eq!(curve.active_index, 2);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_reverted_curve_prices_invert() {
        let pool = snapshot(-50, 1000, &[(-100, 1000), (0, -1000)]);
        let forward = build_curve(&pool, false, DigitPolicy::Significant(10)).unwrap().unwrap();
        let reverse = build_curve(&pool, true, DigitPolicy::Significant(10)).unwrap().unwrap();

        assert_eq!(forward.ticks.len(), reverse.ticks.len());
        assert_eq!(reverse.ticks[1].price, "1");
        let (p_forward, _) = forward.points().next().unwrap();
        let (p_reverse, _) = reverse.points().next().unwrap();
        approx::assert_relative_eq!(p_forward * p_reverse, 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let pool = snapshot(7, 123, &[(-5, 100), (3, 23), (9, -123)]);
        let first = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap();
        let second = build_curve(&pool, false, DigitPolicy::Fixed(8)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_hits_and_replaces() {
        let mut cache = CurveCache::new(DigitPolicy::Fixed(8));
        let pool = snapshot(-50, 1000, &[(-100, 1000), (0, -1000)]);

        let first = cache.get_or_build(&pool, false).unwrap().unwrap();
        let second = cache.get_or_build(&pool, false).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.get_or_build(&pool, true).unwrap();
        assert_eq!(cache.len(), 2);

        let mut refreshed = pool.clone();
        refreshed.generation = 2;
        refreshed.tick_current = -20;
        let third = cache.get_or_build(&refreshed, false).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*third, build_curve(&refreshed, false, DigitPolicy::Fixed(8)).unwrap().unwrap());

        cache.invalidate("test-pool");
        assert!(cache.is_empty());
    }
}
