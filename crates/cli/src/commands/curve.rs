// Liquidity curve printing

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::warn;

use tickrange_chart::{build_curve, Curve};
use tickrange_types::{PoolSnapshot, ProcessedTick};

use super::PoolArgs;

#[derive(Args, Debug)]
pub struct CurveCmd {
    #[command(flatten)]
    pool: PoolArgs,

    /// Only print this many ticks on each side of the active tick
    #[arg(long)]
    around: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurveReport<'a> {
    pool_id: &'a str,
    revert: bool,
    degraded: bool,
    active_tick: i32,
    ticks: &'a [ProcessedTick],
}

pub fn execute(cmd: CurveCmd) -> Result<()> {
    let (snapshot, config) = cmd.pool.load()?;
    config.validate().context("Invalid chart configuration")?;

    let curve = build_curve(&snapshot, cmd.pool.revert, config.price_digits)
        .with_context(|| format!("Failed to build curve for {}", snapshot.pool_id))?;

    let curve = match curve {
        Some(curve) => curve,
        None => {
            warn!(pool = %snapshot.pool_id, "snapshot has no liquidity data");
            println!("[WARN] {} has no liquidity data", snapshot.pool_id);
            return Ok(());
        }
    };

    let ticks = window(&curve, cmd.around);
    if cmd.pool.json {
        let report = CurveReport {
            pool_id: &snapshot.pool_id,
            revert: cmd.pool.revert,
            degraded: curve.degraded,
            active_tick: curve.active().tick,
            ticks,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&snapshot, &curve, ticks);
    }
    Ok(())
}

/// Slice of the curve centred on the active tick
fn window(curve: &Curve, around: Option<usize>) -> &[ProcessedTick] {
    match around {
        Some(n) => {
            let start = curve.active_index.saturating_sub(n);
            let end = (curve.active_index + n + 1).min(curve.len());
            &curve.ticks[start..end]
        }
        None => &curve.ticks,
    }
}

fn print_table(snapshot: &PoolSnapshot, curve: &Curve, ticks: &[ProcessedTick]) {
    println!(
        "{} ({} fee, spacing {}) current tick {}",
        snapshot.pool_id, snapshot.fee_tier, snapshot.tick_spacing, snapshot.tick_current
    );
    if curve.degraded {
        println!("[WARN] curve built from inconsistent tick data");
    }

    println!("  {:>8}  {:>28}  {:>32}", "tick", "price", "active liquidity");
    let active = curve.active().tick;
    for tick in ticks {
        let marker = if tick.tick == active { '*' } else { ' ' };
        println!(
            "{} {:>8}  {:>28}  {:>32}",
            marker, tick.tick, tick.price, tick.liquidity_active
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use tickrange_math::DigitPolicy;
    use tickrange_types::{FeeTier, RawTick};

    fn curve() -> Curve {
        let snapshot = PoolSnapshot {
            pool_id: "window".to_string(),
            generation: 0,
            tick_current: 0,
            tick_spacing: 10,
            fee_tier: FeeTier::Low,
            decimals0: 6,
            decimals1: 6,
            liquidity: BigUint::from(10u32),
            ticks: vec![
                RawTick::new(-30, 4),
                RawTick::new(-20, 3),
                RawTick::new(-10, 3),
                RawTick::new(10, -3),
                RawTick::new(20, -3),
                RawTick::new(30, -4),
            ],
        };
        build_curve(&snapshot, false, DigitPolicy::Fixed(8)).unwrap().unwrap()
    }

    #[test]
    fn test_window_is_centred_on_active_tick() {
        let curve = curve();
        let window = window(&curve, Some(1));
        assert_eq!(window.len(), 3);
        assert_eq!(window[1].tick, curve.active().tick);
    }

    #[test]
    fn test_window_is_clamped_to_curve() {
        let curve = curve();
        assert_eq!(window(&curve, Some(100)).len(), curve.len());
        assert_eq!(window(&curve, None).len(), curve.len());
    }
}
