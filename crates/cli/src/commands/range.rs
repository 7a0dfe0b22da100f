// Price range snapping

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use tickrange_chart::{
    ChartError, CommittedRange, LabelMode, LiquidityRangeChart, RangeSelectionController, StartingRange,
};
use tickrange_types::Bound;

use super::PoolArgs;

#[derive(Args, Debug)]
pub struct RangeCmd {
    #[command(flatten)]
    pool: PoolArgs,

    /// Lower display price, or 0 for the lowest usable price
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<String>,

    /// Upper display price, or inf for the highest usable price
    #[arg(long, allow_hyphen_values = true)]
    upper: Option<String>,

    /// Start from the raw pool ticks of an existing position
    #[arg(long, num_args = 2, value_names = ["LOWER", "UPPER"], allow_negative_numbers = true)]
    ticks: Option<Vec<i32>>,

    /// Select the whole usable tick range
    #[arg(long, conflicts_with_all = ["lower", "upper", "ticks"])]
    full_range: bool,

    /// Label bounds with absolute prices instead of percentages
    #[arg(long)]
    amount: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeReport<'a> {
    pool_id: &'a str,
    revert: bool,
    current_price: f64,
    range: CommittedRange,
    full_range: bool,
    lower_label: String,
    upper_label: String,
}

pub fn execute(cmd: RangeCmd) -> Result<()> {
    let (snapshot, mut config) = cmd.pool.load()?;
    if cmd.amount {
        config.labels.mode = LabelMode::Amount;
    }

    let starting = match cmd.ticks.as_deref() {
        Some(&[a, b]) if a != b => StartingRange::Ticks(a, b),
        Some(ticks) => bail!("--ticks needs two distinct ticks, got {:?}", ticks),
        None => StartingRange::Default,
    };

    let pool_id = snapshot.pool_id.clone();
    let mut chart = LiquidityRangeChart::new(snapshot, config, cmd.pool.revert, starting)
        .with_context(|| format!("Failed to open range chart for {}", pool_id))?;
    chart.on_range_committed(|range, mode| {
        debug!(?mode, lower_tick = range.lower_tick, upper_tick = range.upper_tick, "range committed");
    });

    if cmd.full_range {
        chart.controller_mut().set_full_range()?;
    } else {
        apply_typed_bounds(chart.controller_mut(), cmd.lower.as_deref(), cmd.upper.as_deref())?;
    }

    let range = *chart.controller().committed();
    let (lower_label, upper_label) = chart.labels();

    if cmd.pool.json {
        let report = RangeReport {
            pool_id: &pool_id,
            revert: chart.revert(),
            current_price: chart.current_price(),
            range,
            full_range: range.is_full_range(),
            lower_label,
            upper_label,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} current price {}", pool_id, chart.current_price());
        println!("  ticks  [{}, {}]", range.lower_tick, range.upper_tick);
        println!("  prices [{}, {}]", range.extent.lower, range.extent.upper);
        println!("  labels [{}, {}]", lower_label, upper_label);
        if range.is_full_range() {
            println!("  full range");
        }
    }
    Ok(())
}

/// Commit typed bounds. When the new lower bound would cross the current
/// upper one, the upper bound goes first.
fn apply_typed_bounds(
    controller: &mut RangeSelectionController,
    lower: Option<&str>,
    upper: Option<&str>,
) -> Result<()> {
    let lower = lower.map(|text| bound_text(Bound::Lower, text));
    let upper = upper.map(|text| bound_text(Bound::Upper, text));

    match (lower, upper) {
        (Some(lower), Some(upper)) => match controller.set_typed_bound(Bound::Lower, lower) {
            Err(ChartError::InvalidRange { .. }) => {
                controller.set_typed_bound(Bound::Upper, upper)?;
                controller.set_typed_bound(Bound::Lower, lower)?;
            }
            result => {
                result?;
                controller.set_typed_bound(Bound::Upper, upper)?;
            }
        },
        (Some(lower), None) => {
            controller.set_typed_bound(Bound::Lower, lower)?;
        }
        (None, Some(upper)) => {
            controller.set_typed_bound(Bound::Upper, upper)?;
        }
        (None, None) => {}
    }
    Ok(())
}

/// Shell-friendly spellings of the upper sentinel
fn bound_text(bound: Bound, text: &str) -> &str {
    match (bound, text.trim().to_ascii_lowercase().as_str()) {
        (Bound::Upper, "inf" | "infinity" | "max") => "∞",
        (Bound::Lower, "min") => "0",
        _ => text,
    }
}
