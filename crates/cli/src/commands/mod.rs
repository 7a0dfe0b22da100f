// Subcommands and the loading helpers they share

pub mod curve;
pub mod range;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use tickrange_chart::{create_example_config, ChartConfig};
use tickrange_types::PoolSnapshot;

/// Inputs every chart-building subcommand takes
#[derive(Args, Debug, Clone)]
pub struct PoolArgs {
    /// Pool snapshot JSON file
    pub snapshot: PathBuf,

    /// Chart configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Quote prices as token0 per token1
    #[arg(long)]
    pub revert: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl PoolArgs {
    pub fn load(&self) -> Result<(PoolSnapshot, ChartConfig)> {
        Ok((load_snapshot(&self.snapshot)?, load_config(self.config.as_ref())?))
    }
}

pub fn load_snapshot(path: &PathBuf) -> Result<PoolSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: PoolSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Invalid pool snapshot in {}", path.display()))?;

    debug!(
        pool = %snapshot.pool_id,
        generation = snapshot.generation,
        ticks = snapshot.ticks.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

pub fn load_config(path: Option<&PathBuf>) -> Result<ChartConfig> {
    match path {
        Some(path) => ChartConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(ChartConfig::default()),
    }
}

pub fn init_config(path: &str) -> Result<()> {
    create_example_config(path).with_context(|| format!("Failed to write {}", path))?;
    info!(path, "example configuration written");
    println!("[OK] Wrote example configuration to {}", path);
    Ok(())
}
