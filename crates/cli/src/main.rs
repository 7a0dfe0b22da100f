// Command-line front end for tick-liquidity charts
//
// Loads a pool snapshot exported as JSON, builds its liquidity curve and
// snaps price ranges the same way the interactive chart does.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tickrange")]
#[command(about = "Inspect pool liquidity curves and snapped price ranges", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the liquidity-density curve of a pool snapshot
    Curve(commands::curve::CurveCmd),

    /// Snap a price range to usable ticks and print its labels
    Range(commands::range::RangeCmd),

    /// Write an example chart configuration file
    InitConfig {
        /// Destination of the TOML file
        #[arg(default_value = "tickrange.toml")]
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Curve(cmd) => commands::curve::execute(cmd),
        Commands::Range(cmd) => commands::range::execute(cmd),
        Commands::InitConfig { path } => commands::init_config(&path),
    }
}
