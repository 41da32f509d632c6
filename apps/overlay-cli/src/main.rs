//! overlay - classify features and replay pointer events against an overlay
//!
//! ```text
//! overlay classify -f regions.geojson -a regions.json -c overlay.toml
//! overlay simulate -f regions.geojson -c overlay.toml -e "click:R1 over:R3 map"
//! ```

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ClassifyArgs, SimulateArgs};

#[derive(Debug, Parser)]
#[command(name = "overlay", version, about = "Attribute-driven map overlay tools")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the color assignment and legend for a feature collection
    Classify(ClassifyArgs),
    /// Build an overlay in memory and replay an event script
    Simulate(SimulateArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Classify(args) => args.execute()?,
        Command::Simulate(args) => args.execute()?,
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
