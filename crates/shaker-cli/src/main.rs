//! Shaker CLI - Command-line interface for the Shaker dead-code analyzer
//!
//! Finds JavaScript/TypeScript functions that can never be reached from the
//! program's entry points.

mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "shaker",
    author,
    version,
    about = "Dead-code analyzer for JavaScript and TypeScript",
    long_about = "Shaker builds a value-flow graph over your JavaScript or TypeScript\n\
                  sources and reports the functions that can never be reached from\n\
                  the configured entry points."
)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}
