//! CLI subcommands

mod check;
mod init;

pub use check::CheckArgs;
pub use init::InitArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze files and report unreachable functions
    Check(CheckArgs),
    /// Create a default shaker.toml in the current directory
    Init(InitArgs),
}
