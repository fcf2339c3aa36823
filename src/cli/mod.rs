//! Command line interface for tag_release.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig, VerbosityLevel};
pub use commands::execute_command;
pub use output::{OutputManager, format_size};

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
