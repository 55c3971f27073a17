//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the local server orchestrator.
#[derive(Parser)]
#[command(name = "burrow")]
#[command(about = "Build, run and supervise a local Go server")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Read settings from this file instead of the default config path
    #[arg(long = "config", global = true, env = "BURROW_CONFIG")]
    pub config: Option<String>,

    /// Simulate the server lifecycle without building or running anything
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Default tracing filter directive for this invocation.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
