//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Build and run a Go server, supervising it until Ctrl+C
    Serve {
        /// Path to the server's main Go source file
        path: String,
        /// Port the server listens on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<String>,
    },

    /// Show resolved paths for config and cached binaries
    Paths,

    /// Remove all cached server binaries
    CleanCache,
}
