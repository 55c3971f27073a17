//! CLI entry point - the composition root.
//!
//! Wires logging, `.env`, settings and the server service together, then
//! dispatches to a handler. Errors carrying a [`CliError`] set the exit code.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use burrow_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => CliConfig::load(&PathBuf::from(path))?,
        None => CliConfig::with_defaults()?,
    };
    let ctx = bootstrap(config.dry_run(cli.dry_run))?;

    match command {
        Commands::Serve { path, port } => handlers::serve::execute(&ctx, &path, port).await?,
        Commands::Paths => handlers::paths::execute(&ctx)?,
        Commands::CleanCache => handlers::clean_cache::execute(&ctx)?,
    }

    Ok(())
}
