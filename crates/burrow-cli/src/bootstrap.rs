//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the orchestrator is wired together
//! for the CLI. Settings come from the config file, then the environment;
//! the server service is either the real process-backed orchestrator or,
//! with `--dry-run`, the in-memory fake.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use burrow_core::{
    FakeServerService, ServerService, Settings, config_path, server_cache_dir, validate_settings,
};
use burrow_runtime::{Orchestrator, OrchestratorConfig};
use tracing::debug;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Effective settings after file and environment overrides.
    pub settings: Settings,
    /// Directory receiving built server binaries.
    pub cache_dir: PathBuf,
    /// Use the in-memory server service.
    pub dry_run: bool,
}

impl CliConfig {
    /// Load settings from the default config path.
    pub fn with_defaults() -> Result<Self, CliError> {
        Self::load(&config_path()?)
    }

    /// Load settings from `config_file` (a missing file means defaults),
    /// apply environment overrides and validate the result.
    pub fn load(config_file: &Path) -> Result<Self, CliError> {
        let mut settings = Settings::load(config_file)?;
        settings.apply_env()?;
        validate_settings(&settings)?;
        debug!(config = %config_file.display(), ?settings, "Settings loaded");

        Ok(Self {
            settings,
            cache_dir: server_cache_dir()?,
            dry_run: false,
        })
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Fully composed context handed to command handlers.
pub struct CliContext {
    /// The server lifecycle service.
    pub service: Arc<dyn ServerService>,
    /// Effective settings.
    pub settings: Settings,
    /// Directory receiving built server binaries.
    pub cache_dir: PathBuf,
}

impl CliContext {
    pub fn service(&self) -> &dyn ServerService {
        self.service.as_ref()
    }

    /// Port used when none is given on the command line.
    pub fn default_port(&self) -> &str {
        self.settings.effective_port()
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let service: Arc<dyn ServerService> = if config.dry_run {
        debug!("Using in-memory server service");
        Arc::new(FakeServerService::new())
    } else {
        let orchestrator_config =
            OrchestratorConfig::from_settings(&config.settings, config.cache_dir.clone());
        Arc::new(Orchestrator::local(orchestrator_config)?)
    };

    Ok(CliContext {
        service,
        settings: config.settings,
        cache_dir: config.cache_dir,
    })
}
