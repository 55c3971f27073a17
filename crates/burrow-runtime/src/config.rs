//! Orchestrator configuration.

use std::path::PathBuf;
use std::time::Duration;

use burrow_core::Settings;

use crate::validate::GO_SOURCE_EXTENSION;

/// How often the lifetime watch checks whether the process is still alive.
const DEFAULT_PROCESS_POLL: Duration = Duration::from_secs(1);

/// Timing and location knobs for an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory receiving built binaries.
    pub cache_dir: PathBuf,
    /// Required suffix of source files (without the dot).
    pub source_extension: String,
    /// Delay before the first health probe.
    pub health_warmup: Duration,
    /// Period between health probes.
    pub health_interval: Duration,
    /// Timeout of a single probe.
    pub health_timeout: Duration,
    /// Time a terminated process gets before it is killed.
    pub shutdown_grace: Duration,
    /// Session limit; `None` lets a session run until stopped.
    pub max_session: Option<Duration>,
    /// Liveness polling period of the lifetime watch.
    pub process_poll: Duration,
}

impl OrchestratorConfig {
    /// Default timings with binaries cached in `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::from_settings(&Settings::default(), cache_dir)
    }

    /// Build a config from user settings.
    pub fn from_settings(settings: &Settings, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            source_extension: GO_SOURCE_EXTENSION.to_string(),
            health_warmup: settings.effective_health_warmup(),
            health_interval: settings.effective_health_interval(),
            health_timeout: settings.effective_health_timeout(),
            shutdown_grace: settings.effective_shutdown_grace(),
            max_session: settings.effective_max_session(),
            process_poll: DEFAULT_PROCESS_POLL,
        }
    }
}
