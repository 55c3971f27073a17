//! Settings domain types, loading and validation.
//!
//! Settings come from an optional YAML file and are then overridden by
//! environment variables. Every field is optional; the `effective_*`
//! accessors supply defaults.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Port used when none is configured.
pub const DEFAULT_PORT: &str = "8080";

/// Seconds between health probes.
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 5;

/// Client-side timeout of a single health probe.
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Delay before the first health probe after launch.
pub const DEFAULT_HEALTH_WARMUP_MS: u64 = 1000;

/// Grace period between terminate and kill.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Upper bound on an unattended session (15 minutes).
pub const DEFAULT_MAX_SESSION_SECS: u64 = 15 * 60;

/// Application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Port passed to the supervised server and used to derive its health URL.
    pub default_port: Option<String>,

    /// Seconds between health probes.
    pub health_interval_secs: Option<u64>,

    /// Timeout of a single health probe in seconds.
    pub health_timeout_secs: Option<u64>,

    /// Warm-up delay before the first probe, in milliseconds.
    pub health_warmup_ms: Option<u64>,

    /// Grace period before a terminated server is killed.
    pub shutdown_grace_secs: Option<u64>,

    /// Maximum session length in seconds. `0` disables the limit.
    pub max_session_secs: Option<u64>,
}

impl Settings {
    /// Create settings with every field set to its default.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            default_port: Some(DEFAULT_PORT.to_string()),
            health_interval_secs: Some(DEFAULT_HEALTH_INTERVAL_SECS),
            health_timeout_secs: Some(DEFAULT_HEALTH_TIMEOUT_SECS),
            health_warmup_ms: Some(DEFAULT_HEALTH_WARMUP_MS),
            shutdown_grace_secs: Some(DEFAULT_SHUTDOWN_GRACE_SECS),
            max_session_secs: Some(DEFAULT_MAX_SESSION_SECS),
        }
    }

    /// Load settings from a YAML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SettingsError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        Self::from_yaml(&contents)
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, SettingsError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Apply environment overrides (`DEFAULT_PORT`, `BURROW_MAX_SESSION_SECS`).
    pub fn apply_env(&mut self) -> Result<(), SettingsError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        if let Some(port) = lookup("DEFAULT_PORT").filter(|p| !p.is_empty()) {
            self.default_port = Some(port);
        }

        if let Some(raw) = lookup("BURROW_MAX_SESSION_SECS").filter(|s| !s.is_empty()) {
            let secs = raw
                .parse()
                .map_err(|_| SettingsError::InvalidEnv("BURROW_MAX_SESSION_SECS", raw))?;
            self.max_session_secs = Some(secs);
        }

        Ok(())
    }

    #[must_use]
    pub fn effective_port(&self) -> &str {
        self.default_port.as_deref().unwrap_or(DEFAULT_PORT)
    }

    #[must_use]
    pub fn effective_health_interval(&self) -> Duration {
        Duration::from_secs(
            self.health_interval_secs
                .unwrap_or(DEFAULT_HEALTH_INTERVAL_SECS),
        )
    }

    #[must_use]
    pub fn effective_health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs.unwrap_or(DEFAULT_HEALTH_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn effective_health_warmup(&self) -> Duration {
        Duration::from_millis(self.health_warmup_ms.unwrap_or(DEFAULT_HEALTH_WARMUP_MS))
    }

    #[must_use]
    pub fn effective_shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs.unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS))
    }

    /// Session limit, or `None` when disabled.
    #[must_use]
    pub fn effective_max_session(&self) -> Option<Duration> {
        match self.max_session_secs.unwrap_or(DEFAULT_MAX_SESSION_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Settings loading or validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidEnv(&'static str, String),

    #[error("Port must be a number between 1 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(port) = &settings.default_port {
        validate_port(port)?;
    }

    let durations = [
        ("health_interval_secs", settings.health_interval_secs),
        ("health_timeout_secs", settings.health_timeout_secs),
        ("health_warmup_ms", settings.health_warmup_ms),
        ("shutdown_grace_secs", settings.shutdown_grace_secs),
    ];
    for (name, value) in durations {
        if value == Some(0) {
            return Err(SettingsError::ZeroDuration(name));
        }
    }

    Ok(())
}

/// Check that `port` is a usable TCP port number.
pub fn validate_port(port: &str) -> Result<(), SettingsError> {
    match port.trim().parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(SettingsError::InvalidPort(port.to_string())),
    }
}
