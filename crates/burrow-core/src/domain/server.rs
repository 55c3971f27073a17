//! Supervised server session types.
//!
//! A session covers one local server binary from a successful start until its
//! teardown completes. These types carry no process handles; the runtime
//! crate owns those.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Status text reported whenever no session is active.
pub const IDLE_STATUS_TEXT: &str = "Server not running";

/// Derive the health endpoint for a server listening on `port`.
///
/// The URL is a pure function of the port so repeated starts on the same
/// port always probe the same endpoint.
pub fn health_url_for(port: &str) -> String {
    format!("http://localhost:{port}/health")
}

/// Immutable description of an active session.
///
/// Created once per successful start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSpec {
    /// Absolute path of the validated source file.
    pub source_path: PathBuf,
    /// Port the server is expected to listen on.
    pub port: String,
    /// Health endpoint derived from `port`.
    pub health_url: String,
    /// Cached binary built from `source_path`.
    pub binary_path: PathBuf,
}

impl ServerSpec {
    /// Create a spec, deriving the health URL from the port.
    pub fn new(source_path: PathBuf, port: impl Into<String>, binary_path: PathBuf) -> Self {
        let port = port.into();
        Self {
            health_url: health_url_for(&port),
            source_path,
            port,
            binary_path,
        }
    }
}

/// Snapshot of the session as seen by front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// Whether a session is currently active.
    pub running: bool,
    /// Source path of the active (or last crashed) session, empty when idle.
    pub path: String,
    /// Human-readable status line.
    pub status_text: String,
}

impl ServerStatus {
    /// Status of an orchestrator with no session.
    pub fn idle() -> Self {
        Self {
            running: false,
            path: String::new(),
            status_text: IDLE_STATUS_TEXT.to_string(),
        }
    }

    /// Status of a live session.
    pub fn running(path: impl Into<String>, status_text: impl Into<String>) -> Self {
        Self {
            running: true,
            path: path.into(),
            status_text: status_text.into(),
        }
    }

    /// Status after the supervised process exited on its own.
    pub fn crashed(path: impl Into<String>, detail: &str) -> Self {
        Self {
            running: false,
            path: path.into(),
            status_text: format!("Server crashed: {detail}"),
        }
    }
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self::idle()
    }
}

/// Lifecycle state of an orchestrator.
///
/// Transitions: `Idle -> Starting -> Running -> Stopping -> Idle`. A failed
/// start falls back from `Starting` to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
}

impl SessionState {
    /// Whether a start request must be rejected in this state.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}
