//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the orchestration core expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No process handles or HTTP client types in any signature
//! - Collaborators are injected at construction, never looked up globally
//! - Background failures are events, synchronous failures are `ServerError`

pub mod artifact_builder;
pub mod event_sink;
pub mod health_probe;
pub mod request_executor;
pub mod request_store;
pub mod server_service;

use std::path::PathBuf;
use thiserror::Error;

pub use artifact_builder::ArtifactBuilder;
pub use event_sink::{EventSink, NoopEventSink};
pub use health_probe::HealthProbe;
pub use request_executor::RequestExecutor;
pub use request_store::RequestStore;
pub use server_service::{FakeServerService, ServerService};

/// The source path cannot be built and run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The path could not be made absolute.
    #[error("could not resolve path {path}: {reason}")]
    Resolve { path: PathBuf, reason: String },

    /// Nothing exists at the resolved path.
    #[error("file does not exist: {0}")]
    NotExist(PathBuf),

    /// The file does not carry the build-source suffix.
    #[error("file is not .{expected} type: {path}")]
    WrongExtension { path: PathBuf, expected: String },
}

/// Compiling the source into a cached binary failed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to create cache directory {path}: {reason}")]
    CacheDir { path: PathBuf, reason: String },

    /// The toolchain itself could not be spawned.
    #[error("failed to run {program}: {reason}")]
    Toolchain { program: String, reason: String },

    /// The toolchain ran and exited unsuccessfully.
    #[error("build failed: {status}")]
    Failed { status: String },

    /// The toolchain reported success but left no binary behind.
    #[error("build produced no binary at {0}")]
    MissingOutput(PathBuf),
}

/// The built binary could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("couldn't run file {binary}: {reason}")]
    Spawn { binary: PathBuf, reason: String },
}

/// A lifecycle call arrived in the wrong state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    #[error("server already running")]
    AlreadyRunning,

    #[error("server not running")]
    NotRunning,

    /// The runtime shut down before the lifecycle call finished.
    #[error("server operation interrupted")]
    Interrupted,
}

/// A health probe failed. Reported as an event, never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    #[error("cant reach server: {0}")]
    Unreachable(String),

    #[error("server returned status {0} (expected 200)")]
    UnexpectedStatus(u16),
}

/// A step of the shutdown sequence failed. Reported as an event only.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("failed to terminate process: {0}")]
    Signal(String),

    #[error("server process exited with error: {0}")]
    Wait(String),

    #[error("failed to kill process {pid}: {reason}")]
    Kill { pid: u32, reason: String },

    #[error("failed to cleanup binary {path}: {reason}")]
    Cleanup { path: PathBuf, reason: String },
}

/// Errors returned synchronously from the [`ServerService`] contract.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid path: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),
}

impl ServerError {
    /// Whether the error was a state conflict rather than a failed step.
    #[must_use]
    pub const fn is_concurrency(&self) -> bool {
        matches!(self, Self::Concurrency(_))
    }
}
