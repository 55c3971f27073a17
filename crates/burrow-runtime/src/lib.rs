//! Process runtime for burrow.
//!
//! OS-level adapters behind the `burrow-core` ports: source validation,
//! `go build`, process launch and shutdown, HTTP health probing, and the
//! [`Orchestrator`] that ties them into one supervised session.
#![deny(unsafe_code)]

mod artifact;
pub mod config;
mod health;
pub mod health_monitor;
pub mod orchestrator;
pub mod process;
mod validate;

// Re-export the main ServerService implementation
pub use orchestrator::Orchestrator;

pub use config::OrchestratorConfig;

// Re-export adapters for callers composing their own orchestrator
pub use artifact::{GoArtifactBuilder, remove_artifact};
pub use health::HttpHealthProbe;
pub use health_monitor::HealthMonitor;
pub use process::{
    BinaryLauncher, ProcessLauncher, ShutdownCoordinator, ShutdownOutcome, SupervisedProcess,
};
pub use validate::{GO_SOURCE_EXTENSION, PathValidator};
