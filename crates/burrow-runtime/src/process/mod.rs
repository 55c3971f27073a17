//! Subprocess launch and shutdown for supervised servers.
//!
//! - `ProcessLauncher` / `BinaryLauncher` - start a built binary
//! - `SupervisedProcess` - owned handle to the running child
//! - `ShutdownCoordinator` - terminate, wait, escalate to kill, clean up

mod launcher;
pub mod shutdown;

pub use launcher::{BinaryLauncher, ProcessLauncher, SupervisedProcess};
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome};
