//! Starting built binaries as supervised child processes.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use burrow_core::LaunchError;
use tokio::process::{Child, Command};
use tracing::info;

/// Starts a binary and hands back an owned process handle.
///
/// Implementations must not wait for the process to become healthy.
// No cancellation token: process lifetime is tied to ownership of the
// returned handle, which kills the child when dropped.
pub trait ProcessLauncher: Send + Sync {
    /// Launch `binary`, telling it to listen on `port`.
    fn launch(&self, binary: &Path, port: &str) -> Result<SupervisedProcess, LaunchError>;
}

/// Handle to a running server process.
///
/// The child is killed if the handle is dropped without a shutdown, so a
/// process never outlives the session that owns it.
#[derive(Debug)]
pub struct SupervisedProcess {
    child: Child,
    binary: PathBuf,
}

impl SupervisedProcess {
    /// Wrap an already spawned child.
    ///
    /// The child should have been spawned with `kill_on_drop(true)`.
    pub fn new(child: Child, binary: impl Into<PathBuf>) -> Self {
        Self {
            child,
            binary: binary.into(),
        }
    }

    /// OS process id, or `None` once the process has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Non-blocking exit check.
    pub fn try_exit_status(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    pub(crate) fn into_child(self) -> Child {
        self.child
    }
}

/// Runs the binary directly, inheriting stdout and stderr.
///
/// The port is exported as `PORT` for servers that read it from the
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryLauncher;

impl BinaryLauncher {
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for BinaryLauncher {
    fn launch(&self, binary: &Path, port: &str) -> Result<SupervisedProcess, LaunchError> {
        let child = Command::new(binary)
            .env("PORT", port)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                binary: binary.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(binary = %binary.display(), pid = ?child.id(), port, "Server process started");
        Ok(SupervisedProcess::new(child, binary))
    }
}
