//! Ordered shutdown of a supervised server with SIGTERM → SIGKILL escalation.
//!
//! # Strategy
//! 1. Send SIGTERM
//! 2. Wait for exit on a background task, racing the grace period
//! 3. If the grace period wins, send SIGKILL and wait for reaping
//! 4. Remove the cached binary, whatever happened above
//!
//! Nothing here returns an error. Every failure becomes an event.

use std::io;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use burrow_core::{EventSink, ServerEvent, ShutdownError};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

use super::SupervisedProcess;
use crate::artifact::remove_artifact;

/// How a shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// There was no live process.
    NothingToStop,
    /// The process had already exited before the terminate signal.
    AlreadyExited,
    /// The process exited within the grace period.
    Graceful,
    /// The process exited within the grace period but reported a failure.
    ExitedWithError,
    /// The grace period expired and the process was killed.
    Forced,
}

/// Runs the terminate-wait-kill-cleanup sequence.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownCoordinator {
    grace: Duration,
}

impl ShutdownCoordinator {
    pub const fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Stop `process` (if any) and remove `artifact` (if any).
    ///
    /// Cleanup runs on every path, including when there is no process.
    pub async fn shutdown(
        &self,
        process: Option<SupervisedProcess>,
        artifact: Option<&Path>,
        events: &dyn EventSink,
    ) -> ShutdownOutcome {
        let outcome = match process {
            None => {
                events.emit(ServerEvent::update("no server process to stop"));
                ShutdownOutcome::NothingToStop
            }
            Some(process) => {
                events.emit(ServerEvent::update("stopping server"));
                self.stop_child(process.into_child(), events).await
            }
        };

        if let Some(path) = artifact {
            match remove_artifact(path) {
                Ok(()) => events.emit(ServerEvent::update("cleanup successful")),
                Err(e) => {
                    warn!(error = %e, "Failed to remove cached binary");
                    events.emit(ServerEvent::error(e.to_string()));
                }
            }
        }

        events.emit(ServerEvent::update("server not running...ready"));
        debug!(?outcome, "Shutdown finished");
        outcome
    }

    async fn stop_child(&self, mut child: Child, events: &dyn EventSink) -> ShutdownOutcome {
        // Already reaped (e.g. by a liveness poll): nothing to signal
        let Some(pid) = child.id() else {
            events.emit(ServerEvent::update("server process already exited"));
            return ShutdownOutcome::AlreadyExited;
        };

        if let Err(e) = terminate(&mut child, pid) {
            events.emit(ServerEvent::error(e.to_string()));
        }

        let mut waiter: JoinHandle<io::Result<ExitStatus>> =
            tokio::spawn(async move { child.wait().await });

        tokio::select! {
            result = &mut waiter => report_exit(result, events),
            () = tokio::time::sleep(self.grace) => {
                if waiter.is_finished() {
                    return report_exit(waiter.await, events);
                }

                events.emit(ServerEvent::error(
                    "server didn't shutdown gracefully, force killing",
                ));
                match force_kill(pid) {
                    Ok(()) => events.emit(ServerEvent::update("server process force killed")),
                    Err(e) => events.emit(ServerEvent::error(e.to_string())),
                }

                // Wait for reaping regardless of how the kill went
                if let Err(e) = waiter.await {
                    warn!(pid, error = %e, "Exit waiter failed after kill");
                }
                ShutdownOutcome::Forced
            }
        }
    }
}

fn report_exit(
    result: Result<io::Result<ExitStatus>, tokio::task::JoinError>,
    events: &dyn EventSink,
) -> ShutdownOutcome {
    match result {
        Ok(Ok(status)) if exited_cleanly(status) => {
            events.emit(ServerEvent::update("server process shut down gracefully"));
            ShutdownOutcome::Graceful
        }
        Ok(Ok(status)) => {
            events.emit(ServerEvent::error(
                ShutdownError::Wait(status.to_string()).to_string(),
            ));
            ShutdownOutcome::ExitedWithError
        }
        Ok(Err(e)) => {
            events.emit(ServerEvent::error(ShutdownError::Wait(e.to_string()).to_string()));
            ShutdownOutcome::ExitedWithError
        }
        Err(e) => {
            events.emit(ServerEvent::error(ShutdownError::Wait(e.to_string()).to_string()));
            ShutdownOutcome::ExitedWithError
        }
    }
}

/// Success, or death by the SIGTERM we sent.
fn exited_cleanly(status: ExitStatus) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.success() || status.signal() == Some(Signal::SIGTERM as i32)
    }

    #[cfg(not(unix))]
    {
        status.success()
    }
}

#[cfg(unix)]
fn unix_pid(pid: u32) -> Result<Pid, ShutdownError> {
    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| ShutdownError::Signal(format!("invalid pid {pid}")))
}

#[cfg(unix)]
fn terminate(_child: &mut Child, pid: u32) -> Result<(), ShutdownError> {
    match signal::kill(unix_pid(pid)?, Signal::SIGTERM) {
        // Process may have already exited
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(ShutdownError::Signal(e.to_string())),
    }
}

// No SIGTERM equivalent: terminate immediately
#[cfg(not(unix))]
fn terminate(child: &mut Child, _pid: u32) -> Result<(), ShutdownError> {
    child
        .start_kill()
        .map_err(|e| ShutdownError::Signal(e.to_string()))
}

#[cfg(unix)]
fn force_kill(pid: u32) -> Result<(), ShutdownError> {
    let kill_failed = |reason: String| ShutdownError::Kill { pid, reason };
    let pid = unix_pid(pid).map_err(|e| kill_failed(e.to_string()))?;
    match signal::kill(pid, Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(kill_failed(e.to_string())),
    }
}

#[cfg(not(unix))]
fn force_kill(_pid: u32) -> Result<(), ShutdownError> {
    Ok(())
}
