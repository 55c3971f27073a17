//! Server service trait: the capability boundary front ends talk to.
//!
//! The real subprocess-backed implementation lives in `burrow-runtime`.
//! [`FakeServerService`] follows the same state rules without spawning
//! anything, for front-end tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{ConcurrencyError, ServerError};
use crate::domain::ServerStatus;
use crate::events::{ServerEvent, ServerEventSender};
use crate::ports::EventSink;

/// Start/stop/status contract for one supervised local server.
///
/// # Design Rules
///
/// - At most one session per instance; a second start is rejected
/// - `start_server` returns once the process is launched, never waits for health
/// - Background failures are delivered through `events`, not as return values
#[async_trait]
pub trait ServerService: Send + Sync {
    /// Validate, build and launch the server at `path`, listening on `port`.
    async fn start_server(
        &self,
        path: &str,
        port: &str,
        events: ServerEventSender,
    ) -> Result<(), ServerError>;

    /// Tear down the active session.
    async fn stop_server(&self) -> Result<(), ServerError>;

    /// Synchronous snapshot of the session status.
    fn status(&self) -> ServerStatus;
}

#[derive(Default)]
struct FakeState {
    status: ServerStatus,
    events: Option<ServerEventSender>,
    starts: usize,
}

/// In-memory [`ServerService`] that never touches the filesystem or spawns
/// processes.
#[derive(Default)]
pub struct FakeServerService {
    state: Mutex<FakeState>,
}

impl FakeServerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted starts so far.
    pub fn start_count(&self) -> usize {
        self.lock().starts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ServerService for FakeServerService {
    async fn start_server(
        &self,
        path: &str,
        port: &str,
        events: ServerEventSender,
    ) -> Result<(), ServerError> {
        let mut state = self.lock();
        if state.status.running {
            return Err(ConcurrencyError::AlreadyRunning.into());
        }

        events.emit(ServerEvent::update("starting server..."));
        events.emit(ServerEvent::update("valid path"));
        events.emit(ServerEvent::update("server running..."));

        state.status = ServerStatus::running(path, format!("Server running on port {port}"));
        state.events = Some(events);
        state.starts += 1;
        Ok(())
    }

    async fn stop_server(&self) -> Result<(), ServerError> {
        let mut state = self.lock();
        if !state.status.running {
            return Err(ConcurrencyError::NotRunning.into());
        }

        if let Some(events) = state.events.take() {
            events.emit(ServerEvent::update("stopping server"));
            events.emit(ServerEvent::update("server not running...ready"));
        }
        state.status = ServerStatus::idle();
        Ok(())
    }

    fn status(&self) -> ServerStatus {
        self.lock().status.clone()
    }
}
