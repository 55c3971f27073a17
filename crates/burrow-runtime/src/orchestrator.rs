//! Local server orchestrator: the `ServerService` backed by real processes.
//!
//! # Lifecycle
//!
//! `Idle -> Starting -> Running -> Stopping -> Idle`
//!
//! - `start_server` validates, builds and launches, then spawns the health
//!   monitor and the lifetime watch. Any failure returns to `Idle` before a
//!   health task exists.
//! - `stop_server` cancels the health task and joins it, then runs the
//!   shutdown coordinator, then resets the status.
//! - The lifetime watch tears the session down on its own when the process
//!   exits unexpectedly or the session limit expires.
//!
//! Start and stop run on their own tasks. A caller that stops awaiting
//! (timeout, `select!`) does not abandon a half-finished transition; the
//! task runs to `Running` or `Idle` regardless.
//!
//! # Locking
//!
//! All shared session state sits behind one `std::sync::Mutex`. It is held
//! only to read or update fields, never across an `.await`. Event senders
//! are cloned out under the lock and used after it is released.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use burrow_core::{
    ArtifactBuilder, ConcurrencyError, EventSink, HealthProbe, ServerError, ServerEvent,
    ServerEventSender, ServerService, ServerSpec, ServerStatus, SessionState,
};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::artifact::{GoArtifactBuilder, remove_artifact};
use crate::config::OrchestratorConfig;
use crate::health::HttpHealthProbe;
use crate::health_monitor::HealthMonitor;
use crate::process::{BinaryLauncher, ProcessLauncher, ShutdownCoordinator, SupervisedProcess};
use crate::validate::PathValidator;

/// Why a session is being torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TeardownReason {
    Requested,
    SessionLimit,
    Crashed(String),
}

/// Background tasks and tokens of one session. Never reused.
struct SessionHandle {
    cancel: CancellationToken,
    health_cancel: CancellationToken,
    health_task: JoinHandle<()>,
    watch_task: JoinHandle<()>,
}

#[derive(Default)]
struct Shared {
    state: SessionState,
    status: ServerStatus,
    events: Option<ServerEventSender>,
    spec: Option<ServerSpec>,
    binary_path: Option<PathBuf>,
    process: Option<SupervisedProcess>,
    session: Option<SessionHandle>,
}

struct Inner {
    validator: PathValidator,
    builder: Arc<dyn ArtifactBuilder>,
    launcher: Arc<dyn ProcessLauncher>,
    probe: Arc<dyn HealthProbe>,
    config: OrchestratorConfig,
    shared: Mutex<Shared>,
}

/// Supervises at most one locally built server at a time.
///
/// Collaborators are injected at construction so tests can replace the
/// builder, launcher and health probe independently.
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        builder: Arc<dyn ArtifactBuilder>,
        launcher: Arc<dyn ProcessLauncher>,
        probe: Arc<dyn HealthProbe>,
        config: OrchestratorConfig,
    ) -> Self {
        let inner = Inner {
            validator: PathValidator::new(config.source_extension.clone()),
            builder,
            launcher,
            probe,
            config,
            shared: Mutex::new(Shared::default()),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Orchestrator using `go build`, direct process launch and HTTP probes.
    pub fn local(config: OrchestratorConfig) -> anyhow::Result<Self> {
        let builder = GoArtifactBuilder::new(config.cache_dir.clone());
        let probe = HttpHealthProbe::new(config.health_timeout)?;
        Ok(Self::new(
            Arc::new(builder),
            Arc::new(BinaryLauncher::new()),
            Arc::new(probe),
            config,
        ))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Spec of the active session, if any.
    pub fn spec(&self) -> Option<ServerSpec> {
        self.inner.lock().spec.clone()
    }

    /// PID of the live process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.inner.lock().process.as_ref().and_then(SupervisedProcess::pid)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }
}

#[async_trait]
impl ServerService for Orchestrator {
    async fn start_server(
        &self,
        path: &str,
        port: &str,
        events: ServerEventSender,
    ) -> Result<(), ServerError> {
        let inner = Arc::clone(&self.inner);
        let (path, port) = (path.to_string(), port.to_string());
        run_detached(async move { Inner::start(&inner, &path, &port, events).await }).await
    }

    async fn stop_server(&self) -> Result<(), ServerError> {
        let inner = Arc::clone(&self.inner);
        run_detached(async move { inner.teardown(TeardownReason::Requested).await }).await
    }

    fn status(&self) -> ServerStatus {
        self.inner.lock().status.clone()
    }
}

/// Run a lifecycle transition on its own task so it completes even if the
/// caller's future is dropped.
async fn run_detached<F>(transition: F) -> Result<(), ServerError>
where
    F: Future<Output = Result<(), ServerError>> + Send + 'static,
{
    match tokio::spawn(transition).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!(error = %e, "Lifecycle task cancelled");
            Err(ConcurrencyError::Interrupted.into())
        }
    }
}

// Runs once the orchestrator and every in-flight transition are gone
impl Drop for Inner {
    fn drop(&mut self) {
        let shared = self.shared.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = shared.session.take() {
            session.cancel.cancel();
        }
        // Dropping the handle kills the child
        if shared.process.take().is_some() {
            warn!("Orchestrator dropped with a live server, killing it");
        }
        if let Some(binary) = shared.binary_path.take() {
            if let Err(e) = remove_artifact(&binary) {
                warn!(error = %e, "Failed to remove cached binary on drop");
            }
        }
        shared.events = None;
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn start(
        this: &Arc<Self>,
        path: &str,
        port: &str,
        events: ServerEventSender,
    ) -> Result<(), ServerError> {
        {
            let mut shared = this.lock();
            if shared.state.is_busy() {
                return Err(ConcurrencyError::AlreadyRunning.into());
            }
            shared.state = SessionState::Starting;
            shared.events = Some(events);
        }

        this.emit(ServerEvent::update("starting server..."));

        let (spec, process) = match this.prepare(path, port).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(path, error = %e, "Server start failed");
                this.emit(ServerEvent::error(e.to_string()));
                let mut shared = this.lock();
                shared.state = SessionState::Idle;
                shared.events = None;
                return Err(e);
            }
        };

        info!(
            source = %spec.source_path.display(),
            port = %spec.port,
            pid = ?process.pid(),
            "Server launched"
        );
        {
            let mut shared = this.lock();
            shared.process = Some(process);
            shared.binary_path = Some(spec.binary_path.clone());
            shared.spec = Some(spec.clone());
        }
        this.emit(ServerEvent::update("server running..."));

        let cancel = CancellationToken::new();
        let health_cancel = cancel.child_token();

        let health_task = {
            let monitor = HealthMonitor::new(
                Arc::clone(&this.probe),
                this.config.health_warmup,
                this.config.health_interval,
            );
            let sink = SessionSink(Arc::downgrade(this));
            let token = health_cancel.clone();
            let url = spec.health_url.clone();
            tokio::spawn(async move { monitor.run(token, &url, &sink).await })
        };
        let watch_task = tokio::spawn(watch_session(
            Arc::downgrade(this),
            cancel.clone(),
            this.config.process_poll,
            this.config.max_session,
        ));

        let mut shared = this.lock();
        shared.session = Some(SessionHandle {
            cancel,
            health_cancel,
            health_task,
            watch_task,
        });
        shared.status = ServerStatus::running(
            spec.source_path.display().to_string(),
            format!("Server running on port {}", spec.port),
        );
        shared.state = SessionState::Running;
        Ok(())
    }

    /// Validate, build, launch. Nothing is recorded in shared state here.
    async fn prepare(
        &self,
        path: &str,
        port: &str,
    ) -> Result<(ServerSpec, SupervisedProcess), ServerError> {
        let source = self.validator.validate(path)?;
        self.emit(ServerEvent::update("valid path"));

        self.emit(ServerEvent::update("building binary..."));
        let binary = self.builder.build(&source).await?;
        self.emit(ServerEvent::update("binary built"));

        let process = self.launcher.launch(&binary, port)?;
        Ok((ServerSpec::new(source, port, binary), process))
    }

    async fn teardown(&self, reason: TeardownReason) -> Result<(), ServerError> {
        let (session, process, binary, path) = {
            let mut shared = self.lock();
            if shared.state != SessionState::Running {
                return Err(ConcurrencyError::NotRunning.into());
            }
            shared.state = SessionState::Stopping;
            (
                shared.session.take(),
                shared.process.take(),
                shared.binary_path.take(),
                shared.status.path.clone(),
            )
        };

        info!(?reason, path = %path, "Tearing down server session");
        match &reason {
            TeardownReason::Requested => {}
            TeardownReason::SessionLimit => {
                self.emit(ServerEvent::update("session limit reached, stopping server"));
            }
            TeardownReason::Crashed(detail) => {
                self.emit(ServerEvent::error(format!(
                    "server process exited unexpectedly ({detail})"
                )));
            }
        }

        // Health task must be gone before the process is touched
        let watch_task = match session {
            Some(session) => {
                session.health_cancel.cancel();
                if let Err(e) = session.health_task.await {
                    warn!(error = %e, "Health task ended abnormally");
                }
                session.cancel.cancel();
                Some(session.watch_task)
            }
            None => None,
        };

        let coordinator = ShutdownCoordinator::new(self.config.shutdown_grace);
        coordinator.shutdown(process, binary.as_deref(), self).await;

        {
            let mut shared = self.lock();
            shared.status = match &reason {
                TeardownReason::Crashed(detail) => ServerStatus::crashed(path, detail),
                _ => ServerStatus::idle(),
            };
            shared.spec = None;
            shared.events = None;
            shared.state = SessionState::Idle;
        }

        // The watch task may be the caller; only an external stop joins it
        if reason == TeardownReason::Requested {
            if let Some(watch_task) = watch_task {
                if let Err(e) = watch_task.await {
                    warn!(error = %e, "Lifetime watch ended abnormally");
                }
            }
        }

        Ok(())
    }

    /// Exit description if the live process has ended, checked without blocking.
    fn poll_process(&self) -> Option<String> {
        let mut shared = self.lock();
        if shared.state != SessionState::Running {
            return None;
        }
        match shared.process.as_mut()?.try_exit_status() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => Some(format!("wait failed: {e}")),
        }
    }
}

impl EventSink for Inner {
    fn emit(&self, event: ServerEvent) {
        debug!(kind = %event.kind, message = %event.message, "Server event");
        let sender = self.lock().events.clone();
        if let Some(sender) = sender {
            sender.emit(event);
        }
    }
}

/// Event sink handed to background tasks; does not keep the orchestrator alive.
struct SessionSink(Weak<Inner>);

impl EventSink for SessionSink {
    fn emit(&self, event: ServerEvent) {
        if let Some(inner) = self.0.upgrade() {
            inner.emit(event);
        }
    }
}

/// Lifetime watch: detects unexpected exits and enforces the session limit.
async fn watch_session(
    inner: Weak<Inner>,
    cancel: CancellationToken,
    poll: Duration,
    max_session: Option<Duration>,
) {
    let deadline = max_session.map(|limit| Instant::now() + limit);
    let mut ticker = interval_at(Instant::now() + poll, poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let limit_reached = async {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(limit_reached);

    let reason = loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = &mut limit_reached => break TeardownReason::SessionLimit,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { return };
                if let Some(detail) = inner.poll_process() {
                    warn!(status = %detail, "Server process exited unexpectedly");
                    break TeardownReason::Crashed(detail);
                }
            }
        }
    };

    // The session may still be finishing its start; retry until it is ours or gone
    loop {
        let Some(inner) = inner.upgrade() else { return };
        let result = inner.teardown(reason.clone()).await;
        let starting = inner.lock().state == SessionState::Starting;
        if result.is_ok() || !starting {
            return;
        }
        drop(inner);
        tokio::select! {
            () = cancel.cancelled() => return,
            () = sleep(poll) => {}
        }
    }
}
