//! Integration tests for the `Orchestrator` session lifecycle.
//!
//! Real child processes are used, but the build step is replaced: the fake
//! builder writes a small `sh` script into the cache directory and the
//! launcher runs it with `sh`. Health probes are scripted, so no server
//! needs to listen on a port.
//!
//! # What is tested
//!
//! - Validation failures leave no session and build nothing
//! - Start then stop runs the full event sequence and removes the binary
//! - Concurrent start is rejected without disturbing the live session
//! - Stop on an idle orchestrator is rejected
//! - A process ignoring SIGTERM is force killed after the grace period
//! - An unexpected exit is detected and torn down
//! - The session limit stops a long-running server
//! - Health failures are reported but never fail the start
//! - Healthy updates stop before shutdown begins
//! - A start or stop whose caller gave up still runs to a stable state
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use burrow_core::{
    ArtifactBuilder, BuildError, ConcurrencyError, EVENT_QUEUE_CAPACITY, HealthError, HealthProbe,
    LaunchError, ServerError, ServerEvent, ServerEventReceiver, ServerService, ServerStatus,
    SessionState, ValidationError, event_channel, server_binary_path,
};
use burrow_runtime::{Orchestrator, OrchestratorConfig, ProcessLauncher, SupervisedProcess};
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;

// ── Fakes ──────────────────────────────────────────────────────────

/// "Builds" by writing a shell script where the real binary would go.
struct ScriptBuilder {
    cache_dir: PathBuf,
    script: String,
    fail: AtomicBool,
    delay_ms: AtomicU64,
    builds: AtomicUsize,
}

impl ScriptBuilder {
    fn new(cache_dir: &Path, script: &str) -> Arc<Self> {
        Arc::new(Self {
            cache_dir: cache_dir.to_path_buf(),
            script: script.to_string(),
            fail: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            builds: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ArtifactBuilder for ScriptBuilder {
    async fn build(&self, source: &Path) -> Result<PathBuf, BuildError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(BuildError::Failed {
                status: "exit status: 1".to_string(),
            });
        }
        std::fs::create_dir_all(&self.cache_dir).unwrap();
        let binary = server_binary_path(&self.cache_dir, source);
        std::fs::write(&binary, &self.script).unwrap();
        Ok(binary)
    }
}

/// Runs the cached script with `sh` instead of executing it directly.
struct ScriptLauncher;

impl ProcessLauncher for ScriptLauncher {
    fn launch(&self, binary: &Path, port: &str) -> Result<SupervisedProcess, LaunchError> {
        let child = Command::new("sh")
            .arg(binary)
            .env("PORT", port)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                binary: binary.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(SupervisedProcess::new(child, binary))
    }
}

struct FailingLauncher;

impl ProcessLauncher for FailingLauncher {
    fn launch(&self, binary: &Path, _port: &str) -> Result<SupervisedProcess, LaunchError> {
        Err(LaunchError::Spawn {
            binary: binary.to_path_buf(),
            reason: "permission denied".to_string(),
        })
    }
}

struct StaticProbe(Result<(), HealthError>);

#[async_trait]
impl HealthProbe for StaticProbe {
    async fn probe(&self, _url: &str) -> Result<(), HealthError> {
        self.0.clone()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

const SLEEPER: &str = "exec sleep 30\n";
const STUBBORN: &str = "trap '' TERM\nexec sleep 30\n";
const CRASHER: &str = "sleep 0.2\nexit 3\n";

struct Harness {
    dir: TempDir,
    source: PathBuf,
    builder: Arc<ScriptBuilder>,
    orchestrator: Orchestrator,
}

impl Harness {
    fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    fn binary(&self) -> PathBuf {
        server_binary_path(&self.cache_dir(), &self.source)
    }

    fn source_str(&self) -> &str {
        self.source.to_str().unwrap()
    }
}

/// Short timings so every lifecycle finishes well under a second or two.
fn test_config(cache_dir: PathBuf) -> OrchestratorConfig {
    OrchestratorConfig {
        health_warmup: Duration::from_millis(10),
        health_interval: Duration::from_secs(10),
        health_timeout: Duration::from_millis(100),
        shutdown_grace: Duration::from_secs(2),
        max_session: None,
        process_poll: Duration::from_millis(50),
        ..OrchestratorConfig::new(cache_dir)
    }
}

fn harness_with(
    script: &str,
    launcher: Arc<dyn ProcessLauncher>,
    probe: Result<(), HealthError>,
    tune: impl FnOnce(&mut OrchestratorConfig),
) -> Harness {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("main.go");
    std::fs::write(&source, "package main\n").unwrap();

    let mut config = test_config(dir.path().join("cache"));
    tune(&mut config);

    let builder = ScriptBuilder::new(&config.cache_dir, script);
    let orchestrator = Orchestrator::new(
        builder.clone(),
        launcher,
        Arc::new(StaticProbe(probe)),
        config,
    );
    Harness {
        dir,
        source,
        builder,
        orchestrator,
    }
}

fn harness(script: &str) -> Harness {
    harness_with(script, Arc::new(ScriptLauncher), Ok(()), |_| {})
}

/// Receive events until `pred` matches, returning everything seen.
async fn recv_until(
    rx: &mut ServerEventReceiver,
    pred: impl Fn(&ServerEvent) -> bool,
) -> Vec<ServerEvent> {
    let mut seen = Vec::new();
    timeout(Duration::from_secs(10), async {
        while let Some(event) = rx.recv().await {
            let done = pred(&event);
            seen.push(event);
            if done {
                return;
            }
        }
    })
    .await
    .expect("timed out waiting for event");
    seen
}

/// Receive until the queue closes, i.e. the session released its sender.
async fn drain(rx: &mut ServerEventReceiver) -> Vec<ServerEvent> {
    recv_until(rx, |_| false).await
}

/// Poll until the orchestrator reaches `state`.
async fn wait_for_state(orchestrator: &Orchestrator, state: SessionState) {
    timeout(Duration::from_secs(10), async {
        while orchestrator.state() != state {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("timed out waiting for state");
}

fn messages(events: &[ServerEvent]) -> Vec<&str> {
    events.iter().map(|e| e.message.as_str()).collect()
}

// ── Start validation ───────────────────────────────────────────────

#[tokio::test]
async fn test_missing_source_fails_without_building() {
    let h = harness(SLEEPER);
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    let missing = h.dir.path().join("nope.go");

    let err = h
        .orchestrator
        .start_server(missing.to_str().unwrap(), "8080", tx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServerError::Validation(ValidationError::NotExist(_))
    ));
    assert_eq!(h.orchestrator.status(), ServerStatus::idle());
    assert_eq!(h.orchestrator.state(), SessionState::Idle);
    assert_eq!(h.builder.builds.load(Ordering::SeqCst), 0);
    assert!(!h.cache_dir().exists());

    let events = drain(&mut rx).await;
    assert_eq!(events[0], ServerEvent::update("starting server..."));
    assert!(events[1].is_error());
    assert!(events[1].message.starts_with("invalid path"));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_wrong_extension_is_rejected() {
    let h = harness(SLEEPER);
    let notes = h.dir.path().join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();
    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);

    let err = h
        .orchestrator
        .start_server(notes.to_str().unwrap(), "8080", tx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServerError::Validation(ValidationError::WrongExtension { .. })
    ));
    assert!(!h.orchestrator.status().running);
}

#[tokio::test]
async fn test_build_failure_returns_to_idle() {
    let h = harness(SLEEPER);
    h.builder.fail.store(true, Ordering::SeqCst);
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);

    let err = h
        .orchestrator
        .start_server(h.source_str(), "8080", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::Build(BuildError::Failed { .. })));
    assert_eq!(h.orchestrator.state(), SessionState::Idle);

    let events = drain(&mut rx).await;
    assert_eq!(
        messages(&events)[..3],
        ["starting server...", "valid path", "building binary..."]
    );
    assert!(events.last().unwrap().is_error());

    // A failed start does not block the next one
    h.builder.fail.store(false, Ordering::SeqCst);
    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "8080", tx)
        .await
        .unwrap();
    h.orchestrator.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_launch_failure_returns_to_idle() {
    let h = harness_with(SLEEPER, Arc::new(FailingLauncher), Ok(()), |_| {});
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);

    let err = h
        .orchestrator
        .start_server(h.source_str(), "8080", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::Launch(_)));
    assert!(!h.orchestrator.status().running);

    let events = drain(&mut rx).await;
    assert!(events.last().unwrap().message.starts_with("couldn't run file"));
}

// ── Start / stop ───────────────────────────────────────────────────

#[tokio::test]
async fn test_start_then_stop_full_sequence() {
    let h = harness(SLEEPER);
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);

    h.orchestrator
        .start_server(h.source_str(), "18080", tx)
        .await
        .unwrap();

    let status = h.orchestrator.status();
    assert!(status.running);
    assert_eq!(status.path, h.source_str());
    assert_eq!(status.status_text, "Server running on port 18080");
    assert_eq!(h.orchestrator.state(), SessionState::Running);
    assert!(h.binary().exists());

    let spec = h.orchestrator.spec().unwrap();
    assert_eq!(spec.health_url, "http://localhost:18080/health");
    assert_eq!(spec.binary_path, h.binary());

    // Let the monitor finish its first probe before stopping
    let started = recv_until(&mut rx, |e| {
        e.message == "server reached, starting health checker"
    })
    .await;
    assert_eq!(
        messages(&started),
        [
            "starting server...",
            "valid path",
            "building binary...",
            "binary built",
            "server running...",
            "trying to reach server",
            "server reached, starting health checker",
        ]
    );

    h.orchestrator.stop_server().await.unwrap();
    assert_eq!(h.orchestrator.status(), ServerStatus::idle());
    assert_eq!(h.orchestrator.state(), SessionState::Idle);
    assert!(h.orchestrator.spec().is_none());
    assert!(h.orchestrator.pid().is_none());
    assert!(!h.binary().exists());

    let stopped = drain(&mut rx).await;
    assert_eq!(
        messages(&stopped),
        [
            "stopping server",
            "server process shut down gracefully",
            "cleanup successful",
            "server not running...ready",
        ]
    );
}

#[tokio::test]
async fn test_restart_after_stop() {
    let h = harness(SLEEPER);

    for port in ["18081", "18082"] {
        let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);
        h.orchestrator
            .start_server(h.source_str(), port, tx)
            .await
            .unwrap();
        assert_eq!(
            h.orchestrator.status().status_text,
            format!("Server running on port {port}")
        );
        h.orchestrator.stop_server().await.unwrap();
    }

    assert_eq!(h.builder.builds.load(Ordering::SeqCst), 2);
    assert!(!h.orchestrator.status().running);
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let h = harness(SLEEPER);
    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18083", tx)
        .await
        .unwrap();
    let pid = h.orchestrator.pid();

    let (tx2, mut rx2) = event_channel(EVENT_QUEUE_CAPACITY);
    let err = h
        .orchestrator
        .start_server(h.source_str(), "18084", tx2)
        .await
        .unwrap_err();

    assert!(err.is_concurrency());
    assert!(matches!(
        err,
        ServerError::Concurrency(ConcurrencyError::AlreadyRunning)
    ));
    // The rejected request's queue was dropped without a single event
    assert!(rx2.recv().await.is_none());

    // Existing session untouched
    assert_eq!(h.orchestrator.pid(), pid);
    assert_eq!(
        h.orchestrator.status().status_text,
        "Server running on port 18083"
    );
    assert_eq!(h.builder.builds.load(Ordering::SeqCst), 1);

    h.orchestrator.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_stop_when_idle_is_rejected() {
    let h = harness(SLEEPER);

    let err = h.orchestrator.stop_server().await.unwrap_err();
    assert!(matches!(
        err,
        ServerError::Concurrency(ConcurrencyError::NotRunning)
    ));

    // Twice in a row behaves the same
    let err = h.orchestrator.stop_server().await.unwrap_err();
    assert!(err.is_concurrency());
}

#[tokio::test]
async fn test_stop_force_kills_stubborn_process() {
    let h = harness_with(STUBBORN, Arc::new(ScriptLauncher), Ok(()), |config| {
        config.shutdown_grace = Duration::from_millis(300);
    });
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18085", tx)
        .await
        .unwrap();

    // The trap must be installed before the terminate signal arrives
    recv_until(&mut rx, |e| e.message == "server reached, starting health checker").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.orchestrator.stop_server().await.unwrap();
    assert!(!h.binary().exists());

    let events = drain(&mut rx).await;
    assert_eq!(
        messages(&events),
        [
            "stopping server",
            "server didn't shutdown gracefully, force killing",
            "server process force killed",
            "cleanup successful",
            "server not running...ready",
        ]
    );
}

// ── Background teardown ────────────────────────────────────────────

#[tokio::test]
async fn test_unexpected_exit_is_detected() {
    let h = harness(CRASHER);
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18086", tx)
        .await
        .unwrap();

    let events = drain(&mut rx).await;
    let crash = events
        .iter()
        .find(|e| e.message.starts_with("server process exited unexpectedly"))
        .expect("crash should be reported");
    assert!(crash.is_error());
    assert_eq!(
        events.last().unwrap(),
        &ServerEvent::update("server not running...ready")
    );

    let status = h.orchestrator.status();
    assert!(!status.running);
    assert_eq!(status.path, h.source_str());
    assert!(status.status_text.starts_with("Server crashed:"));
    assert_eq!(h.orchestrator.state(), SessionState::Idle);
    assert!(!h.binary().exists());

    // Nothing left to stop
    assert!(h.orchestrator.stop_server().await.is_err());
}

#[tokio::test]
async fn test_session_limit_stops_server() {
    let h = harness_with(SLEEPER, Arc::new(ScriptLauncher), Ok(()), |config| {
        config.max_session = Some(Duration::from_millis(300));
    });
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18087", tx)
        .await
        .unwrap();

    let events = drain(&mut rx).await;
    let messages = messages(&events);
    let limit = messages
        .iter()
        .position(|m| *m == "session limit reached, stopping server")
        .expect("limit should be reported");
    assert_eq!(messages[limit + 1], "stopping server");
    assert_eq!(*messages.last().unwrap(), "server not running...ready");

    assert_eq!(h.orchestrator.status(), ServerStatus::idle());
    assert!(!h.binary().exists());
}

// ── Health ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unhealthy_server_still_starts() {
    let h = harness_with(
        SLEEPER,
        Arc::new(ScriptLauncher),
        Err(HealthError::Unreachable("connection refused".to_string())),
        |_| {},
    );
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18088", tx)
        .await
        .unwrap();

    let events = recv_until(&mut rx, ServerEvent::is_error).await;
    assert_eq!(
        events.last().unwrap(),
        &ServerEvent::error("cant reach server: connection refused")
    );
    assert!(h.orchestrator.status().running);

    h.orchestrator.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_healthy_updates_stop_before_shutdown() {
    let h = harness_with(SLEEPER, Arc::new(ScriptLauncher), Ok(()), |config| {
        config.health_interval = Duration::from_millis(50);
    });
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18089", tx)
        .await
        .unwrap();

    let healthy = ServerEvent::update("server healthy");
    recv_until(&mut rx, |e| *e == healthy).await;
    recv_until(&mut rx, |e| *e == healthy).await;

    h.orchestrator.stop_server().await.unwrap();

    let events = drain(&mut rx).await;
    let messages = messages(&events);
    let stopping = messages
        .iter()
        .position(|m| *m == "stopping server")
        .expect("stop should be reported");
    assert!(
        messages[..stopping]
            .iter()
            .all(|m| *m == "server healthy")
    );
    assert_eq!(
        messages[stopping..],
        [
            "stopping server",
            "server process shut down gracefully",
            "cleanup successful",
            "server not running...ready",
        ]
    );
}

// ── Abandoned calls ────────────────────────────────────────────────

#[tokio::test]
async fn test_abandoned_start_still_completes() {
    let h = harness(SLEEPER);
    h.builder.delay_ms.store(300, Ordering::SeqCst);
    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);

    let gave_up = timeout(
        Duration::from_millis(50),
        h.orchestrator.start_server(h.source_str(), "18090", tx),
    )
    .await;
    assert!(gave_up.is_err());

    // The start keeps going without its caller and lands in Running
    wait_for_state(&h.orchestrator, SessionState::Running).await;
    assert!(h.orchestrator.status().running);

    h.orchestrator.stop_server().await.unwrap();
    assert_eq!(h.orchestrator.state(), SessionState::Idle);
    assert!(!h.binary().exists());

    // And the orchestrator is usable again
    h.builder.delay_ms.store(0, Ordering::SeqCst);
    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18091", tx)
        .await
        .unwrap();
    h.orchestrator.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_abandoned_stop_still_cleans_up() {
    let h = harness_with(STUBBORN, Arc::new(ScriptLauncher), Ok(()), |config| {
        config.shutdown_grace = Duration::from_millis(300);
    });
    let (tx, mut rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18092", tx)
        .await
        .unwrap();
    recv_until(&mut rx, |e| e.message == "server reached, starting health checker").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Gives up long before the grace period ends
    let gave_up = timeout(Duration::from_millis(20), h.orchestrator.stop_server()).await;
    assert!(gave_up.is_err());

    wait_for_state(&h.orchestrator, SessionState::Idle).await;
    assert_eq!(h.orchestrator.status(), ServerStatus::idle());
    assert!(h.orchestrator.pid().is_none());
    assert!(!h.binary().exists());

    let events = drain(&mut rx).await;
    assert!(
        messages(&events).contains(&"server process force killed"),
        "kill path should still run"
    );
    assert_eq!(
        events.last().unwrap(),
        &ServerEvent::update("server not running...ready")
    );

    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18093", tx)
        .await
        .unwrap();
    h.orchestrator.stop_server().await.unwrap();
}

#[tokio::test]
async fn test_drop_removes_binary() {
    let h = harness(SLEEPER);
    let (tx, _rx) = event_channel(EVENT_QUEUE_CAPACITY);
    h.orchestrator
        .start_server(h.source_str(), "18094", tx)
        .await
        .unwrap();
    let binary = h.binary();
    assert!(binary.exists());

    let Harness {
        dir: _dir,
        orchestrator,
        ..
    } = h;
    drop(orchestrator);

    // Background tasks may hold the session for one more poll
    timeout(Duration::from_secs(5), async {
        while binary.exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("binary should be removed once the orchestrator is gone");
}
