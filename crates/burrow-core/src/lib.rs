//! Core domain types and ports for burrow.
//!
//! This crate holds what the local server orchestrator and its front ends
//! share: session types, the event queue, the error taxonomy, the
//! `ServerService` capability boundary, cache paths and settings. Process
//! and HTTP adapters live in `burrow-runtime`.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    HttpResponse, IDLE_STATUS_TEXT, SavedRequest, ServerSpec, ServerStatus, SessionState,
    health_url_for,
};
pub use events::{
    EVENT_QUEUE_CAPACITY, EventKind, ServerEvent, ServerEventReceiver, ServerEventSender,
    event_channel,
};
pub use ports::{
    ArtifactBuilder, BuildError, ConcurrencyError, EventSink, FakeServerService, HealthError,
    HealthProbe, LaunchError, NoopEventSink, RequestExecutor, RequestStore, ServerError,
    ServerService, ShutdownError, ValidationError,
};
pub use settings::{Settings, SettingsError, validate_port, validate_settings};

pub use paths::{
    PathError, cache_root, clear_server_cache, config_path, server_binary_name,
    server_binary_path, server_cache_dir,
};
