//! Event sink trait for status notifications.
//!
//! Implementations decide the transport. Emitting must never block the
//! caller; a sink that cannot accept an event drops it.

use crate::events::ServerEvent;

/// Destination for [`ServerEvent`]s produced by background tasks.
pub trait EventSink: Send + Sync {
    /// Emit an event without blocking.
    fn emit(&self, event: ServerEvent);
}

/// A sink that discards everything. Useful in tests and headless contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: ServerEvent) {}
}
