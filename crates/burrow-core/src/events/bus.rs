//! Bounded, non-blocking event queue.
//!
//! Producers never wait on the consumer: when the queue is full the new
//! event is dropped and logged. The queue is never unbounded, so a stuck
//! front end cannot grow memory without limit.

use tokio::sync::mpsc;
use tracing::warn;

use super::ServerEvent;
use crate::ports::EventSink;

/// Default queue capacity for server events.
pub const EVENT_QUEUE_CAPACITY: usize = 30;

/// Receiving half, owned by the front end.
pub type ServerEventReceiver = mpsc::Receiver<ServerEvent>;

/// Create a bounded event queue with the given capacity.
///
/// A capacity of zero is raised to one, the smallest queue tokio allows.
pub fn event_channel(capacity: usize) -> (ServerEventSender, ServerEventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ServerEventSender { tx }, rx)
}

/// Sending half of the event queue.
///
/// Cloning is cheap; all clones feed the same consumer.
#[derive(Debug, Clone)]
pub struct ServerEventSender {
    tx: mpsc::Sender<ServerEvent>,
}

impl ServerEventSender {
    /// Push an event without blocking.
    ///
    /// Returns `false` if the event was dropped because the queue was full
    /// or the receiver is gone.
    pub fn try_emit(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(message = %event.message, "Event queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Whether the receiving half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventSink for ServerEventSender {
    fn emit(&self, event: ServerEvent) {
        let _ = self.try_emit(event);
    }
}
