//! Server lifecycle events delivered to front ends.
//!
//! Events flow one way: internal tasks push them onto a bounded queue and a
//! single consumer drains it. See [`bus`] for the drop policy.

pub mod bus;
mod server;

pub use bus::{EVENT_QUEUE_CAPACITY, ServerEventReceiver, ServerEventSender, event_channel};
pub use server::{EventKind, ServerEvent};
