//! Event payload types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a [`ServerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Progress or status information.
    Update,
    /// A failure that the front end should surface.
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A single status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub kind: EventKind,
    pub message: String,
}

impl ServerEvent {
    /// Create an update event.
    pub fn update(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Update,
            message: message.into(),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
