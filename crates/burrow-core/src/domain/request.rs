//! Saved HTTP request types exchanged with the request collaborators.
//!
//! Building and normalizing requests happens in the front end; these types
//! only carry the already-normalized values across the port boundary.

use serde::{Deserialize, Serialize};

/// A named request persisted by a [`crate::ports::RequestStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRequest {
    pub name: String,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Response produced by a [`crate::ports::RequestExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Round-trip time in milliseconds.
    pub elapsed_ms: u64,
}
