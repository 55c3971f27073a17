//! Domain types for burrow.
//!
//! Pure data with no infrastructure dependencies.

mod request;
mod server;

pub use request::{HttpResponse, SavedRequest};
pub use server::{IDLE_STATUS_TEXT, ServerSpec, ServerStatus, SessionState, health_url_for};
