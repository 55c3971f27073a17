//! HTTP request executor port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{HttpResponse, SavedRequest};

#[derive(Debug, Error)]
pub enum RequestExecutorError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Sends a normalized request and returns the raw response.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn send(&self, request: &SavedRequest) -> Result<HttpResponse, RequestExecutorError>;
}
