//! Health probe port.

use async_trait::async_trait;

use super::HealthError;

/// Single-shot health check against a server endpoint.
///
/// Implementations bound each probe with their own timeout. Only an HTTP 200
/// counts as healthy.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), HealthError>;
}
