//! Persistent store for saved requests.
//!
//! Storage schema and migrations belong to the adapter implementing this
//! trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SavedRequest;

/// Errors from a [`RequestStore`].
#[derive(Debug, Error)]
pub enum RequestStoreError {
    #[error("Request not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// CRUD access to saved requests, keyed by name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert or replace the request with the same name.
    async fn save(&self, request: &SavedRequest) -> Result<(), RequestStoreError>;

    async fn list(&self) -> Result<Vec<SavedRequest>, RequestStoreError>;

    /// Returns `RequestStoreError::NotFound` when no request has that name.
    async fn delete(&self, name: &str) -> Result<(), RequestStoreError>;
}
