//! Path-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution and cache maintenance.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the platform cache directory.
    #[error("Cannot determine system cache directory")]
    NoCacheDir,

    /// Could not determine the platform configuration directory.
    #[error("Cannot determine system config directory")]
    NoConfigDir,

    /// Failed to list or remove cache entries.
    #[error("Failed to clean cache directory {path}: {reason}")]
    CleanFailed { path: PathBuf, reason: String },
}
