//! Artifact builder port.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::BuildError;

/// Compiles a validated source file into an executable binary.
///
/// Implementations write into a shared cache and must name the output
/// deterministically from the source path, so rebuilding the same path
/// reuses the same file.
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Build `source` and return the path of the produced binary.
    async fn build(&self, source: &Path) -> Result<PathBuf, BuildError>;
}
