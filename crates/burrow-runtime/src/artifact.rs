//! Building server sources into cached binaries.
//!
//! Binaries land in a shared cache directory under a name derived from the
//! source path (see [`burrow_core::server_binary_name`]). The name does not
//! depend on file contents, so every build overwrites the previous binary
//! for the same path.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use burrow_core::{ArtifactBuilder, BuildError, ShutdownError, server_binary_path};
use tokio::process::Command;
use tracing::{debug, info};

/// Toolchain used when none is configured.
const DEFAULT_GO_TOOLCHAIN: &str = "go";

/// Builds Go sources with `go build`.
///
/// Toolchain output goes straight to this process's stdout/stderr.
#[derive(Debug, Clone)]
pub struct GoArtifactBuilder {
    cache_dir: PathBuf,
    toolchain: String,
}

impl GoArtifactBuilder {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            toolchain: DEFAULT_GO_TOOLCHAIN.to_string(),
        }
    }

    /// Use a different toolchain executable (e.g. a pinned `go` binary).
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

#[async_trait]
impl ArtifactBuilder for GoArtifactBuilder {
    async fn build(&self, source: &Path) -> Result<PathBuf, BuildError> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| BuildError::CacheDir {
                path: self.cache_dir.clone(),
                reason: e.to_string(),
            })?;

        let binary = server_binary_path(&self.cache_dir, source);
        info!(
            source = %source.display(),
            binary = %binary.display(),
            "Building server binary"
        );

        let mut cmd = Command::new(&self.toolchain);
        cmd.arg("build")
            .arg("-o")
            .arg(&binary)
            .arg("-trimpath")
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Build from the source directory so its module is picked up
        if let Some(dir) = source.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }

        let status = cmd.status().await.map_err(|e| BuildError::Toolchain {
            program: self.toolchain.clone(),
            reason: e.to_string(),
        })?;

        if !status.success() {
            return Err(BuildError::Failed {
                status: status.to_string(),
            });
        }

        if !binary.exists() {
            return Err(BuildError::MissingOutput(binary));
        }

        debug!(binary = %binary.display(), "Build finished");
        Ok(binary)
    }
}

/// Delete a cached binary.
///
/// A binary that is already gone counts as removed, so calling this twice
/// is harmless.
pub fn remove_artifact(path: &Path) -> Result<(), ShutdownError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ShutdownError::Cleanup {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
