//! Artifact cache locations and cache keys.
//!
//! The cache key is derived from the literal source path string, not from
//! the file contents. Editing a source file in place and restarting reuses
//! the same binary name; the builder overwrites it on every build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::PathError;

/// File name prefix shared by every cached server binary.
pub const SERVER_BINARY_PREFIX: &str = "burrow-server-";

/// Root of the burrow cache.
///
/// Resolution order:
/// 1. `BURROW_CACHE_DIR` environment variable
/// 2. Platform cache directory (e.g., `~/.cache/burrow`)
pub fn cache_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = std::env::var("BURROW_CACHE_DIR") {
        return Ok(PathBuf::from(path));
    }

    dirs::cache_dir()
        .map(|dir| dir.join("burrow"))
        .ok_or(PathError::NoCacheDir)
}

/// Directory holding built server binaries.
pub fn server_cache_dir() -> Result<PathBuf, PathError> {
    Ok(cache_root()?.join("servers"))
}

/// Deterministic binary name for a source path.
pub fn server_binary_name(source: &Path) -> String {
    let digest = Sha256::digest(source.as_os_str().as_encoded_bytes());
    let key: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{SERVER_BINARY_PREFIX}{key}")
}

/// Location of the cached binary for `source` inside `cache_dir`.
pub fn server_binary_path(cache_dir: &Path, source: &Path) -> PathBuf {
    cache_dir.join(server_binary_name(source))
}

/// Remove every cached server binary in `cache_dir`.
///
/// Returns the number of files removed. A missing directory counts as empty.
pub fn clear_server_cache(cache_dir: &Path) -> Result<usize, PathError> {
    let entries = match fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(clean_failed(cache_dir, &e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| clean_failed(cache_dir, &e))?;
        let is_binary = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(SERVER_BINARY_PREFIX));
        if !is_binary {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(clean_failed(&entry.path(), &e)),
        }
    }

    debug!(path = %cache_dir.display(), removed, "Cleared server cache");
    Ok(removed)
}

fn clean_failed(path: &Path, err: &io::Error) -> PathError {
    PathError::CleanFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
