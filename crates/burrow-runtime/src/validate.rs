//! Source path validation.
//!
//! Resolves a user-supplied path to an absolute location and checks that it
//! names a buildable source file. Pure and synchronous apart from a single
//! metadata lookup.

use std::path::{Path, PathBuf};

use burrow_core::ValidationError;

/// Suffix of Go source files, the only sources the default builder handles.
pub const GO_SOURCE_EXTENSION: &str = "go";

/// Validates paths before they are handed to an artifact builder.
#[derive(Debug, Clone)]
pub struct PathValidator {
    extension: String,
}

impl PathValidator {
    /// Accept files ending in `.{extension}`.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Resolve `raw` to an absolute path and check it exists with the
    /// expected suffix.
    ///
    /// A leading `~` expands to the home directory. Existence is checked
    /// before the suffix, so a missing `notes.txt` reports `NotExist`.
    pub fn validate(&self, raw: &str) -> Result<PathBuf, ValidationError> {
        let path = resolve(raw)?;

        if std::fs::metadata(&path).is_err() {
            return Err(ValidationError::NotExist(path));
        }

        if !self.has_expected_extension(&path) {
            return Err(ValidationError::WrongExtension {
                path,
                expected: self.extension.clone(),
            });
        }

        Ok(path)
    }

    fn has_expected_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new(GO_SOURCE_EXTENSION)
    }
}

fn resolve(raw: &str) -> Result<PathBuf, ValidationError> {
    let trimmed = raw.trim();
    let resolve_failed = |reason: String| ValidationError::Resolve {
        path: PathBuf::from(trimmed),
        reason,
    };

    let expanded = if trimmed == "~" || trimmed.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| resolve_failed("no home directory".into()))?;
        home.join(trimmed.trim_start_matches('~').trim_start_matches('/'))
    } else if trimmed.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(trimmed)
    };

    std::path::absolute(&expanded).map_err(|e| resolve_failed(e.to_string()))
}
