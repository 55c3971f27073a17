//! Configuration file location.

use std::path::PathBuf;

use super::error::PathError;

/// Directory holding `config.yaml`.
///
/// `BURROW_CONFIG_DIR` overrides the platform config directory.
pub fn config_dir() -> Result<PathBuf, PathError> {
    if let Ok(path) = std::env::var("BURROW_CONFIG_DIR") {
        return Ok(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|dir| dir.join("burrow"))
        .ok_or(PathError::NoConfigDir)
}

/// Full path of the YAML configuration file.
pub fn config_path() -> Result<PathBuf, PathError> {
    Ok(config_dir()?.join("config.yaml"))
}
