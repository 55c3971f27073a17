//! CLI-specific error types and exit codes.

use burrow_core::{PathError, ServerError, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or source path the user can fix.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Settings file or environment override is broken.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure outside the server lifecycle.
    #[error("IO error: {0}")]
    Io(String),

    /// Build, launch or lifecycle failure.
    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Map error to an exit code, following sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Io(_) => 74,       // EX_IOERR
            Self::Server(_) => 71,   // EX_OSERR
        }
    }
}

impl From<ServerError> for CliError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Validation(_) => Self::Arguments(err.to_string()),
            ServerError::Build(_) | ServerError::Launch(_) | ServerError::Concurrency(_) => {
                Self::Server(err.to_string())
            }
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::InvalidPort(_) => Self::Arguments(err.to_string()),
            _ => Self::Config(err.to_string()),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::NoCacheDir | PathError::NoConfigDir => Self::Config(err.to_string()),
            PathError::CleanFailed { .. } => Self::Io(err.to_string()),
        }
    }
}
