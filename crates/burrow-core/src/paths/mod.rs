//! Path utilities for burrow cache and configuration locations.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - Environment overrides take precedence over platform directories
//! - No terminal I/O - adapters report paths to users themselves

mod cache;
mod config;
mod error;

pub use cache::{
    SERVER_BINARY_PREFIX, cache_root, clear_server_cache, server_binary_name, server_binary_path,
    server_cache_dir,
};
pub use config::{config_dir, config_path};
pub use error::PathError;
