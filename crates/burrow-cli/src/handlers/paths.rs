//! Paths command handler.
//!
//! Displays the resolved config and cache locations for diagnostics.

use anyhow::Result;
use burrow_core::{cache_root, config_path};

use crate::bootstrap::CliContext;

/// Print every path burrow reads or writes, in `key = value` format.
pub fn execute(ctx: &CliContext) -> Result<()> {
    println!("config_file = {}", config_path()?.display());
    println!("cache_root = {}", cache_root()?.display());
    println!("server_cache = {}", ctx.cache_dir.display());
    Ok(())
}
