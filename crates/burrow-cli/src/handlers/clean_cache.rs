//! Clean-cache command handler.

use anyhow::Result;
use burrow_core::clear_server_cache;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Remove every cached server binary.
///
/// Refuses to run while a server is active, since its binary lives in the
/// same directory.
pub fn execute(ctx: &CliContext) -> Result<()> {
    if ctx.service().status().running {
        return Err(CliError::Arguments("a server is running, stop it first".to_string()).into());
    }

    let removed = clear_server_cache(&ctx.cache_dir).map_err(CliError::from)?;
    info!(removed, dir = %ctx.cache_dir.display(), "Cleared server cache");
    println!(
        "Removed {removed} cached binar{} from {}",
        if removed == 1 { "y" } else { "ies" },
        ctx.cache_dir.display()
    );
    Ok(())
}
