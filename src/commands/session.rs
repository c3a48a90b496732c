//! Composite commands run around a server session.
//!
//! `init` runs before the game server starts and `shutdown` after it stops.

use super::{cmd_download, cmd_lock, cmd_unlock, cmd_upload};
use crate::context::SyncContext;
use crate::error::Result;

/// Acquire the lock, then download data.
///
/// If the lock is held elsewhere the download never runs.
pub fn cmd_init(ctx: &SyncContext) -> Result<()> {
    println!("Initializing server sync...");
    cmd_lock(ctx)?;
    cmd_download(ctx)?;
    println!("Sync initialization complete");
    Ok(())
}

/// Upload data, then release the lock.
///
/// If the upload fails the lock stays held, so the next `init` refuses to
/// start from stale data. A failed release only warns.
pub fn cmd_shutdown(ctx: &SyncContext) -> Result<()> {
    println!("Shutting down server sync...");
    cmd_upload(ctx)?;
    cmd_unlock(ctx);
    println!("Sync shutdown complete");
    Ok(())
}
