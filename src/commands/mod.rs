//! Command implementations for worldsync.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each command is a fixed, linear sequence of lock and
//! transfer calls; status lines go to stdout.

mod session;


use crate::backup::{BackupEntry, BackupOutcome};
use crate::cli::Command;
use crate::context::SyncContext;
use crate::error::{Result, with_age};
use crate::locks::{LockRecord, ReleaseOutcome};
use crate::transfer::{DownloadOutcome, UploadOutcome};

pub use session::{cmd_init, cmd_shutdown};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command, ctx: &SyncContext) -> Result<()> {
    match command {
        Command::Init => cmd_init(ctx),
        Command::Shutdown => cmd_shutdown(ctx),
        Command::Download => cmd_download(ctx).map(|_| ()),
        Command::Upload => cmd_upload(ctx).map(|_| ()),
        Command::Lock => cmd_lock(ctx).map(|_| ()),
        Command::Unlock => {
            cmd_unlock(ctx);
            Ok(())
        }
        Command::CheckLock => cmd_check_lock(ctx).map(|_| ()),
        Command::Backup => cmd_backup(ctx).map(|_| ()),
        Command::ListBackups => cmd_list_backups(ctx).map(|_| ()),
    }
}

/// Acquire the server lock for this host.
pub fn cmd_lock(ctx: &SyncContext) -> Result<LockRecord> {
    let record = ctx.lock_manager().create_lock()?;
    println!("Lock acquired by {}", record.hostname);
    Ok(record)
}

/// Release the server lock. Never fails.
pub fn cmd_unlock(ctx: &SyncContext) -> ReleaseOutcome {
    let outcome = ctx.lock_manager().release_lock();
    match &outcome {
        ReleaseOutcome::Released => println!("Lock released"),
        ReleaseOutcome::Failed(reason) => {
            println!("Warning: could not release lock: {}", reason)
        }
    }
    outcome
}

/// Print the current lock holder, if any.
pub fn cmd_check_lock(ctx: &SyncContext) -> Result<Option<LockRecord>> {
    let lock = ctx.lock_manager().check_lock()?;
    println!("{}", describe_lock(lock.as_ref()));
    Ok(lock)
}

/// Replace the local data directory with the bucket's archive.
pub fn cmd_download(ctx: &SyncContext) -> Result<DownloadOutcome> {
    println!("Downloading server data...");
    let outcome = ctx.data_sync().download_data()?;
    match &outcome {
        DownloadOutcome::Restored { path, .. } => {
            println!("Server data downloaded and extracted to {}", path.display())
        }
        DownloadOutcome::NoRemoteData => {
            println!("No existing server data in the bucket. Starting with a fresh server.")
        }
    }
    Ok(outcome)
}

/// Upload the local data directory to the bucket.
pub fn cmd_upload(ctx: &SyncContext) -> Result<UploadOutcome> {
    let outcome = ctx.data_sync().upload_data()?;
    match &outcome {
        UploadOutcome::Uploaded { bytes } => {
            println!("Server data uploaded ({})", format_bytes(*bytes))
        }
        UploadOutcome::MissingLocalDir(path) => {
            println!("Warning: data directory not found at {}", path.display())
        }
    }
    Ok(outcome)
}

/// Upload a backup, then prune old ones.
///
/// A failed prune is reported as a warning; the new backup stands.
pub fn cmd_backup(ctx: &SyncContext) -> Result<BackupOutcome> {
    println!("Creating backup...");
    let backups = ctx.backups();
    let outcome = backups.create_backup()?;
    match &outcome {
        BackupOutcome::Created { key, bytes } => {
            println!("Backup uploaded: {} ({})", key, format_bytes(*bytes));
            match backups.rotate_backups() {
                Ok(deleted) => {
                    for key in deleted {
                        println!("Deleted old backup: {}", key);
                    }
                }
                Err(e) => println!("Warning: could not rotate backups: {}", e),
            }
        }
        BackupOutcome::MissingLocalDir(path) => {
            println!("Warning: data directory not found at {}", path.display())
        }
    }
    Ok(outcome)
}

/// Print the backups in the bucket, newest first.
pub fn cmd_list_backups(ctx: &SyncContext) -> Result<Vec<BackupEntry>> {
    let backups = ctx.backups().list_backups()?;
    println!("{}", describe_backups(&backups));
    Ok(backups)
}

/// Render the backup list for `list-backups`.
pub(crate) fn describe_backups(backups: &[BackupEntry]) -> String {
    if backups.is_empty() {
        return "No backups found".to_string();
    }
    let mut out = String::from("Backups (newest first):");
    for (idx, entry) in backups.iter().rev().enumerate() {
        out.push_str(&format!(
            "\n  {}. {}\n     Size: {} | Created: {}",
            idx + 1,
            entry.key,
            format_bytes(entry.size),
            entry.last_modified.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    out
}

/// Render lock status for `check-lock`.
pub(crate) fn describe_lock(lock: Option<&LockRecord>) -> String {
    match lock {
        Some(record) => {
            let mut out = format!(
                "Server is locked\n  Hostname: {}\n  Since:    {}",
                record.hostname,
                with_age(&record.since(), record.age_string().as_deref())
            );
            if let Some(pid) = record.pid {
                out.push_str(&format!("\n  PID:      {}", pid));
            }
            out
        }
        None => "Server is not locked".to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
