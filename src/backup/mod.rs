//! Timestamped backups of the data directory.
//!
//! Backups live under `backups/` in the sync bucket, one gzip tar per run,
//! packed exactly like the sync archive (single `data` root). They never
//! touch `server.lock` or `server-data.tar.gz`. After each new backup only
//! the newest [`MAX_BACKUPS`] are kept.


use crate::error::Result;
use crate::storage::RemoteStore;
use crate::transfer::DataSync;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

/// Key prefix of backup archives.
pub const BACKUP_PREFIX: &str = "backups/";

/// Number of backups kept by [`Backups::rotate_backups`].
pub const MAX_BACKUPS: usize = 3;

const BACKUP_SUFFIX: &str = ".tar.gz";

/// One backup archive in the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Result of [`Backups::create_backup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new backup was uploaded at `key`.
    Created { key: String, bytes: u64 },
    /// The local data directory does not exist; nothing was uploaded.
    MissingLocalDir(PathBuf),
}

/// Creates, lists, and prunes backups of one data directory.
#[derive(Debug)]
pub struct Backups<'a> {
    store: &'a RemoteStore,
    sync: DataSync<'a>,
}

impl<'a> Backups<'a> {
    pub fn new(store: &'a RemoteStore, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            sync: DataSync::new(store, local_dir),
        }
    }

    /// Upload a backup named after the current time.
    pub fn create_backup(&self) -> Result<BackupOutcome> {
        self.create_backup_at(Utc::now())
    }

    pub(crate) fn create_backup_at(&self, now: DateTime<Utc>) -> Result<BackupOutcome> {
        let local_dir = self.sync.local_dir();
        if !local_dir.exists() {
            warn!(path = %local_dir.display(), "data directory not found; skipping backup");
            return Ok(BackupOutcome::MissingLocalDir(local_dir.to_path_buf()));
        }

        let key = backup_key(now);
        let bytes = self.sync.upload_archive(&key)?;

        info!(key = %key, bytes, "backup uploaded");
        Ok(BackupOutcome::Created { key, bytes })
    }

    /// Every backup archive, oldest first.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        let mut backups: Vec<BackupEntry> = self
            .store
            .list(BACKUP_PREFIX)?
            .into_iter()
            .map(|meta| BackupEntry {
                key: meta.location.to_string(),
                size: meta.size as u64,
                last_modified: meta.last_modified,
            })
            .filter(|entry| entry.key.ends_with(BACKUP_SUFFIX))
            .collect();

        backups.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(backups)
    }

    /// Delete all but the newest [`MAX_BACKUPS`] backups.
    ///
    /// Returns the keys that were deleted, oldest first.
    pub fn rotate_backups(&self) -> Result<Vec<String>> {
        let backups = self.list_backups()?;
        let excess = backups.len().saturating_sub(MAX_BACKUPS);

        let mut deleted = Vec::with_capacity(excess);
        for entry in backups.into_iter().take(excess) {
            self.store.delete(&entry.key)?;
            info!(key = %entry.key, "deleted old backup");
            deleted.push(entry.key);
        }
        Ok(deleted)
    }
}

/// Object key of a backup taken at `at`.
pub fn backup_key(at: DateTime<Utc>) -> String {
    format!(
        "{}backup-{}{}",
        BACKUP_PREFIX,
        at.format("%Y%m%d-%H%M%S"),
        BACKUP_SUFFIX
    )
}
