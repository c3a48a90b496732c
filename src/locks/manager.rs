//! Lock check, acquisition, and release against the remote store.

use super::record::LockRecord;
use super::types::ReleaseOutcome;
use crate::error::{Result, SyncError};
use crate::storage::{CreateOutcome, LOCK_OBJECT_KEY, RemoteStore};
use bytes::Bytes;
use tracing::{debug, info, warn};

const LOCK_CONTENT_TYPE: &str = "application/json";

/// Reads and writes the `server.lock` object on behalf of one host.
#[derive(Debug)]
pub struct LockManager<'a> {
    store: &'a RemoteStore,
    hostname: String,
}

impl<'a> LockManager<'a> {
    /// Create a manager that acquires the lock as `hostname`.
    pub fn new(store: &'a RemoteStore, hostname: impl Into<String>) -> Self {
        Self {
            store,
            hostname: hostname.into(),
        }
    }

    /// Hostname recorded in locks this manager acquires.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Read the current lock.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(LockRecord))` - The lock is held
    /// * `Ok(None)` - No lock object exists
    /// * `Err(SyncError::StoreError)` - The fetch failed
    /// * `Err(SyncError::InvalidLock)` - The object exists but is not a lock record
    pub fn check_lock(&self) -> Result<Option<LockRecord>> {
        match self.store.get(LOCK_OBJECT_KEY)? {
            Some(body) => LockRecord::from_slice(&body).map(Some),
            None => Ok(None),
        }
    }

    /// Acquire the lock for this host.
    ///
    /// Fails without touching the store if a lock already exists. The write
    /// itself is create-only-if-absent, so a host that took the lock between
    /// our read and our write is reported as the holder.
    ///
    /// # Returns
    ///
    /// * `Ok(LockRecord)` - The record that was written
    /// * `Err(SyncError::LockHeld)` - Another holder owns the lock
    pub fn create_lock(&self) -> Result<LockRecord> {
        if let Some(existing) = self.check_lock()? {
            return Err(lock_held(&existing));
        }

        let record = LockRecord::new(&self.hostname);
        let body = Bytes::from(record.to_json()?);

        match self.store.create(LOCK_OBJECT_KEY, body.clone(), LOCK_CONTENT_TYPE)? {
            CreateOutcome::Created => {}
            CreateOutcome::AlreadyExists => {
                return match self.check_lock()? {
                    Some(winner) => Err(lock_held(&winner)),
                    None => Err(SyncError::StoreError(format!(
                        "'{}' changed while it was being acquired; try again",
                        LOCK_OBJECT_KEY
                    ))),
                };
            }
            CreateOutcome::Unsupported => {
                debug!("store has no conditional writes; writing lock unconditionally");
                self.store.put(LOCK_OBJECT_KEY, body, LOCK_CONTENT_TYPE)?;
            }
        }

        info!(hostname = %record.hostname, pid = ?record.pid, "lock acquired");
        Ok(record)
    }

    /// Release the lock, whoever holds it.
    ///
    /// A failed delete is logged and returned as
    /// [`ReleaseOutcome::Failed`]; it is never an error.
    pub fn release_lock(&self) -> ReleaseOutcome {
        match self.store.delete(LOCK_OBJECT_KEY) {
            Ok(()) => {
                info!("lock released");
                ReleaseOutcome::Released
            }
            Err(e) => {
                warn!(error = %e, "failed to release lock");
                ReleaseOutcome::Failed(e.to_string())
            }
        }
    }
}

fn lock_held(existing: &LockRecord) -> SyncError {
    SyncError::LockHeld {
        hostname: existing.hostname.clone(),
        since: existing.since(),
        age: existing.age_string(),
    }
}
