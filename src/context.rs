//! Per-invocation context for worldsync commands.
//!
//! Bundles the configuration, the remote store handle, and this host's
//! identity. Built once in `main` and passed by reference to every command,
//! which borrow lock and transfer components from it.

use crate::backup::Backups;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::locks::{LockManager, local_hostname};
use crate::storage::RemoteStore;
use crate::transfer::DataSync;

/// Everything a command needs to talk to the bucket and the local disk.
#[derive(Debug)]
pub struct SyncContext {
    /// Settings loaded at startup.
    pub config: SyncConfig,

    /// Handle to the configured bucket.
    pub store: RemoteStore,

    /// Identity written into locks acquired by this process.
    pub hostname: String,
}

impl SyncContext {
    /// Connect to the bucket described by `config`.
    pub fn connect(config: SyncConfig) -> Result<Self> {
        let store = RemoteStore::connect(&config)?;
        Ok(Self::with_store(config, store, local_hostname()))
    }

    /// Build a context around an already constructed store.
    pub fn with_store(config: SyncConfig, store: RemoteStore, hostname: impl Into<String>) -> Self {
        Self {
            config,
            store,
            hostname: hostname.into(),
        }
    }

    /// Lock manager acting as this host.
    pub fn lock_manager(&self) -> LockManager<'_> {
        LockManager::new(&self.store, self.hostname.clone())
    }

    /// Transfer component for the configured data directory.
    pub fn data_sync(&self) -> DataSync<'_> {
        DataSync::new(&self.store, self.config.local_data_dir.clone())
    }

    /// Backups of the configured data directory.
    pub fn backups(&self) -> Backups<'_> {
        Backups::new(&self.store, self.config.local_data_dir.clone())
    }
}
