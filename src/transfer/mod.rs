//! Whole-directory transfer between the local data directory and the bucket.
//!
//! Every upload packs the entire directory into one gzip tar stored at
//! `server-data.tar.gz`, overwriting the previous archive. Every download
//! replaces the local directory with the archive's contents; nothing is
//! merged. The archive's single root entry is always `data`, so a download
//! restores to `<parent>/data` whatever the configured directory is called.
//!
//! Temporary archive files and staging directories are created next to the
//! data directory and removed when the operation ends, successful or not.

mod archive;


pub use archive::ARCHIVE_ROOT;

use crate::error::{Result, SyncError};
use crate::fs::{remove_dir_if_exists, replace_dir};
use crate::storage::{ARCHIVE_OBJECT_KEY, RemoteStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of [`DataSync::download_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The remote archive was extracted to `path`.
    Restored { path: PathBuf, bytes: u64 },
    /// There is no remote archive yet; nothing was changed locally.
    NoRemoteData,
}

/// Result of [`DataSync::upload_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The archive was uploaded.
    Uploaded { bytes: u64 },
    /// The local data directory does not exist; nothing was uploaded.
    MissingLocalDir(PathBuf),
}

/// Moves the local data directory to and from the bucket.
#[derive(Debug)]
pub struct DataSync<'a> {
    store: &'a RemoteStore,
    local_dir: PathBuf,
}

impl<'a> DataSync<'a> {
    pub fn new(store: &'a RemoteStore, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            local_dir: local_dir.into(),
        }
    }

    /// The configured local data directory.
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Where a download lands: the archive root name under the data
    /// directory's parent.
    pub fn restore_dir(&self) -> PathBuf {
        self.parent_dir().join(ARCHIVE_ROOT)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.local_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Replace the local data directory with the remote archive.
    ///
    /// # Returns
    ///
    /// * `Ok(DownloadOutcome::Restored)` - The archive was extracted in place
    /// * `Ok(DownloadOutcome::NoRemoteData)` - No archive exists; first run
    /// * `Err(_)` - Any store, archive, or filesystem failure; the local
    ///   directory keeps its previous contents
    pub fn download_data(&self) -> Result<DownloadOutcome> {
        let Some(meta) = self.store.head(ARCHIVE_OBJECT_KEY)? else {
            info!(key = ARCHIVE_OBJECT_KEY, "no remote archive");
            return Ok(DownloadOutcome::NoRemoteData);
        };
        debug!(size = meta.size, modified = %meta.last_modified, "remote archive found");

        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| {
            SyncError::IoError(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;

        let mut archive_file = tempfile::Builder::new()
            .prefix(".server-data.")
            .suffix(".tar.gz")
            .tempfile_in(&parent)
            .map_err(|e| temp_error(&parent, e))?;
        let bytes = self
            .store
            .download_to(ARCHIVE_OBJECT_KEY, archive_file.as_file_mut())?;

        let staging = tempfile::Builder::new()
            .prefix(".data-staging.")
            .tempdir_in(&parent)
            .map_err(|e| temp_error(&parent, e))?;
        archive::unpack(archive_file.path(), staging.path())?;
        let staged_root = archive::single_root(staging.path())?;

        let restore_dir = self.restore_dir();
        replace_dir(&staged_root, &restore_dir)?;

        // The configured directory only goes once the restored copy is in place
        if self.local_dir.file_name() != restore_dir.file_name() {
            warn!(
                configured = %self.local_dir.display(),
                restored = %restore_dir.display(),
                "archive root differs from configured directory name"
            );
            remove_dir_if_exists(&self.local_dir)?;
        }

        info!(path = %restore_dir.display(), bytes, "restored data directory");
        Ok(DownloadOutcome::Restored {
            path: restore_dir,
            bytes,
        })
    }

    /// Upload the local data directory as the remote archive.
    ///
    /// # Returns
    ///
    /// * `Ok(UploadOutcome::Uploaded)` - The archive replaced the remote copy
    /// * `Ok(UploadOutcome::MissingLocalDir)` - Nothing to upload
    /// * `Err(_)` - Any archive, filesystem, or store failure
    pub fn upload_data(&self) -> Result<UploadOutcome> {
        if !self.local_dir.exists() {
            warn!(path = %self.local_dir.display(), "data directory not found; skipping upload");
            return Ok(UploadOutcome::MissingLocalDir(self.local_dir.clone()));
        }

        let bytes = self.upload_archive(ARCHIVE_OBJECT_KEY)?;

        info!(path = %self.local_dir.display(), bytes, "uploaded data directory");
        Ok(UploadOutcome::Uploaded { bytes })
    }

    /// Pack the local data directory and upload it to `key`.
    ///
    /// The caller checks that the directory exists. Returns the archive size.
    pub(crate) fn upload_archive(&self, key: &str) -> Result<u64> {
        let parent = self.parent_dir();
        let archive_file = tempfile::Builder::new()
            .prefix(".server-data.")
            .suffix(".tar.gz")
            .tempfile_in(&parent)
            .map_err(|e| temp_error(&parent, e))?;

        archive::pack(&self.local_dir, archive_file.as_file())?;
        let bytes = self.store.upload_from(archive_file.path(), key)?;

        archive_file.close().map_err(|e| {
            SyncError::IoError(format!("failed to remove temporary archive: {}", e))
        })?;
        Ok(bytes)
    }
}

fn temp_error(dir: &Path, e: std::io::Error) -> SyncError {
    SyncError::IoError(format!(
        "failed to create temporary file in '{}': {}",
        dir.display(),
        e
    ))
}
