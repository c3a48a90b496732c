//! Directory swap for worldsync.
//!
//! # Implementation Strategy
//!
//! Replacing `target` with a fully built `staged` tree:
//! 1. Rename the current `target` aside to `.{name}.old-{pid}`
//! 2. Rename `staged` to `target`
//! 3. Remove the set-aside tree
//!
//! If step 2 fails, the set-aside tree is renamed back. `staged` and
//! `target` must share a parent directory so every rename stays on one
//! filesystem and is atomic.
//!
//! A `target` that is a mount point (a container volume, for example) cannot
//! be renamed. It is kept instead: its entries are deleted and the staged
//! entries moved into it. That path is not atomic, and entries that cross
//! filesystems are copied.

use crate::error::{Result, SyncError};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Replace `target` (file, directory, or nothing) with the directory `staged`.
///
/// # Returns
///
/// * `Ok(())` - `target` now holds what was at `staged`
/// * `Err(SyncError::IoError)` - The swap failed; `target` holds its original content
pub fn replace_dir<P: AsRef<Path>, Q: AsRef<Path>>(staged: P, target: Q) -> Result<()> {
    let staged = staged.as_ref();
    let target = target.as_ref();

    if is_mount_point(target) {
        debug!(path = %target.display(), "target is a mount point; replacing its contents");
        return replace_contents(staged, target);
    }

    let backup = if target.symlink_metadata().is_ok() {
        let backup = backup_path(target)?;
        remove_dir_if_exists(&backup)?;
        match fs::rename(target, &backup) {
            Ok(()) => Some(backup),
            Err(e) if e.kind() == io::ErrorKind::ResourceBusy && target.is_dir() => {
                debug!(path = %target.display(), "target is busy; replacing its contents");
                return replace_contents(staged, target);
            }
            Err(e) => {
                return Err(SyncError::IoError(format!(
                    "failed to move '{}' aside to '{}': {}",
                    target.display(),
                    backup.display(),
                    e
                )));
            }
        }
    } else {
        None
    };

    if let Err(e) = fs::rename(staged, target) {
        if let Some(backup) = &backup
            && let Err(restore_err) = fs::rename(backup, target)
        {
            return Err(SyncError::IoError(format!(
                "failed to move '{}' into place: {}; restoring the previous copy also failed, it is at '{}': {}",
                staged.display(),
                e,
                backup.display(),
                restore_err
            )));
        }
        return Err(SyncError::IoError(format!(
            "failed to move '{}' into place at '{}': {}",
            staged.display(),
            target.display(),
            e
        )));
    }

    sync_parent(target);

    if let Some(backup) = backup
        && let Err(e) = remove_dir_if_exists(&backup)
    {
        warn!(path = %backup.display(), error = %e, "left previous data copy behind");
    }

    Ok(())
}

/// Replace the entries of the directory `target` with those of `staged`,
/// keeping `target` itself. `staged` is removed afterwards.
pub fn replace_contents<P: AsRef<Path>, Q: AsRef<Path>>(staged: P, target: Q) -> Result<()> {
    let staged = staged.as_ref();
    let target = target.as_ref();

    for entry in read_entries(target)? {
        remove_dir_if_exists(&entry)?;
    }
    for entry in read_entries(staged)? {
        let name = entry.file_name().ok_or_else(|| {
            SyncError::IoError(format!("invalid entry path '{}'", entry.display()))
        })?;
        move_entry(&entry, &target.join(name))?;
    }
    remove_dir_if_exists(staged)?;

    if let Ok(dir) = File::open(target) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Remove a directory tree (or a single file) if anything exists at `path`.
pub fn remove_dir_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(SyncError::IoError(format!(
                "failed to inspect '{}': {}",
                path.display(),
                e
            )));
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|e| SyncError::IoError(format!("failed to remove '{}': {}", path.display(), e)))
}

fn read_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| SyncError::IoError(format!("failed to read '{}': {}", dir.display(), e)))?;
    entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| SyncError::IoError(format!("failed to read '{}': {}", dir.display(), e)))
}

/// Rename `source` to `destination`, copying and deleting when they are on
/// different filesystems.
fn move_entry(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_rename(&e) => {
            copy_tree(source, destination).map_err(|copy_err| {
                SyncError::IoError(format!(
                    "failed to copy '{}' to '{}': {} (original rename error: {})",
                    source.display(),
                    destination.display(),
                    copy_err,
                    e
                ))
            })?;
            remove_dir_if_exists(source)
        }
        Err(e) => Err(SyncError::IoError(format!(
            "failed to move '{}' to '{}': {}",
            source.display(),
            destination.display(),
            e
        ))),
    }
}

fn is_cross_device_rename(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices || err.raw_os_error() == Some(18)
}

/// Recursively copy a file, symlink, or directory tree.
fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = source.symlink_metadata()?;
    if metadata.is_dir() {
        fs::create_dir(destination)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_tree(&entry.path(), &destination.join(entry.file_name()))?;
        }
        fs::set_permissions(destination, metadata.permissions())
    } else if metadata.file_type().is_symlink() {
        copy_symlink(source, destination)
    } else {
        fs::copy(source, destination).map(|_| ())
    }
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(source)?, destination)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination).map(|_| ())
}

/// Whether `target` is a directory on a different device than its parent.
#[cfg(unix)]
fn is_mount_point(target: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Ok(metadata) = target.symlink_metadata() else {
        return false;
    };
    if !metadata.is_dir() {
        return false;
    }
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent
        .metadata()
        .map(|parent| parent.dev() != metadata.dev())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_mount_point(_target: &Path) -> bool {
    false
}

/// Generate the set-aside path next to `target`.
fn backup_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SyncError::IoError(format!("invalid directory path '{}'", target.display())))?;

    Ok(parent.join(format!(".{}.old-{}", name, std::process::id())))
}

/// Persist the directory entries changed by the renames.
fn sync_parent(target: &Path) {
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
}
