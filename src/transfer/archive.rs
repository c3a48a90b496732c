//! Gzip tar packing and unpacking of the data directory.

use crate::error::{Result, SyncError};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Name of the single top-level entry in every data archive.
pub const ARCHIVE_ROOT: &str = "data";

/// Write `source` as a gzip tar into `out`, nested under [`ARCHIVE_ROOT`].
///
/// Symlinks are stored as links, not followed.
pub fn pack(source: &Path, out: &File) -> Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    builder.append_dir_all(ARCHIVE_ROOT, source).map_err(|e| {
        SyncError::ArchiveError(format!("failed to archive '{}': {}", source.display(), e))
    })?;

    let encoder = builder
        .into_inner()
        .map_err(|e| SyncError::ArchiveError(format!("failed to finish tar stream: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| SyncError::ArchiveError(format!("failed to finish gzip stream: {}", e)))?;

    out.sync_all()
        .map_err(|e| SyncError::IoError(format!("failed to sync archive file: {}", e)))
}

/// Extract the gzip tar at `archive_path` into the existing directory `dest`.
///
/// Entries that would land outside `dest` are skipped by `tar`.
pub fn unpack(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| {
        SyncError::IoError(format!(
            "failed to open archive '{}': {}",
            archive_path.display(),
            e
        ))
    })?;

    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    archive.unpack(dest).map_err(|e| {
        SyncError::ArchiveError(format!(
            "failed to extract archive into '{}': {}",
            dest.display(),
            e
        ))
    })
}

/// Return the extracted root directory, checking it is the only entry in `dir`.
pub fn single_root(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|e| {
        SyncError::IoError(format!("failed to read '{}': {}", dir.display(), e))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            SyncError::IoError(format!("failed to read '{}': {}", dir.display(), e))
        })?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();

    let root = dir.join(ARCHIVE_ROOT);
    if names != [ARCHIVE_ROOT] || !root.is_dir() {
        return Err(SyncError::ArchiveError(format!(
            "archive must contain exactly one top-level '{}' directory (found: {})",
            ARCHIVE_ROOT,
            if names.is_empty() {
                "nothing".to_string()
            } else {
                names.join(", ")
            }
        )));
    }

    Ok(root)
}
