//! Error types for the worldsync CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use crate::storage::LOCK_OBJECT_KEY;
use thiserror::Error;

/// Main error type for worldsync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// One or more required environment variables are unset or empty.
    #[error(
        "missing required environment variables: {}\nPlease check your .env file",
        .0.join(", ")
    )]
    MissingConfig(Vec<String>),

    /// A configuration value is present but unusable.
    #[error("{0}")]
    UserError(String),

    /// Another host already holds the server lock.
    #[error(
        "server is already running!\n   Locked by: {hostname}\n   Since: {}\n\nIf you're sure no server is running, manually delete '{key}' from the bucket",
        with_age(.since, .age.as_deref()),
        key = LOCK_OBJECT_KEY
    )]
    LockHeld {
        hostname: String,
        since: String,
        /// Unknown when the holder's timestamp could not be read.
        age: Option<String>,
    },

    /// The lock object exists but its body is not a lock record.
    #[error("invalid lock object: {0}")]
    InvalidLock(String),

    /// Object store request failed for a reason other than a missing object.
    #[error("object store request failed: {0}")]
    StoreError(String),

    /// Packing or unpacking the data archive failed.
    #[error("archive error: {0}")]
    ArchiveError(String),

    /// Local filesystem operation failed.
    #[error("{0}")]
    IoError(String),
}

impl SyncError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::MissingConfig(_)
            | SyncError::UserError(_)
            | SyncError::LockHeld { .. }
            | SyncError::InvalidLock(_)
            | SyncError::StoreError(_)
            | SyncError::ArchiveError(_)
            | SyncError::IoError(_) => exit_codes::FAILURE,
        }
    }
}

/// `since` followed by the age in parentheses, when the age is known.
pub(crate) fn with_age(since: &str, age: Option<&str>) -> String {
    match age {
        Some(age) => format!("{} ({} ago)", since, age),
        None => since.to_string(),
    }
}

/// Result type alias for worldsync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
