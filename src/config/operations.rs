//! Config loading and validation.

use super::model::SyncConfig;
use super::types::*;
use crate::error::{Result, SyncError};
use std::path::PathBuf;

impl SyncConfig {
    /// Load config from the process environment.
    ///
    /// Callers that want `.env` support load it before calling this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// Empty values count as missing. All missing required variables are
    /// reported together.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncConfig)` - All required variables present and valid
    /// * `Err(SyncError::MissingConfig)` - One or more required variables absent
    /// * `Err(SyncError::UserError)` - A value is present but unusable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|&name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::MissingConfig(missing));
        }

        let required = |name: &str| get(name).unwrap_or_default();

        let config = SyncConfig {
            account_id: required(ENV_ACCOUNT_ID),
            access_key_id: required(ENV_ACCESS_KEY_ID),
            secret_access_key: required(ENV_SECRET_ACCESS_KEY),
            bucket: required(ENV_BUCKET_NAME),
            endpoint: required(ENV_ENDPOINT),
            region: get(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            local_data_dir: PathBuf::from(
                get(ENV_LOCAL_DATA_DIR).unwrap_or_else(|| DEFAULT_LOCAL_DATA_DIR.to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `endpoint` must be an `http://` or `https://` URL
    /// - `local_data_dir` must name a directory, not a filesystem root
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(SyncError::UserError(format!(
                "config validation failed: {} must start with http:// or https:// (found '{}')",
                ENV_ENDPOINT, self.endpoint
            )));
        }

        if self.local_data_dir.file_name().is_none() {
            return Err(SyncError::UserError(format!(
                "config validation failed: {} must name a directory (found '{}')",
                ENV_LOCAL_DATA_DIR,
                self.local_data_dir.display()
            )));
        }

        Ok(())
    }

    /// Whether requests go over plain HTTP (local emulators such as MinIO).
    pub fn allows_http(&self) -> bool {
        self.endpoint.starts_with("http://")
    }
}
