//! SyncConfig struct definition.

use std::fmt;
use std::path::PathBuf;

/// Connection and layout settings for one sync invocation.
///
/// Built once in `main` and passed by reference to every component.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Account identifier of the bucket owner.
    pub account_id: String,

    /// Access key id used to sign requests.
    pub access_key_id: String,

    /// Secret access key used to sign requests. Never printed.
    pub secret_access_key: String,

    /// Bucket holding `server.lock` and `server-data.tar.gz`.
    pub bucket: String,

    /// S3-compatible endpoint URL (e.g. `https://<account>.r2.cloudflarestorage.com`).
    pub endpoint: String,

    /// Signing region (default: `auto`).
    pub region: String,

    /// Directory the game server reads and writes (default: `./server001/data`).
    pub local_data_dir: PathBuf,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("local_data_dir", &self.local_data_dir)
            .finish()
    }
}
