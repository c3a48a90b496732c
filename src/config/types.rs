//! Environment variable names and defaults.

/// Account identifier of the bucket owner.
pub const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";

/// Access key id used to sign requests.
pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";

/// Secret access key used to sign requests.
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";

/// Bucket holding the lock object and the data archive.
pub const ENV_BUCKET_NAME: &str = "R2_BUCKET_NAME";

/// S3-compatible endpoint URL.
pub const ENV_ENDPOINT: &str = "R2_ENDPOINT";

/// Signing region (optional).
pub const ENV_REGION: &str = "R2_REGION";

/// Local data directory (optional).
pub const ENV_LOCAL_DATA_DIR: &str = "LOCAL_DATA_DIR";

/// Variables that must be set and non-empty, in reporting order.
pub const REQUIRED_VARS: &[&str] = &[
    ENV_ACCOUNT_ID,
    ENV_ACCESS_KEY_ID,
    ENV_SECRET_ACCESS_KEY,
    ENV_BUCKET_NAME,
    ENV_ENDPOINT,
];

/// Data directory used when `LOCAL_DATA_DIR` is unset.
pub const DEFAULT_LOCAL_DATA_DIR: &str = "./server001/data";

/// R2 accepts any region; `auto` is its documented value.
pub const DEFAULT_REGION: &str = "auto";
