//! Blocking facade over the remote object store.
//!
//! The rest of worldsync is strictly sequential, so every call here drives
//! the async `object_store` client to completion on a private current-thread
//! runtime before returning. A missing object is reported as `None` (or an
//! explicit outcome) rather than an error; every other failure becomes a
//! [`SyncError::StoreError`] naming the key.

#[cfg(test)]
mod tests;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, PutMode, PutMultipartOpts, PutOptions,
    PutPayload, WriteMultipart,
};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;

/// Object key of the server lock.
pub const LOCK_OBJECT_KEY: &str = "server.lock";

/// Object key of the data archive.
pub const ARCHIVE_OBJECT_KEY: &str = "server-data.tar.gz";

/// Content type of uploaded archives.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";

/// Files larger than this are sent with a multipart upload.
const MULTIPART_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Part size for multipart uploads (S3 requires at least 5 MiB).
const UPLOAD_PART_SIZE: usize = 8 * 1024 * 1024;

/// Parts allowed in flight at once during a multipart upload.
const UPLOAD_MAX_INFLIGHT: usize = 4;

/// Result of a create-only-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object did not exist and was written.
    Created,
    /// An object already exists at the key; nothing was written.
    AlreadyExists,
    /// The backing store cannot do conditional writes; nothing was written.
    Unsupported,
}

/// Handle to the single bucket worldsync talks to.
pub struct RemoteStore {
    inner: Arc<dyn ObjectStore>,
    runtime: Runtime,
    /// Whether writes carry `Content-Type` metadata (the local filesystem
    /// backend rejects attributes).
    send_content_type: bool,
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RemoteStore({})", self.inner)
    }
}

impl RemoteStore {
    /// Wrap an existing object store.
    pub fn new(inner: Arc<dyn ObjectStore>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SyncError::IoError(format!("failed to start I/O runtime: {}", e)))?;

        Ok(Self {
            inner,
            runtime,
            send_content_type: false,
        })
    }

    /// Connect to the S3-compatible bucket described by `config`.
    ///
    /// Requests use path-style addressing. Conditional creates are sent as
    /// `If-None-Match: *`, which R2 and S3 both honor.
    pub fn connect(config: &SyncConfig) -> Result<Self> {
        let store = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_endpoint(&config.endpoint)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_virtual_hosted_style_request(false)
            .with_allow_http(config.allows_http())
            .with_conditional_put(S3ConditionalPut::ETagMatch)
            .build()
            .map_err(|e| {
                SyncError::UserError(format!(
                    "failed to configure object store for bucket '{}': {}",
                    config.bucket, e
                ))
            })?;

        debug!(bucket = %config.bucket, endpoint = %config.endpoint, "configured object store");
        Ok(Self::new(Arc::new(store))?.with_content_type())
    }

    /// Attach `Content-Type` metadata to every write.
    pub(crate) fn with_content_type(mut self) -> Self {
        self.send_content_type = true;
        self
    }

    /// Fetch an object's body, or `None` if it does not exist.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let location = ObjectPath::from(key);
        let body = self
            .runtime
            .block_on(async {
                match self.inner.get(&location).await {
                    Ok(result) => result.bytes().await.map(Some),
                    Err(object_store::Error::NotFound { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .map_err(|e| store_error("get", key, e))?;

        debug!(key, found = body.is_some(), "get object");
        Ok(body)
    }

    /// Fetch an object's metadata, or `None` if it does not exist.
    pub fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let location = ObjectPath::from(key);
        let meta = self
            .runtime
            .block_on(async {
                match self.inner.head(&location).await {
                    Ok(meta) => Ok(Some(meta)),
                    Err(object_store::Error::NotFound { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .map_err(|e| store_error("head", key, e))?;

        debug!(key, size = meta.as_ref().map(|m| m.size), "head object");
        Ok(meta)
    }

    /// Write an object unconditionally, replacing any existing value.
    pub fn put(&self, key: &str, body: Bytes, content_type: &'static str) -> Result<()> {
        let location = ObjectPath::from(key);
        let len = body.len();
        self.runtime
            .block_on(self.inner.put_opts(
                &location,
                PutPayload::from(body),
                self.put_options(PutMode::Overwrite, content_type),
            ))
            .map_err(|e| store_error("put", key, e))?;

        debug!(key, bytes = len, "put object");
        Ok(())
    }

    /// Write an object only if nothing exists at `key` yet.
    pub fn create(&self, key: &str, body: Bytes, content_type: &'static str) -> Result<CreateOutcome> {
        let location = ObjectPath::from(key);
        let len = body.len();
        let result = self.runtime.block_on(self.inner.put_opts(
            &location,
            PutPayload::from(body),
            self.put_options(PutMode::Create, content_type),
        ));

        let outcome = match result {
            Ok(_) => CreateOutcome::Created,
            Err(object_store::Error::AlreadyExists { .. })
            | Err(object_store::Error::Precondition { .. }) => CreateOutcome::AlreadyExists,
            Err(object_store::Error::NotImplemented) => CreateOutcome::Unsupported,
            Err(e) => return Err(store_error("create", key, e)),
        };

        debug!(key, bytes = len, ?outcome, "conditional create");
        Ok(outcome)
    }

    /// Delete an object. Deleting a missing key is not an error on S3.
    pub fn delete(&self, key: &str) -> Result<()> {
        let location = ObjectPath::from(key);
        self.runtime
            .block_on(self.inner.delete(&location))
            .map_err(|e| store_error("delete", key, e))?;

        debug!(key, "delete object");
        Ok(())
    }

    /// Metadata of every object under `prefix`, in no particular order.
    pub fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let location = ObjectPath::from(prefix);
        let objects = self
            .runtime
            .block_on(self.inner.list(Some(&location)).try_collect::<Vec<_>>())
            .map_err(|e| store_error("list", prefix, e))?;

        debug!(prefix, count = objects.len(), "list objects");
        Ok(objects)
    }

    fn attributes(&self, content_type: &'static str) -> Attributes {
        let mut attributes = Attributes::new();
        if self.send_content_type {
            attributes.insert(Attribute::ContentType, content_type.into());
        }
        attributes
    }

    fn put_options(&self, mode: PutMode, content_type: &'static str) -> PutOptions {
        PutOptions {
            mode,
            attributes: self.attributes(content_type),
            ..Default::default()
        }
    }

    /// Stream an object into `file`, returning the number of bytes written.
    pub fn download_to(&self, key: &str, file: &mut File) -> Result<u64> {
        let location = ObjectPath::from(key);
        let written = self.runtime.block_on(async {
            let result = self
                .inner
                .get(&location)
                .await
                .map_err(|e| store_error("download", key, e))?;

            let mut stream = result.into_stream();
            let mut written = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| store_error("download", key, e))?;
                file.write_all(&chunk).map_err(|e| {
                    SyncError::IoError(format!("failed to write download of '{}': {}", key, e))
                })?;
                written += chunk.len() as u64;
            }
            Ok::<_, SyncError>(written)
        })?;

        file.sync_all()
            .map_err(|e| SyncError::IoError(format!("failed to sync download of '{}': {}", key, e)))?;

        debug!(key, bytes = written, "downloaded object");
        Ok(written)
    }

    /// Upload a local archive to `key`, replacing any existing value.
    ///
    /// Returns the number of bytes uploaded.
    pub fn upload_from(&self, path: &Path, key: &str) -> Result<u64> {
        let mut file = File::open(path).map_err(|e| {
            SyncError::IoError(format!("failed to open '{}' for upload: {}", path.display(), e))
        })?;
        let len = file
            .metadata()
            .map_err(|e| SyncError::IoError(format!("failed to stat '{}': {}", path.display(), e)))?
            .len();

        let location = ObjectPath::from(key);
        if len <= MULTIPART_THRESHOLD {
            let mut body = Vec::with_capacity(len as usize);
            file.read_to_end(&mut body).map_err(|e| {
                SyncError::IoError(format!("failed to read '{}': {}", path.display(), e))
            })?;
            self.runtime
                .block_on(self.inner.put_opts(
                    &location,
                    PutPayload::from(body),
                    self.put_options(PutMode::Overwrite, ARCHIVE_CONTENT_TYPE),
                ))
                .map_err(|e| store_error("upload", key, e))?;
        } else {
            self.runtime.block_on(async {
                let opts = PutMultipartOpts {
                    attributes: self.attributes(ARCHIVE_CONTENT_TYPE),
                    ..Default::default()
                };
                let upload = self
                    .inner
                    .put_multipart_opts(&location, opts)
                    .await
                    .map_err(|e| store_error("upload", key, e))?;
                let mut writer = WriteMultipart::new_with_chunk_size(upload, UPLOAD_PART_SIZE);

                if let Err(e) = write_parts(&mut file, &mut writer, path, key).await {
                    let _ = writer.abort().await;
                    return Err(e);
                }
                writer
                    .finish()
                    .await
                    .map_err(|e| store_error("upload", key, e))?;
                Ok::<_, SyncError>(())
            })?;
        }

        debug!(key, bytes = len, multipart = len > MULTIPART_THRESHOLD, "uploaded file");
        Ok(len)
    }
}

async fn write_parts(
    file: &mut File,
    writer: &mut WriteMultipart,
    path: &Path,
    key: &str,
) -> Result<()> {
    let mut buf = vec![0u8; UPLOAD_PART_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| SyncError::IoError(format!("failed to read '{}': {}", path.display(), e)))?;
        if n == 0 {
            return Ok(());
        }
        writer
            .wait_for_capacity(UPLOAD_MAX_INFLIGHT)
            .await
            .map_err(|e| store_error("upload", key, e))?;
        writer.write(&buf[..n]);
    }
}

fn store_error(op: &str, key: &str, e: object_store::Error) -> SyncError {
    SyncError::StoreError(format!("{} '{}' failed: {}", op, key, e))
}
