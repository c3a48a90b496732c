use crate::storage::RemoteStore;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMode,
    PutMultipartOpts, PutOptions, PutPayload, PutResult,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A store backed by an in-memory bucket.
pub(crate) fn memory_store() -> RemoteStore {
    RemoteStore::new(Arc::new(InMemory::new())).unwrap()
}

/// A memory-backed store that also sends `Content-Type` on writes.
pub(crate) fn memory_store_with_content_type() -> (RemoteStore, Arc<InMemory>) {
    let inner = Arc::new(InMemory::new());
    let store = RemoteStore::new(inner.clone()).unwrap().with_content_type();
    (store, inner)
}

/// What a [`FaultyCreateStore`] does to create-only-if-absent writes.
#[derive(Debug, Clone)]
pub(crate) enum CreateFault {
    /// Another writer stores this body at the key just before the create lands.
    Race(Bytes),
    /// The backend has no conditional writes.
    Unsupported,
}

/// In-memory bucket whose conditional creates misbehave in a chosen way.
#[derive(Debug)]
pub(crate) struct FaultyCreateStore {
    inner: InMemory,
    fault: CreateFault,
}

pub(crate) fn faulty_create_store(fault: CreateFault) -> RemoteStore {
    let store = FaultyCreateStore {
        inner: InMemory::new(),
        fault,
    };
    RemoteStore::new(Arc::new(store)).unwrap()
}

impl std::fmt::Display for FaultyCreateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FaultyCreateStore({:?})", self.fault)
    }
}

#[async_trait]
impl ObjectStore for FaultyCreateStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        if matches!(opts.mode, PutMode::Create) {
            match &self.fault {
                CreateFault::Race(winner) => {
                    self.inner
                        .put(location, PutPayload::from(winner.clone()))
                        .await?;
                }
                CreateFault::Unsupported => return Err(object_store::Error::NotImplemented),
            }
        }
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &ObjectPath,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(
        &self,
        from: &ObjectPath,
        to: &ObjectPath,
    ) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

/// A store whose bucket is the directory `root` (which must exist).
pub(crate) fn local_fs_store(root: &Path) -> RemoteStore {
    let fs = LocalFileSystem::new_with_prefix(root).unwrap();
    RemoteStore::new(Arc::new(fs)).unwrap()
}

/// Write `content` to `root/relative`, creating parent directories.
pub(crate) fn write_file(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Every file under `root`, keyed by `/`-separated relative path.
///
/// Directories appear with a trailing `/` and no content so empty
/// directories are compared too.
pub(crate) fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let relative = path
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            if path.is_dir() {
                out.insert(format!("{}/", relative), Vec::new());
                walk(root, &path, out);
            } else {
                out.insert(relative, std::fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

/// The world layout used across sync tests.
pub(crate) fn create_world_fixture(data_dir: &Path) {
    write_file(data_dir, "world/level.dat", b"0123456789");
    write_file(data_dir, "world/region/r.0.0.mca", b"");
    write_file(data_dir, "server.properties", b"motd=hello\n");
}

/// Configuration pointing at a local endpoint with `data_dir` as the data directory.
pub(crate) fn test_config(data_dir: &Path) -> crate::config::SyncConfig {
    crate::config::SyncConfig {
        account_id: "test-account".to_string(),
        access_key_id: "test-key".to_string(),
        secret_access_key: "test-secret".to_string(),
        bucket: "test-bucket".to_string(),
        endpoint: "http://127.0.0.1:9000".to_string(),
        region: "auto".to_string(),
        local_data_dir: data_dir.to_path_buf(),
    }
}
