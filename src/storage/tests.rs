//! Tests for the blocking store facade, run against an in-memory bucket.

use super::*;
use crate::test_support::{memory_store, memory_store_with_content_type};
use tempfile::TempDir;

#[test]
fn test_get_and_head_missing_object_return_none() {
    let store = memory_store();

    assert!(store.get("nope").unwrap().is_none());
    assert!(store.head("nope").unwrap().is_none());
}

#[test]
fn test_put_then_get_returns_body() {
    let store = memory_store();

    store
        .put("greeting", Bytes::from_static(b"hello"), "text/plain")
        .unwrap();

    assert_eq!(store.get("greeting").unwrap().unwrap(), Bytes::from_static(b"hello"));
    assert_eq!(store.head("greeting").unwrap().unwrap().size, 5);
}

#[test]
fn test_put_overwrites_existing_object() {
    let store = memory_store();

    store.put("k", Bytes::from_static(b"one"), "text/plain").unwrap();
    store.put("k", Bytes::from_static(b"two"), "text/plain").unwrap();

    assert_eq!(store.get("k").unwrap().unwrap(), Bytes::from_static(b"two"));
}

#[test]
fn test_create_refuses_to_overwrite() {
    let store = memory_store();

    let first = store
        .create("k", Bytes::from_static(b"first"), "text/plain")
        .unwrap();
    let second = store
        .create("k", Bytes::from_static(b"second"), "text/plain")
        .unwrap();

    assert_eq!(first, CreateOutcome::Created);
    assert_eq!(second, CreateOutcome::AlreadyExists);
    assert_eq!(store.get("k").unwrap().unwrap(), Bytes::from_static(b"first"));
}

#[test]
fn test_delete_removes_object_and_tolerates_missing_key() {
    let store = memory_store();

    store.put("k", Bytes::from_static(b"v"), "text/plain").unwrap();
    store.delete("k").unwrap();
    assert!(store.get("k").unwrap().is_none());

    // S3 semantics: deleting an absent key succeeds.
    store.delete("k").unwrap();
}

#[test]
fn test_upload_from_and_download_to_round_trip_file() {
    let store = memory_store();
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("payload.bin");
    let content: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    std::fs::write(&source, &content).unwrap();

    let uploaded = store.upload_from(&source, "blob").unwrap();
    assert_eq!(uploaded, content.len() as u64);

    let target = temp_dir.path().join("copy.bin");
    let mut file = File::create(&target).unwrap();
    let downloaded = store.download_to("blob", &mut file).unwrap();
    drop(file);

    assert_eq!(downloaded, content.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), content);
}

#[test]
fn test_download_missing_object_is_store_error() {
    let store = memory_store();
    let temp_dir = TempDir::new().unwrap();
    let mut file = File::create(temp_dir.path().join("out")).unwrap();

    let err = store.download_to("absent", &mut file).unwrap_err();
    assert!(matches!(err, SyncError::StoreError(_)));
    assert!(err.to_string().contains("'absent'"));
}

#[test]
fn test_upload_missing_file_is_io_error() {
    let store = memory_store();
    let temp_dir = TempDir::new().unwrap();

    let err = store
        .upload_from(&temp_dir.path().join("missing"), "k")
        .unwrap_err();
    assert!(matches!(err, SyncError::IoError(_)));
}

#[test]
fn test_upload_above_threshold_goes_multipart() {
    let store = memory_store();
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("big.bin");
    let len = MULTIPART_THRESHOLD as usize + 4 * 1024 * 1024 + 123;
    let content: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
    std::fs::write(&source, &content).unwrap();

    let uploaded = store.upload_from(&source, "big").unwrap();

    assert_eq!(uploaded, len as u64);
    assert_eq!(store.head("big").unwrap().unwrap().size, len);
    assert_eq!(store.get("big").unwrap().unwrap().as_ref(), content.as_slice());
}

#[test]
fn test_uploads_carry_archive_content_type() {
    let (store, inner) = memory_store_with_content_type();
    let temp_dir = TempDir::new().unwrap();
    let small = temp_dir.path().join("small.tar.gz");
    std::fs::write(&small, b"tiny").unwrap();
    let large = temp_dir.path().join("large.tar.gz");
    std::fs::write(&large, vec![7u8; MULTIPART_THRESHOLD as usize + 1]).unwrap();

    store.upload_from(&small, "small").unwrap();
    store.upload_from(&large, "large").unwrap();

    for key in ["small", "large"] {
        let result = store
            .runtime
            .block_on(inner.get(&ObjectPath::from(key)))
            .unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType).map(|v| v.as_ref()),
            Some(ARCHIVE_CONTENT_TYPE),
            "content type of '{}'",
            key
        );
    }
}

#[test]
fn test_list_returns_only_objects_under_prefix() {
    let store = memory_store();
    store.put("backups/a.tar.gz", Bytes::from_static(b"a"), "application/gzip").unwrap();
    store.put("backups/b.tar.gz", Bytes::from_static(b"bb"), "application/gzip").unwrap();
    store.put("server.lock", Bytes::from_static(b"{}"), "application/json").unwrap();

    let mut keys: Vec<String> = store
        .list("backups/")
        .unwrap()
        .into_iter()
        .map(|meta| meta.location.to_string())
        .collect();
    keys.sort();

    assert_eq!(keys, vec!["backups/a.tar.gz", "backups/b.tar.gz"]);
    assert!(store.list("nothing-here/").unwrap().is_empty());
}
