//! Driver behavior against stub endpoints: capacity refusals must skip
//! without touching the data path, and the restore scan must only request
//! retrieval for archived objects with no retrieval running.

use std::sync::Mutex;

use async_trait::async_trait;
use permafrost_crypto::DerivedKey;
use permafrost_store::{
    ByteStreamReader, EncryptedEndpoint, Endpoint, Entry, ObjectMeta, StoreError, StoreResult,
};
use permafrost_sync::{run_restore, run_sync};

const GIB: u64 = 1024 * 1024 * 1024;

/// Source advertising one file far over the encryption layer's ceiling.
/// Reading it would be a test failure.
struct HugeSource;

#[async_trait]
impl Endpoint for HugeSource {
    fn describe(&self) -> String {
        "stub://huge-source".to_string()
    }
    async fn list(&self) -> StoreResult<Vec<Entry>> {
        Ok(vec![Entry {
            path: "colossal.bin".to_string(),
            size: 70 * GIB,
            mtime_ms: 1_700_000_000_000,
        }])
    }
    async fn size(&self, _path: &str) -> StoreResult<u64> {
        Ok(70 * GIB)
    }
    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
        Err(StoreError::Config(format!(
            "read of {path} must not happen for a skipped entry"
        )))
    }
    async fn write(&self, path: &str, _data: ByteStreamReader, _size: u64) -> StoreResult<()> {
        Err(StoreError::Config(format!("unexpected write of {path}")))
    }
    async fn remove(&self, path: &str) -> StoreResult<()> {
        Err(StoreError::Config(format!("unexpected remove of {path}")))
    }
    fn is_write_supported(&self, _path: &str, _size: u64) -> bool {
        true
    }
}

/// Empty target that refuses nothing and must never be written to.
struct NullTarget;

#[async_trait]
impl Endpoint for NullTarget {
    fn describe(&self) -> String {
        "stub://null-target".to_string()
    }
    async fn list(&self) -> StoreResult<Vec<Entry>> {
        Ok(Vec::new())
    }
    async fn size(&self, path: &str) -> StoreResult<u64> {
        Err(StoreError::Config(format!("unexpected size of {path}")))
    }
    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
        Err(StoreError::Config(format!("unexpected read of {path}")))
    }
    async fn write(&self, path: &str, _data: ByteStreamReader, _size: u64) -> StoreResult<()> {
        Err(StoreError::Config(format!("unexpected write of {path}")))
    }
    async fn remove(&self, path: &str) -> StoreResult<()> {
        Err(StoreError::Config(format!("unexpected remove of {path}")))
    }
    fn is_write_supported(&self, _path: &str, _size: u64) -> bool {
        true
    }
}

#[tokio::test]
async fn oversized_file_is_skipped_not_failed() {
    let target = EncryptedEndpoint::new(DerivedKey::from_bytes([1; 32]), Box::new(NullTarget));

    let result = run_sync(&HugeSource, &target).await.unwrap();
    assert_eq!(result.skipped, 1);
    assert_eq!(result.added, 0);
    assert_eq!(result.updated, 0);
    assert_eq!(result.deleted, 0);
}

/// Archive store with canned head metadata, recording restore calls.
struct ArchiveStub {
    objects: Vec<(Entry, ObjectMeta)>,
    restored: Mutex<Vec<String>>,
}

impl ArchiveStub {
    fn new(objects: Vec<(&str, Option<&str>, Option<&str>)>) -> Self {
        let objects = objects
            .into_iter()
            .enumerate()
            .map(|(i, (path, storage_class, restore))| {
                (
                    Entry {
                        path: path.to_string(),
                        size: 100,
                        mtime_ms: i as i64,
                    },
                    ObjectMeta {
                        storage_class: storage_class.map(str::to_string),
                        restore: restore.map(str::to_string),
                    },
                )
            })
            .collect();
        Self {
            objects,
            restored: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Endpoint for ArchiveStub {
    fn describe(&self) -> String {
        "stub://archive".to_string()
    }
    async fn list(&self) -> StoreResult<Vec<Entry>> {
        Ok(self.objects.iter().map(|(e, _)| e.clone()).collect())
    }
    async fn size(&self, _path: &str) -> StoreResult<u64> {
        Ok(100)
    }
    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
        Err(StoreError::Config(format!("unexpected read of {path}")))
    }
    async fn write(&self, path: &str, _data: ByteStreamReader, _size: u64) -> StoreResult<()> {
        Err(StoreError::Config(format!("unexpected write of {path}")))
    }
    async fn remove(&self, path: &str) -> StoreResult<()> {
        Err(StoreError::Config(format!("unexpected remove of {path}")))
    }
    fn is_write_supported(&self, _path: &str, _size: u64) -> bool {
        true
    }
    async fn head(&self, path: &str) -> StoreResult<ObjectMeta> {
        self.objects
            .iter()
            .find(|(e, _)| e.path == path)
            .map(|(_, m)| m.clone())
            .ok_or_else(|| StoreError::S3(format!("no such object: {path}")))
    }
    async fn restore(&self, path: &str) -> StoreResult<()> {
        self.restored.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn restore_requests_only_idle_archived_objects() {
    let stub = ArchiveStub::new(vec![
        // Archived, never restored: must be requested.
        ("cold/never.bin", Some("DEEP_ARCHIVE"), None),
        // Archived, retrieval finished: requested again (extends the copy).
        (
            "cold/expired.bin",
            Some("GLACIER"),
            Some("ongoing-request=\"false\", expiry-date=\"Fri, 21 Dec 2025 00:00:00 GMT\""),
        ),
        // Archived, retrieval running: left alone.
        ("cold/busy.bin", Some("DEEP_ARCHIVE"), Some("ongoing-request=\"true\"")),
        // Warm tiers: nothing to do.
        ("warm/standard.bin", Some("STANDARD"), None),
        ("warm/unclassified.bin", None, None),
    ]);

    let result = run_restore(&stub).await.unwrap();
    assert_eq!(result.requested, 2);
    assert_eq!(result.in_progress, 1);
    assert_eq!(result.not_archived, 2);

    let restored = stub.restored.lock().unwrap();
    assert_eq!(*restored, vec!["cold/never.bin", "cold/expired.bin"]);
}

#[tokio::test]
async fn restore_scan_is_idempotent_once_retrievals_run() {
    let stub = ArchiveStub::new(vec![(
        "cold/busy.bin",
        Some("DEEP_ARCHIVE"),
        Some("ongoing-request=\"true\""),
    )]);

    let result = run_restore(&stub).await.unwrap();
    assert_eq!(result.requested, 0);
    assert_eq!(result.in_progress, 1);
    assert!(stub.restored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn restore_against_a_filesystem_endpoint_fails_cleanly() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("x.txt"), b"x").unwrap();
    let fs = permafrost_store::FsEndpoint::new(dir.path());

    let err = run_restore(&fs).await.unwrap_err();
    assert!(err.to_string().contains("not supported"));
}
