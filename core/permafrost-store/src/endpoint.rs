//! The endpoint contract every backend satisfies.
//!
//! An endpoint is one end of a sync: a leaf backend (filesystem or S3) or
//! the encryption decorator wrapping another endpoint. Composition is fixed
//! at construction; a wrapper owns its inner endpoint for the duration of
//! the sync. Backends report plaintext-equivalent semantics up the stack.

use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};

/// Byte stream handed between endpoints.
pub type ByteStreamReader = Pin<Box<dyn AsyncRead + Send>>;

/// Object metadata returned by `head`, for restore-state inspection.
#[derive(Clone, Debug, Default)]
pub struct ObjectMeta {
    /// Storage class reported by the backend, e.g. `DEEP_ARCHIVE`.
    pub storage_class: Option<String>,
    /// Raw restore status, e.g. `ongoing-request="false", expiry-date=…`.
    pub restore: Option<String>,
}

impl ObjectMeta {
    /// True when the object sits in a tier that needs a restore before reads.
    pub fn is_archived(&self) -> bool {
        matches!(
            self.storage_class.as_deref(),
            Some("GLACIER") | Some("DEEP_ARCHIVE")
        )
    }

    /// True while a retrieval is already running.
    pub fn restore_in_progress(&self) -> bool {
        self.restore
            .as_deref()
            .is_some_and(|r| r.contains("ongoing-request=\"true\""))
    }
}

impl std::fmt::Debug for dyn Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Human-readable identifier for log lines.
    fn describe(&self) -> String;

    /// All entries visible at this endpoint. Finite; order is backend-defined.
    async fn list(&self) -> StoreResult<Vec<Entry>>;

    /// Size of one entry in bytes.
    async fn size(&self, path: &str) -> StoreResult<u64>;

    /// Readable byte stream of an entry's content.
    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader>;

    /// Writes `size` bytes from `data` under `path`, creating intermediate
    /// directories on leaf backends. Returns only once the bytes are durable
    /// from the backend's perspective.
    async fn write(&self, path: &str, data: ByteStreamReader, size: u64) -> StoreResult<()>;

    /// Deletes the entry.
    async fn remove(&self, path: &str) -> StoreResult<()>;

    /// Whether the backend can accept a write of this size.
    fn is_write_supported(&self, path: &str, size: u64) -> bool;

    /// Backend metadata including restore state. Object stores only.
    async fn head(&self, _path: &str) -> StoreResult<ObjectMeta> {
        Err(StoreError::Unsupported {
            op: "head",
            endpoint: self.describe(),
        })
    }

    /// Initiates archive-tier retrieval. Object stores and wrappers of them only.
    async fn restore(&self, _path: &str) -> StoreResult<()> {
        Err(StoreError::Unsupported {
            op: "restore",
            endpoint: self.describe(),
        })
    }
}
