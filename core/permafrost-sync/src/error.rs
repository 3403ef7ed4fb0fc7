//! Sync error types.

use permafrost_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while driving a sync or restore run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("listing {endpoint} failed: {source}")]
    List {
        endpoint: String,
        source: StoreError,
    },

    #[error("{path}: {source}")]
    Entry { path: String, source: StoreError },
}

impl SyncError {
    pub(crate) fn list(endpoint: &dyn permafrost_store::Endpoint, source: StoreError) -> Self {
        Self::List {
            endpoint: endpoint.describe(),
            source,
        }
    }

    pub(crate) fn entry(path: &str, source: StoreError) -> Self {
        Self::Entry {
            path: path.to_string(),
            source,
        }
    }
}
