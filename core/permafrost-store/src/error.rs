//! Store error types.

use permafrost_crypto::CryptoError;
use thiserror::Error;

/// Result type for endpoint operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in endpoint operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("S3 operation failed: {0}")]
    S3(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("invalid path {0:?}")]
    InvalidPath(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(
        "encrypted listing entry {path:?} is {size} bytes, \
         smaller than the 33-byte framing overhead"
    )]
    IllFormedListing { path: String, size: u64 },

    #[error("{op} is not supported by {endpoint}")]
    Unsupported { op: &'static str, endpoint: String },
}
