//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while deriving keys or transforming streams.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("authentication tag mismatch (wrong key or tampered data)")]
    Integrity,

    #[error("unsupported encryption version: {0}")]
    UnsupportedVersion(u8),

    #[error("ciphertext truncated: stream ended before {0}")]
    Truncated(&'static str),

    #[error("invalid encrypted name: {0}")]
    NameCodec(String),
}

impl From<CryptoError> for std::io::Error {
    fn from(err: CryptoError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    }
}
