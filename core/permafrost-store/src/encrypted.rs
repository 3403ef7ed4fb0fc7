//! Client-side encryption decorator.
//!
//! Wraps any endpoint. Names are encrypted deterministically so listings
//! deduplicate and updates overwrite; bodies carry the fixed 33-byte
//! framing, so the wrapper subtracts that overhead from every size it
//! reports and adds it to every size it forwards. Everything above this
//! layer sees plaintext paths and plaintext sizes; the inner endpoint sees
//! only path-safe ciphertext.

use async_trait::async_trait;
use permafrost_crypto::{
    decrypt_name, encrypt_name, DecryptReader, DerivedKey, EncryptReader, OVERHEAD,
};

use crate::endpoint::{ByteStreamReader, Endpoint, ObjectMeta};
use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};

/// Upper bound on a single encrypted body. One tag over more data than this
/// is too weak an integrity story; the driver skips larger files.
const MAX_PLAINTEXT_SIZE: u64 = 64 * 1024 * 1024 * 1024;

/// Encrypting wrapper around an owned inner endpoint.
pub struct EncryptedEndpoint {
    key: DerivedKey,
    inner: Box<dyn Endpoint>,
}

impl EncryptedEndpoint {
    pub fn new(key: DerivedKey, inner: Box<dyn Endpoint>) -> Self {
        Self { key, inner }
    }
}

#[async_trait]
impl Endpoint for EncryptedEndpoint {
    fn describe(&self) -> String {
        format!("enc+{}", self.inner.describe())
    }

    async fn list(&self) -> StoreResult<Vec<Entry>> {
        let inner_entries = self.inner.list().await?;
        let mut entries = Vec::with_capacity(inner_entries.len());
        for inner in inner_entries {
            let path = decrypt_name(&self.key, &inner.path)?;
            // Anything smaller than the framing was not produced by this
            // layer; the listing is ill-formed and the sync must not guess.
            let size = inner
                .size
                .checked_sub(OVERHEAD)
                .ok_or(StoreError::IllFormedListing {
                    path: inner.path.clone(),
                    size: inner.size,
                })?;
            entries.push(Entry {
                path,
                size,
                mtime_ms: inner.mtime_ms,
            });
        }
        Ok(entries)
    }

    async fn size(&self, path: &str) -> StoreResult<u64> {
        let name = encrypt_name(&self.key, path);
        let inner_size = self.inner.size(&name).await?;
        inner_size
            .checked_sub(OVERHEAD)
            .ok_or(StoreError::IllFormedListing {
                path: name,
                size: inner_size,
            })
    }

    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
        let inner = self.inner.read(&encrypt_name(&self.key, path)).await?;
        Ok(Box::pin(DecryptReader::new(&self.key, inner)))
    }

    async fn write(&self, path: &str, data: ByteStreamReader, size: u64) -> StoreResult<()> {
        let cipher: ByteStreamReader = Box::pin(EncryptReader::new(&self.key, data));
        self.inner
            .write(&encrypt_name(&self.key, path), cipher, size + OVERHEAD)
            .await
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        self.inner.remove(&encrypt_name(&self.key, path)).await
    }

    fn is_write_supported(&self, path: &str, size: u64) -> bool {
        size <= MAX_PLAINTEXT_SIZE
            && self
                .inner
                .is_write_supported(&encrypt_name(&self.key, path), size + OVERHEAD)
    }

    async fn head(&self, path: &str) -> StoreResult<ObjectMeta> {
        self.inner.head(&encrypt_name(&self.key, path)).await
    }

    async fn restore(&self, path: &str) -> StoreResult<()> {
        self.inner.restore(&encrypt_name(&self.key, path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullEndpoint;

    #[async_trait]
    impl Endpoint for NullEndpoint {
        fn describe(&self) -> String {
            "null://".to_string()
        }
        async fn list(&self) -> StoreResult<Vec<Entry>> {
            Ok(Vec::new())
        }
        async fn size(&self, _path: &str) -> StoreResult<u64> {
            Ok(0)
        }
        async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
            Err(StoreError::InvalidPath(path.to_string()))
        }
        async fn write(
            &self,
            _path: &str,
            _data: ByteStreamReader,
            _size: u64,
        ) -> StoreResult<()> {
            Ok(())
        }
        async fn remove(&self, _path: &str) -> StoreResult<()> {
            Ok(())
        }
        fn is_write_supported(&self, _path: &str, _size: u64) -> bool {
            true
        }
    }

    fn wrapper() -> EncryptedEndpoint {
        EncryptedEndpoint::new(DerivedKey::from_bytes([7; 32]), Box::new(NullEndpoint))
    }

    #[test]
    fn sizes_up_to_the_ceiling_are_supported() {
        let enc = wrapper();
        assert!(enc.is_write_supported("a.bin", 64 * 1024 * 1024 * 1024));
        assert!(!enc.is_write_supported("a.bin", 64 * 1024 * 1024 * 1024 + 1));
        assert!(!enc.is_write_supported("a.bin", 70 * 1024 * 1024 * 1024));
    }

    #[test]
    fn describe_prefixes_the_inner_endpoint() {
        assert_eq!(wrapper().describe(), "enc+null://");
    }

    #[tokio::test]
    async fn head_is_forwarded_not_rejected() {
        // NullEndpoint has no head; the wrapper must surface the inner
        // endpoint's Unsupported error, not invent its own.
        let err = wrapper().head("a.bin").await.unwrap_err();
        assert!(matches!(err, StoreError::Unsupported { op: "head", .. }));
    }
}
