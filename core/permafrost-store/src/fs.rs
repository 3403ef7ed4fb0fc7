//! Local filesystem backend.

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::endpoint::{ByteStreamReader, Endpoint};
use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};

/// Endpoint over a local directory tree.
pub struct FsEndpoint {
    root: PathBuf,
}

impl FsEndpoint {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rejects paths that would escape the root before joining.
    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        if path.is_empty()
            || path.starts_with('/')
            || path.split('/').any(|seg| seg.is_empty() || seg == "..")
        {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(path))
    }
}

fn mtime_ms(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl Endpoint for FsEndpoint {
    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }

    async fn list(&self) -> StoreResult<Vec<Entry>> {
        // A root that does not exist yet is an empty target, not an error.
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for item in WalkDir::new(&self.root) {
            let item = item.map_err(|e| StoreError::Io(e.into()))?;
            // Symlinks and non-regular files are skipped.
            if !item.file_type().is_file() {
                continue;
            }
            let meta = item.metadata().map_err(|e| StoreError::Io(e.into()))?;
            let rel = item
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| StoreError::InvalidPath(item.path().display().to_string()))?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(Entry {
                path,
                size: meta.len(),
                mtime_ms: mtime_ms(&meta),
            });
        }
        Ok(entries)
    }

    async fn size(&self, path: &str) -> StoreResult<u64> {
        let meta = tokio::fs::metadata(self.resolve(path)?).await?;
        Ok(meta.len())
    }

    async fn read(&self, path: &str) -> StoreResult<ByteStreamReader> {
        let file = tokio::fs::File::open(self.resolve(path)?).await?;
        Ok(Box::pin(file))
    }

    async fn write(&self, path: &str, mut data: ByteStreamReader, _size: u64) -> StoreResult<()> {
        let dest = self.resolve(path)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&dest).await?;
        tokio::io::copy(&mut data, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        tokio::fs::remove_file(self.resolve(path)?).await?;
        Ok(())
    }

    fn is_write_supported(&self, _path: &str, _size: u64) -> bool {
        true
    }
}
