//! Sync and restore drivers.
//!
//! The driver owns all I/O and applies actions strictly in differ order: a
//! write for one path completes before the next action starts. Capacity
//! refusals are not errors — the entry is logged, counted as skipped, and
//! the run continues.

use std::fmt;

use permafrost_store::Endpoint;
use tracing::{debug, info};

use crate::diff::{diff, Action};
use crate::error::{SyncError, SyncResult};

/// Counts reported after a sync run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub added: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) added, {} file(s) updated, {} file(s) deleted, {} file(s) skipped",
            self.added, self.updated, self.deleted, self.skipped
        )
    }
}

/// Makes `target`'s contents equal to `source`'s.
pub async fn run_sync(source: &dyn Endpoint, target: &dyn Endpoint) -> SyncResult<SyncStats> {
    info!("Synchronizing {} to {}", source.describe(), target.describe());

    let source_entries = source
        .list()
        .await
        .map_err(|e| SyncError::list(source, e))?;
    let target_entries = target
        .list()
        .await
        .map_err(|e| SyncError::list(target, e))?;
    debug!(
        "listed {} source and {} target entries",
        source_entries.len(),
        target_entries.len()
    );

    let mut stats = SyncStats::default();
    for action in diff(source_entries, target_entries) {
        match action {
            Action::Add(entry) => {
                if copy_entry(source, target, &entry.path).await? {
                    stats.added += 1;
                } else {
                    stats.skipped += 1;
                }
            }
            Action::Update(entry) => {
                if copy_entry(source, target, &entry.path).await? {
                    stats.updated += 1;
                } else {
                    stats.skipped += 1;
                }
            }
            Action::Delete(entry) => {
                info!("Removing {} from {}", entry.path, target.describe());
                target
                    .remove(&entry.path)
                    .await
                    .map_err(|e| SyncError::entry(&entry.path, e))?;
                stats.deleted += 1;
            }
        }
    }

    info!("Synchronized: {stats}");
    Ok(stats)
}

/// Streams one entry from source to target. Returns false when the target
/// refuses the size (a skip, not a failure).
async fn copy_entry(
    source: &dyn Endpoint,
    target: &dyn Endpoint,
    path: &str,
) -> SyncResult<bool> {
    let size = source
        .size(path)
        .await
        .map_err(|e| SyncError::entry(path, e))?;

    if !target.is_write_supported(path, size) {
        info!(
            "Skipping {path}: {} does not accept {size} byte writes",
            target.describe()
        );
        return Ok(false);
    }

    info!("Copying {path} to {}", target.describe());
    let data = source
        .read(path)
        .await
        .map_err(|e| SyncError::entry(path, e))?;
    target
        .write(path, data, size)
        .await
        .map_err(|e| SyncError::entry(path, e))?;
    Ok(true)
}

/// Counts reported after a restore scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreStats {
    /// Restore requests issued this run.
    pub requested: u64,
    /// Archived objects with a retrieval already running.
    pub in_progress: u64,
    /// Objects not in an archive tier.
    pub not_archived: u64,
}

impl fmt::Display for RestoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} restore(s) requested, {} already in progress, {} not archived",
            self.requested, self.in_progress, self.not_archived
        )
    }
}

/// Requests archive retrieval for every archived object at the endpoint.
///
/// Idempotent: objects whose retrieval is already running are left alone, so
/// the command can run on a schedule until everything is readable.
pub async fn run_restore(endpoint: &dyn Endpoint) -> SyncResult<RestoreStats> {
    info!("Scanning {} for archived objects", endpoint.describe());

    let entries = endpoint
        .list()
        .await
        .map_err(|e| SyncError::list(endpoint, e))?;

    let mut stats = RestoreStats::default();
    for entry in entries {
        let meta = endpoint
            .head(&entry.path)
            .await
            .map_err(|e| SyncError::entry(&entry.path, e))?;
        if !meta.is_archived() {
            stats.not_archived += 1;
            continue;
        }
        if meta.restore_in_progress() {
            debug!("retrieval already running for {}", entry.path);
            stats.in_progress += 1;
            continue;
        }
        info!("Requesting restore of {}", entry.path);
        endpoint
            .restore(&entry.path)
            .await
            .map_err(|e| SyncError::entry(&entry.path, e))?;
        stats.requested += 1;
    }

    info!("Restore scan complete: {stats}");
    Ok(stats)
}
