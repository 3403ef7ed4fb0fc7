//! Sync engine for permafrost.
//!
//! [`diff`] reconciles two endpoint listings into an ordered action stream;
//! [`run_sync`] applies it sequentially against the target endpoint and
//! [`run_restore`] walks an object-store listing requesting archive
//! retrievals. Encryption never appears at this layer — the wrapper
//! endpoint translates names and sizes below the `Endpoint` contract.

pub mod diff;
pub mod driver;
pub mod error;

pub use diff::{diff, Action, DiffStream};
pub use driver::{run_restore, run_sync, RestoreStats, SyncStats};
pub use error::{SyncError, SyncResult};
