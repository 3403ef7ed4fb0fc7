//! Listing entries.

/// Metadata for one file visible at an endpoint.
///
/// `path` is relative, `/`-separated, never absolute, and never contains
/// `..` segments. `size` is the size an observer of the *plaintext* world
/// would see: the encryption wrapper subtracts its framing overhead before
/// reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub size: u64,
    /// Last-modified time, integer milliseconds since the epoch.
    pub mtime_ms: i64,
}
