//! Secrets file loading.

use std::path::Path;

use anyhow::{Context, Result};
use permafrost_store::Secrets;

/// Reads the secrets file, or returns empty secrets when no path was given
/// (plain `file://` syncs need none).
pub fn load(path: Option<&Path>) -> Result<Secrets> {
    let Some(path) = path else {
        return Ok(Secrets::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read secrets file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("secrets file {} is not a valid JSON object", path.display()))
}
