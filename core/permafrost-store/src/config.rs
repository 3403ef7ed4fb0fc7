//! Endpoint construction configuration.

use serde::Deserialize;

/// Storage class used for S3 writes unless overridden.
pub const DEFAULT_STORAGE_CLASS: &str = "DEEP_ARCHIVE";

/// Contents of the secrets file: one JSON object with camelCase fields.
/// Unknown fields are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secrets {
    /// Password for encrypted (`enc+`) endpoints.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3 endpoint (MinIO in dev/test). Forces path-style addressing.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Per-invocation options applied during endpoint construction.
#[derive(Clone, Debug, Default)]
pub struct ConnectOptions {
    /// Storage class for object-store writes.
    pub storage_class: Option<String>,
    /// Restore request passed through to `RestoreObject`.
    pub restore_request: Option<RestoreSpec>,
}

/// Restore request document, e.g. `{"Days": 5, "GlacierJobParameters": {"Tier": "Bulk"}}`.
#[derive(Clone, Debug, Deserialize)]
pub struct RestoreSpec {
    #[serde(rename = "Days")]
    pub days: i32,
    #[serde(rename = "GlacierJobParameters")]
    pub glacier_job_parameters: GlacierJobSpec,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GlacierJobSpec {
    #[serde(rename = "Tier")]
    pub tier: String,
}

impl Default for RestoreSpec {
    fn default() -> Self {
        Self {
            days: 5,
            glacier_job_parameters: GlacierJobSpec {
                tier: "Bulk".to_string(),
            },
        }
    }
}
