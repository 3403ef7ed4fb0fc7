//! URI parsing and endpoint construction.
//!
//! Grammar: `[enc+](file|s3)://<path>`. For `s3://` the first `/` in the
//! path splits bucket from key prefix; an empty prefix is allowed. The
//! `enc+` prefix wraps the endpoint in the encryption layer and requires a
//! `password` in the secrets file.

use permafrost_crypto::DerivedKey;

use crate::config::{ConnectOptions, Secrets};
use crate::encrypted::EncryptedEndpoint;
use crate::endpoint::Endpoint;
use crate::error::{StoreError, StoreResult};
use crate::fs::FsEndpoint;
use crate::s3::S3Endpoint;

/// A parsed endpoint URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUri {
    pub encrypted: bool,
    pub target: Target,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    File { root: String },
    S3 { bucket: String, prefix: String },
}

pub fn parse_uri(uri: &str) -> StoreResult<ParsedUri> {
    let (encrypted, rest) = match uri.strip_prefix("enc+") {
        Some(rest) => (true, rest),
        None => (false, uri),
    };

    if let Some(root) = rest.strip_prefix("file://") {
        if root.is_empty() {
            return Err(StoreError::Config(format!("empty file path in URI {uri:?}")));
        }
        return Ok(ParsedUri {
            encrypted,
            target: Target::File {
                root: root.to_string(),
            },
        });
    }

    if let Some(location) = rest.strip_prefix("s3://") {
        let (bucket, prefix) = match location.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix),
            None => (location, ""),
        };
        if bucket.is_empty() {
            return Err(StoreError::Config(format!("empty bucket in URI {uri:?}")));
        }
        return Ok(ParsedUri {
            encrypted,
            target: Target::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
            },
        });
    }

    Err(StoreError::Config(format!(
        "unknown scheme in URI {uri:?} (expected [enc+](file|s3)://...)"
    )))
}

/// Constructs the endpoint stack a URI describes.
pub fn connect(
    uri: &str,
    secrets: &Secrets,
    opts: &ConnectOptions,
) -> StoreResult<Box<dyn Endpoint>> {
    let parsed = parse_uri(uri)?;

    let inner: Box<dyn Endpoint> = match parsed.target {
        Target::File { root } => Box::new(FsEndpoint::new(root)),
        Target::S3 { bucket, prefix } => {
            Box::new(S3Endpoint::new(bucket, prefix, secrets, opts)?)
        }
    };

    if !parsed.encrypted {
        return Ok(inner);
    }

    let password = secrets.password.as_deref().ok_or_else(|| {
        StoreError::Config("encrypted endpoint requires a password in the secrets file".to_string())
    })?;
    let key = DerivedKey::derive(password)?;
    Ok(Box::new(EncryptedEndpoint::new(key, inner)))
}
