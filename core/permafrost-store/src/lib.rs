//! Endpoint backends for permafrost.
//!
//! Every backend satisfies the [`Endpoint`] contract: list, size, read,
//! write, remove, plus head/restore where the backing store supports
//! archive tiers. Leaf backends are [`FsEndpoint`] (a local directory tree)
//! and [`S3Endpoint`] (bucket + key prefix, cold storage classes,
//! multipart writes). [`EncryptedEndpoint`] decorates any of them with the
//! client-side encryption format from `permafrost-crypto`, translating
//! names and sizes so the layers above never see ciphertext.
//!
//! Endpoint stacks are composed from URIs by [`connect`].

pub mod config;
pub mod encrypted;
pub mod endpoint;
pub mod entry;
pub mod error;
pub mod fs;
pub mod s3;
pub mod uri;

pub use config::{ConnectOptions, GlacierJobSpec, RestoreSpec, Secrets, DEFAULT_STORAGE_CLASS};
pub use encrypted::EncryptedEndpoint;
pub use endpoint::{ByteStreamReader, Endpoint, ObjectMeta};
pub use entry::Entry;
pub use error::{StoreError, StoreResult};
pub use fs::FsEndpoint;
pub use s3::S3Endpoint;
pub use uri::{connect, parse_uri, ParsedUri, Target};
