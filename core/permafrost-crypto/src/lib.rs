//! Encryption layer for permafrost.
//!
//! Provides the client-side format used by encrypted endpoints:
//! - scrypt key derivation from the user's password (fixed-salt, so filename
//!   IVs are stable across hosts sharing a password)
//! - streaming AES-256-GCM bodies framed as `0x01 || IV[16] || ct || tag[16]`
//!   (33 bytes of overhead, ciphertext size = plaintext size + 33)
//! - deterministic, path-safe filename encryption via synthetic IVs
//!
//! The cipher and decipher are `AsyncRead` adapters so bodies of any size
//! stream through without buffering more than a rolling 16-byte trailer.

mod error;
mod gcm;
mod key;
mod name;
mod stream;

pub use error::{CryptoError, CryptoResult};
pub use key::{DerivedKey, KEY_SIZE};
pub use name::{decrypt_name, encrypt_name, synthetic_iv};
pub use stream::{DecryptReader, EncryptReader, IV_SIZE, OVERHEAD, TAG_SIZE, VERSION};
