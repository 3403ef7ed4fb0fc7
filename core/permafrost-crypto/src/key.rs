//! Password-based key derivation.
//!
//! The master key is derived with scrypt over the UTF-8 password and a fixed
//! salt. The fixed salt is part of the on-disk format: two installs sharing a
//! password derive the same key, so deterministic filename IVs line up across
//! hosts and a backup written on one machine lists correctly on another.
//! Changing the salt would orphan every existing backup.

use crate::error::{CryptoError, CryptoResult};
use scrypt::Params;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the derived key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Fixed scrypt salt; a format constant, not a secret.
const SALT: &[u8] = b"salt";

// N=16384, r=8, p=1 — the default parameter set of mainstream scrypt
// implementations. Pinned so the derived key is stable across releases.
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// A 256-bit key derived from the user's password.
///
/// Used for all body cipher operations and for the synthetic-IV HMAC chain.
/// Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    /// Derives the key from a password.
    pub fn derive(password: &str) -> CryptoResult<Self> {
        let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_SIZE)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let mut out = [0u8; KEY_SIZE];
        scrypt::scrypt(password.as_bytes(), SALT, &params, &mut out)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        Ok(Self(out))
    }

    /// Reconstructs a key from raw bytes (for tests and key escrow).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}
