//! Deterministic filename encryption.
//!
//! Filenames must encrypt to the same ciphertext on every run so listings
//! deduplicate and updates overwrite their predecessors. The IV is therefore
//! synthesized from the key and the name instead of drawn at random:
//!
//! ```text
//! H1 = HMAC-SHA256(key, "S7" || "aes-256-gcm")
//! H2 = HMAC-SHA256(H1, name_utf8)
//! IV = last 16 bytes of H2
//! ```
//!
//! The encrypted name is the body framing applied to the UTF-8 name bytes,
//! base64-encoded, with `/` swapped for `_` so the result never introduces a
//! path separator into an object key or file name.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::gcm::GcmCore;
use crate::key::DerivedKey;
use crate::stream::{IV_SIZE, OVERHEAD, VERSION};

type HmacSha256 = Hmac<Sha256>;

/// Derives the deterministic IV for a filename.
pub fn synthetic_iv(key: &DerivedKey, name: &str) -> [u8; IV_SIZE] {
    let mut h1 = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC accepts keys of any length");
    h1.update(b"S7");
    h1.update(b"aes-256-gcm");
    let h1 = h1.finalize().into_bytes();

    let mut h2 = HmacSha256::new_from_slice(&h1).expect("HMAC accepts keys of any length");
    h2.update(name.as_bytes());
    let h2 = h2.finalize().into_bytes();

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&h2[h2.len() - IV_SIZE..]);
    iv
}

/// Encrypts a filename to a path-safe, deterministic token.
pub fn encrypt_name(key: &DerivedKey, name: &str) -> String {
    let iv = synthetic_iv(key, name);
    let mut core = GcmCore::new(key.as_bytes(), &iv);

    let mut body = name.as_bytes().to_vec();
    core.encrypt_chunk(&mut body);
    let tag = core.finalize_tag();

    let mut framed = Vec::with_capacity(OVERHEAD as usize + body.len());
    framed.push(VERSION);
    framed.extend_from_slice(&iv);
    framed.extend_from_slice(&body);
    framed.extend_from_slice(&tag);

    BASE64.encode(framed).replace('/', "_")
}

/// Decrypts and authenticates an encrypted filename.
pub fn decrypt_name(key: &DerivedKey, encoded: &str) -> CryptoResult<String> {
    let framed = BASE64
        .decode(encoded.replace('_', "/"))
        .map_err(|e| CryptoError::NameCodec(format!("invalid base64: {e}")))?;

    if framed.len() < OVERHEAD as usize {
        return Err(CryptoError::Truncated("name framing"));
    }
    if framed[0] != VERSION {
        return Err(CryptoError::UnsupportedVersion(framed[0]));
    }

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&framed[1..1 + IV_SIZE]);
    let (ciphertext, tag) = framed[1 + IV_SIZE..].split_at(framed.len() - OVERHEAD as usize);

    let mut core = GcmCore::new(key.as_bytes(), &iv);
    let mut body = ciphertext.to_vec();
    core.decrypt_chunk(&mut body);
    if !core.verify_tag(tag) {
        return Err(CryptoError::Integrity);
    }

    String::from_utf8(body)
        .map_err(|_| CryptoError::NameCodec("decrypted name is not UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn test_key() -> DerivedKey {
        DerivedKey::from_bytes([0x42; 32])
    }

    #[test]
    fn name_round_trip() {
        let key = test_key();
        for name in ["test.txt", "prefix1/test.txt", "üñïçödé/файл.bin", ""] {
            let token = encrypt_name(&key, name);
            assert_eq!(decrypt_name(&key, &token).unwrap(), name);
        }
    }

    #[test]
    fn encryption_is_deterministic() {
        let key = test_key();
        assert_eq!(
            encrypt_name(&key, "a/b/c.txt"),
            encrypt_name(&key, "a/b/c.txt")
        );
    }

    #[test]
    fn token_is_path_safe() {
        let key = test_key();
        // Deep paths force enough ciphertext that raw base64 would emit '/'.
        for i in 0..64 {
            let name = format!("dir{i}/subdir{i}/file-{i}.dat");
            assert!(!encrypt_name(&key, &name).contains('/'));
        }
    }

    #[test]
    fn synthetic_iv_binds_key_and_name() {
        let key_a = DerivedKey::from_bytes([1; 32]);
        let key_b = DerivedKey::from_bytes([2; 32]);
        assert_ne!(synthetic_iv(&key_a, "x"), synthetic_iv(&key_b, "x"));
        assert_ne!(synthetic_iv(&key_a, "x"), synthetic_iv(&key_a, "y"));
    }

    #[test]
    fn synthetic_iv_matches_direct_hmac_chain() {
        use hmac::{Hmac, Mac};
        let key = test_key();

        let mut h1 = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
        h1.update(b"S7aes-256-gcm");
        let h1 = h1.finalize().into_bytes();
        let mut h2 = Hmac::<Sha256>::new_from_slice(&h1).unwrap();
        h2.update("photos/2024/img_0001.jpg".as_bytes());
        let h2 = h2.finalize().into_bytes();

        assert_eq!(
            synthetic_iv(&key, "photos/2024/img_0001.jpg"),
            <[u8; 16]>::try_from(&h2[16..]).unwrap()
        );
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let token = encrypt_name(&test_key(), "secret.txt");
        let err = decrypt_name(&DerivedKey::from_bytes([9; 32]), &token).unwrap_err();
        assert!(matches!(err, CryptoError::Integrity));
    }

    #[test]
    fn tampered_token_rejected() {
        let key = test_key();
        let token = encrypt_name(&key, "secret.txt");
        let mut framed = base64::engine::general_purpose::STANDARD
            .decode(token.replace('_', "/"))
            .unwrap();
        let mid = framed.len() / 2;
        framed[mid] ^= 0x80;
        let tampered = base64::engine::general_purpose::STANDARD
            .encode(framed)
            .replace('/', "_");
        assert!(decrypt_name(&key, &tampered).is_err());
    }
}
