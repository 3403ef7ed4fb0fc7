//! Incremental AES-256-GCM.
//!
//! The body format authenticates an entire stream with a single tag that
//! trails the ciphertext, so the cipher state must accept plaintext and
//! ciphertext in arbitrary chunk sizes and produce the tag only at the end.
//! The one-shot `Aead` API cannot do that; this module assembles the same
//! construction from its parts (NIST SP 800-38D): an AES-CTR keystream
//! starting at `inc32(J0)` and a GHASH accumulator over the ciphertext,
//! finalized as `E_K(J0) XOR GHASH(C || len)`.
//!
//! IVs are 16 bytes, so `J0 = GHASH_H(IV || 0^64 || [128]_64)` rather than
//! the 96-bit fast path. There is no associated data.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit, KeyIvInit, StreamCipher};
use aes::Aes256;
use ghash::universal_hash::UniversalHash;
use ghash::GHash;
use subtle::ConstantTimeEq;

use crate::stream::{IV_SIZE, TAG_SIZE};

const BLOCK: usize = 16;

type Ctr32 = ctr::Ctr32BE<Aes256>;

/// Incremental GCM state for one message under one (key, IV) pair.
pub(crate) struct GcmCore {
    ctr: Ctr32,
    ghash: GHash,
    /// Partial GHASH block carried between chunks.
    pending: [u8; BLOCK],
    pending_len: usize,
    /// Total ciphertext bytes absorbed so far.
    data_len: u64,
    /// `E_K(J0)`, XORed into the GHASH output to form the tag.
    tag_mask: [u8; BLOCK],
}

impl GcmCore {
    pub(crate) fn new(key: &[u8; 32], iv: &[u8; IV_SIZE]) -> Self {
        let aes = Aes256::new(GenericArray::from_slice(key));

        // H = E_K(0^128)
        let mut h = GenericArray::default();
        aes.encrypt_block(&mut h);
        let ghash = GHash::new(&h);

        // J0 = GHASH_H(IV || 0^64 || [len(IV) in bits]_64)
        let mut j0_hash = ghash.clone();
        j0_hash.update(&[GenericArray::clone_from_slice(iv)]);
        let mut len_block = [0u8; BLOCK];
        len_block[8..].copy_from_slice(&((IV_SIZE as u64) * 8).to_be_bytes());
        j0_hash.update(&[GenericArray::clone_from_slice(&len_block)]);
        let j0 = j0_hash.finalize();

        let mut tag_mask_block = j0.clone();
        aes.encrypt_block(&mut tag_mask_block);
        let mut tag_mask = [0u8; BLOCK];
        tag_mask.copy_from_slice(&tag_mask_block);

        // CTR keystream starts at inc32(J0).
        let mut counter = j0;
        let low = u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]);
        counter[12..].copy_from_slice(&low.wrapping_add(1).to_be_bytes());
        let ctr = Ctr32::new(GenericArray::from_slice(key), &counter);

        Self {
            ctr,
            ghash,
            pending: [0u8; BLOCK],
            pending_len: 0,
            data_len: 0,
            tag_mask,
        }
    }

    /// Encrypts a plaintext chunk in place.
    pub(crate) fn encrypt_chunk(&mut self, data: &mut [u8]) {
        self.ctr.apply_keystream(data);
        self.absorb(data);
    }

    /// Decrypts a ciphertext chunk in place.
    pub(crate) fn decrypt_chunk(&mut self, data: &mut [u8]) {
        self.absorb(data);
        self.ctr.apply_keystream(data);
    }

    /// GHASH always runs over the ciphertext side.
    fn absorb(&mut self, mut data: &[u8]) {
        self.data_len += data.len() as u64;

        if self.pending_len > 0 {
            let take = (BLOCK - self.pending_len).min(data.len());
            self.pending[self.pending_len..self.pending_len + take]
                .copy_from_slice(&data[..take]);
            self.pending_len += take;
            data = &data[take..];
            if self.pending_len == BLOCK {
                self.ghash
                    .update(&[GenericArray::clone_from_slice(&self.pending)]);
                self.pending_len = 0;
            }
        }

        let mut blocks = data.chunks_exact(BLOCK);
        for block in &mut blocks {
            self.ghash.update(&[GenericArray::clone_from_slice(block)]);
        }

        let tail = blocks.remainder();
        self.pending[..tail.len()].copy_from_slice(tail);
        self.pending_len = tail.len();
    }

    /// Produces the authentication tag over everything absorbed so far.
    pub(crate) fn finalize_tag(&self) -> [u8; TAG_SIZE] {
        let mut ghash = self.ghash.clone();

        if self.pending_len > 0 {
            let mut block = [0u8; BLOCK];
            block[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
            ghash.update(&[GenericArray::clone_from_slice(&block)]);
        }

        // [len(A)]_64 || [len(C)]_64, with no associated data.
        let mut len_block = [0u8; BLOCK];
        len_block[8..].copy_from_slice(&(self.data_len * 8).to_be_bytes());
        ghash.update(&[GenericArray::clone_from_slice(&len_block)]);

        let s = ghash.finalize();
        let mut tag = [0u8; TAG_SIZE];
        for (i, byte) in tag.iter_mut().enumerate() {
            *byte = s[i] ^ self.tag_mask[i];
        }
        tag
    }

    /// Constant-time tag comparison.
    pub(crate) fn verify_tag(&self, tag: &[u8]) -> bool {
        let computed = self.finalize_tag();
        computed.ct_eq(tag).into()
    }
}
