//! Streaming body encryption and decryption.
//!
//! Every encrypted body is `0x01 || IV[16] || ciphertext || tag[16]` — a
//! fixed 33-byte overhead, so plaintext size + 33 = ciphertext size.
//!
//! [`EncryptReader`] wraps a plaintext reader and yields the framed
//! ciphertext. [`DecryptReader`] wraps a ciphertext reader and yields
//! plaintext, holding back a rolling 16-byte trailer so the tag is never fed
//! to the cipher as ciphertext; when the input ends, the held-back bytes are
//! the tag and verification is forced. Tag mismatch, an unknown version
//! byte, or a stream that ends early all fail the read.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::{AsyncRead, ReadBuf};

use crate::error::CryptoError;
use crate::gcm::GcmCore;
use crate::key::DerivedKey;

/// Format version written as the first byte of every body.
pub const VERSION: u8 = 1;
/// IV length in bytes.
pub const IV_SIZE: usize = 16;
/// Authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;
/// Fixed framing overhead: version byte + IV + tag.
pub const OVERHEAD: u64 = 1 + IV_SIZE as u64 + TAG_SIZE as u64;

const SCRATCH: usize = 8192;

/// Encrypts a plaintext stream into the framed body format.
pub struct EncryptReader<R> {
    inner: R,
    core: GcmCore,
    pending: Vec<u8>,
    pos: usize,
    tag_emitted: bool,
}

impl<R: AsyncRead + Unpin> EncryptReader<R> {
    /// Wraps `inner` with a fresh random IV.
    pub fn new(key: &DerivedKey, inner: R) -> Self {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);
        Self::with_iv(key, iv, inner)
    }

    /// Wraps `inner` with a caller-chosen IV (deterministic name bodies).
    pub fn with_iv(key: &DerivedKey, iv: [u8; IV_SIZE], inner: R) -> Self {
        let core = GcmCore::new(key.as_bytes(), &iv);
        let mut pending = Vec::with_capacity(1 + IV_SIZE);
        pending.push(VERSION);
        pending.extend_from_slice(&iv);
        Self {
            inner,
            core,
            pending,
            pos: 0,
            tag_emitted: false,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for EncryptReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.pos < this.pending.len() {
                let n = buf.remaining().min(this.pending.len() - this.pos);
                buf.put_slice(&this.pending[this.pos..this.pos + n]);
                this.pos += n;
                return Poll::Ready(Ok(()));
            }
            if this.tag_emitted {
                return Poll::Ready(Ok(()));
            }

            let mut scratch = [0u8; SCRATCH];
            let mut read_buf = ReadBuf::new(&mut scratch);
            match Pin::new(&mut this.inner).poll_read(cx, &mut read_buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Ready(Ok(())) => {
                    let filled = read_buf.filled().len();
                    if filled == 0 {
                        this.pending = this.core.finalize_tag().to_vec();
                        this.pos = 0;
                        this.tag_emitted = true;
                    } else {
                        this.pending.clear();
                        this.pending.extend_from_slice(&scratch[..filled]);
                        this.core.encrypt_chunk(&mut this.pending);
                        this.pos = 0;
                    }
                }
            }
        }
    }
}

enum DecryptState {
    Prelude { filled: usize },
    Body { core: GcmCore },
    Done,
}

/// Decrypts a framed body stream back into plaintext.
pub struct DecryptReader<R> {
    inner: R,
    key: DerivedKey,
    state: DecryptState,
    prelude: [u8; 1 + IV_SIZE],
    /// Ciphertext held back until we know it is not part of the tag.
    window: Vec<u8>,
    pending: Vec<u8>,
    pos: usize,
}

impl<R: AsyncRead + Unpin> DecryptReader<R> {
    pub fn new(key: &DerivedKey, inner: R) -> Self {
        Self {
            inner,
            key: key.clone(),
            state: DecryptState::Prelude { filled: 0 },
            prelude: [0u8; 1 + IV_SIZE],
            window: Vec::new(),
            pending: Vec::new(),
            pos: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DecryptReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.pos < this.pending.len() {
                let n = buf.remaining().min(this.pending.len() - this.pos);
                buf.put_slice(&this.pending[this.pos..this.pos + n]);
                this.pos += n;
                return Poll::Ready(Ok(()));
            }

            match &mut this.state {
                DecryptState::Done => return Poll::Ready(Ok(())),

                DecryptState::Prelude { filled } => {
                    let mut read_buf = ReadBuf::new(&mut this.prelude[*filled..]);
                    match Pin::new(&mut this.inner).poll_read(cx, &mut read_buf) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                        Poll::Ready(Ok(())) => {
                            let n = read_buf.filled().len();
                            if n == 0 {
                                return Poll::Ready(Err(CryptoError::Truncated(
                                    "version header and IV",
                                )
                                .into()));
                            }
                            *filled += n;
                            if *filled == this.prelude.len() {
                                if this.prelude[0] != VERSION {
                                    return Poll::Ready(Err(CryptoError::UnsupportedVersion(
                                        this.prelude[0],
                                    )
                                    .into()));
                                }
                                let mut iv = [0u8; IV_SIZE];
                                iv.copy_from_slice(&this.prelude[1..]);
                                this.state = DecryptState::Body {
                                    core: GcmCore::new(this.key.as_bytes(), &iv),
                                };
                            }
                        }
                    }
                }

                DecryptState::Body { core } => {
                    let mut scratch = [0u8; SCRATCH];
                    let mut read_buf = ReadBuf::new(&mut scratch);
                    match Pin::new(&mut this.inner).poll_read(cx, &mut read_buf) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                        Poll::Ready(Ok(())) => {
                            let filled = read_buf.filled().len();
                            if filled == 0 {
                                if this.window.len() < TAG_SIZE {
                                    return Poll::Ready(Err(CryptoError::Truncated(
                                        "authentication tag",
                                    )
                                    .into()));
                                }
                                if !core.verify_tag(&this.window) {
                                    return Poll::Ready(Err(CryptoError::Integrity.into()));
                                }
                                this.state = DecryptState::Done;
                            } else {
                                this.window.extend_from_slice(&scratch[..filled]);
                                if this.window.len() > TAG_SIZE {
                                    let release = this.window.len() - TAG_SIZE;
                                    let mut out: Vec<u8> =
                                        this.window.drain(..release).collect();
                                    core.decrypt_chunk(&mut out);
                                    this.pending = out;
                                    this.pos = 0;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
