//! Byte-level encryption on top of [`TriviumCore`].
//!
//! Encryption and decryption are the same XOR with the keystream. Each call
//! continues the keystream where the previous one stopped. Re-keying with
//! the same key and IV restarts it, and two messages encrypted from the same
//! starting point leak `c1 ^ c2 == p1 ^ p2`. Use a fresh IV per message.

use crate::core::TriviumCore;
use crate::error::Result;
use crate::{DEFAULT_WARMUP, TriviumCipher};
use cipher::StreamCipher;
use std::fmt;

/// Trivium with a byte-buffer interface.
pub struct Trivium {
    inner: TriviumCipher,
}

impl Trivium {
    /// Keys the cipher with 10-byte `key` and `iv` and the standard warm-up.
    ///
    /// # Errors
    /// Invalid key or IV length.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        Self::with_warmup(key, iv, DEFAULT_WARMUP)
    }

    /// Like [`Trivium::new`] with a custom warm-up length (0 disables it).
    ///
    /// # Errors
    /// Invalid key or IV length.
    pub fn with_warmup(key: &[u8], iv: &[u8], warmup: usize) -> Result<Self> {
        let core = TriviumCore::from_bytes(key, iv, warmup)?;
        Ok(Self {
            inner: TriviumCipher::from_core(core),
        })
    }

    /// XORs `buf` in place with the next `buf.len()` keystream bytes.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        self.inner.apply_keystream(buf);
    }

    pub fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8> {
        let mut out = plaintext.to_vec();
        self.apply_keystream(&mut out);
        out
    }

    /// Same operation as [`Trivium::encrypt`].
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Vec<u8> {
        self.encrypt(ciphertext)
    }

    /// The next `len` keystream bytes.
    pub fn keystream(&mut self, len: usize) -> Vec<u8> {
        self.encrypt(&vec![0; len])
    }

    /// Keystream bytes consumed since keying.
    pub fn bytes_processed(&self) -> u64 {
        self.inner.get_core().block_pos()
    }
}

impl fmt::Debug for Trivium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trivium")
            .field("bytes_processed", &self.bytes_processed())
            .finish_non_exhaustive()
    }
}
