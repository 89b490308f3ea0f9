//! AES-256-GCM-SIV implementation of [`Cipher`].
//!
//! **Algorithm choice:** AES-256-GCM-SIV (RFC 8452) is nonce-misuse-resistant.
//! A fresh random 96-bit nonce is still drawn for every envelope.
//!
//! # Ciphertext format
//!
//! ```text
//! v1.<base64url-no-pad(nonce)>.<base64url-no-pad(ciphertext+tag)>
//! ```
//!
//! The `v1` prefix enables future algorithm or key-version migration without
//! breaking existing ciphertext.

use std::fmt;
use std::str::FromStr;

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use async_trait::async_trait;
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};

use crate::cipher::{Cipher, CipherError};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Prefix that appears at the start of every ciphertext string.
pub const VERSION_PREFIX: &str = "v1";

/// A parsed ciphertext string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedText {
    /// Raw nonce bytes.
    pub nonce: [u8; NONCE_LEN],
    /// Raw ciphertext + authentication tag bytes.
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for SealedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(self.nonce),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
        )
    }
}

impl FromStr for SealedText {
    type Err = CipherError;

    /// Parse a `v1.<nonce>.<ciphertext>` string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(3, '.').collect();
        if parts.len() != 3 || parts[0] != VERSION_PREFIX {
            return Err(CipherError::InvalidFormat);
        }
        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| CipherError::InvalidFormat)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CipherError::InvalidFormat);
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&nonce_bytes);

        let ciphertext = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| CipherError::InvalidFormat)?;

        Ok(Self { nonce, ciphertext })
    }
}

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// Zeroed on drop; never printed.
struct KeyBytes(Box<[u8; KEY_LEN]>);

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// [`Cipher`] backed by a single static AES-256-GCM-SIV key.
#[derive(Debug)]
pub struct AesGcmSivCipher {
    key: KeyBytes,
}

impl AesGcmSivCipher {
    /// Build a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength);
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key);
        Ok(Self { key: KeyBytes(buf) })
    }

    /// Build a cipher from a standard-base64 encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyEncoding`] if the value is not base64,
    /// or [`CipherError::InvalidKeyLength`] if it does not decode to [`KEY_LEN`] bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let mut raw = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CipherError::InvalidKeyEncoding)?;
        let cipher = Self::new(&raw);
        raw.iter_mut().for_each(|b| *b = 0);
        cipher
    }

    /// Seal `plaintext` under a freshly generated nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedText, CipherError> {
        let cipher = self.build()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CipherError::AeadFailure)?;

        Ok(SealedText {
            nonce: nonce_bytes,
            ciphertext,
        })
    }

    /// Open a [`SealedText`] back to plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::AeadFailure`] if authentication fails (wrong key or tampered data).
    pub fn open(&self, sealed: &SealedText) -> Result<Vec<u8>, CipherError> {
        let cipher = self.build()?;
        let nonce = Nonce::from_slice(&sealed.nonce);
        cipher
            .decrypt(nonce, sealed.ciphertext.as_ref())
            .map_err(|_| CipherError::AeadFailure)
    }

    fn build(&self) -> Result<Aes256GcmSiv, CipherError> {
        Aes256GcmSiv::new_from_slice(&self.key.0[..]).map_err(|_| CipherError::InvalidKeyLength)
    }
}

#[async_trait]
impl Cipher for AesGcmSivCipher {
    async fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        Ok(self.seal(plaintext.as_bytes())?.to_string())
    }

    async fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let sealed: SealedText = ciphertext.parse()?;
        let plaintext = self.open(&sealed)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}
