//! The cipher capability consumed by the envelope pipeline.

use async_trait::async_trait;
use thiserror::Error;

use crate::aes::KEY_LEN;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The configured key is not valid base64.
    #[error("key is not valid base64")]
    InvalidKeyEncoding,

    /// AES-GCM-SIV encryption or decryption failed.
    #[error("aead operation failed")]
    AeadFailure,

    /// The ciphertext string does not match the expected format.
    #[error("invalid ciphertext format")]
    InvalidFormat,

    /// Decryption succeeded but the plaintext is not UTF-8.
    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// Failure reported by an external cipher backend.
    #[error("cipher backend failure: {0}")]
    Backend(String),
}

/// Symmetric string cipher: `encrypt(plaintext) -> ciphertext` and back.
///
/// Both directions are asynchronous so that implementations may call out to
/// a remote key service without blocking the runtime.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cipher: Send + Sync {
    /// Encrypt a UTF-8 plaintext into an opaque ciphertext string.
    async fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Decrypt a ciphertext string produced by [`Cipher::encrypt`].
    async fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}
