//! Encrypted request/response envelope pipeline.
//!
//! Adapts an encrypted transport to typed business logic:
//!
//! ```text
//! { body: <ciphertext> } ──decrypt_and_validate──▶ ApiResponse<T>
//!                                                      │ handler
//! ApiResponse<Envelope> ◀──────────encrypt──────── ApiResponse<U>
//! ```
//!
//! The cipher itself is a pluggable [`Cipher`]; [`AesGcmSivCipher`] is the
//! default implementation.

pub mod aes;
pub mod cipher;
pub mod codec;

pub use aes::AesGcmSivCipher;
pub use cipher::{Cipher, CipherError};
pub use codec::{decrypt, decrypt_and_validate, encrypt};
