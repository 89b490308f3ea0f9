//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to the `statusCode` carried in [`ApiResponse`](crate::protocol::ApiResponse):
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Validation`] → 400
/// - [`ServiceError::EncryptionFailure`] → 500
/// - [`ServiceError::MalformedPayload`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request carried no usable input (absent envelope, empty body).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The decrypted payload does not satisfy the endpoint's request shape.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Encryption or decryption failed in the cipher layer.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// The decrypted plaintext is not valid JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) | ServiceError::Validation(_) => 400,
            ServiceError::EncryptionFailure(_) => 500,
            ServiceError::MalformedPayload(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// The bare message, without the variant prefix used by `Display`.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::BadRequest(m)
            | ServiceError::Validation(m)
            | ServiceError::EncryptionFailure(m)
            | ServiceError::MalformedPayload(m)
            | ServiceError::Internal(m) => m,
        }
    }
}
