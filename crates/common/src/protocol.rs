//! Request and response types exchanged between components.
//!
//! Every response body produced by the gateway, success or failure, is an
//! [`ApiResponse`]. Encrypted endpoints additionally wrap their payloads in an
//! [`Envelope`] carrying a single ciphertext string.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Uniform `{ success, statusCode, data, message }` result shape.
///
/// Built through [`ApiResponse::ok`], [`ApiResponse::ok_with_message`] or
/// [`ApiResponse::failure`], which keep `success` in step with a 2xx
/// `status_code` and a present `data`. Failures always carry a `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// `true` iff `data` holds a well-formed payload and `status_code` is 2xx.
    pub success: bool,
    /// HTTP-style status code classifying the outcome.
    pub status_code: u16,
    /// The payload; absent on failures produced by this crate.
    pub data: Option<T>,
    /// Failure reason, or an optional success message.
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A `200` success carrying `data` and no message.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            status_code: 200,
            data: Some(data),
            message: None,
        }
    }

    /// A `200` success carrying `data` and a human-readable message.
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    /// A failure with the given status code and message; `data` is absent.
    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Replace the payload, keeping `success`, `status_code` and `message`.
    pub fn with_data<U>(self, data: U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            status_code: self.status_code,
            data: Some(data),
            message: self.message,
        }
    }

    /// Split into the payload on success, or a payload-free failure.
    ///
    /// # Errors
    ///
    /// Returns the failure (with `data` dropped) when `success` is false or
    /// no payload is present.
    pub fn into_result(self) -> Result<T, ApiResponse<()>> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(ApiResponse {
                success: false,
                status_code: self.status_code,
                data: None,
                message: self.message,
            }),
        }
    }
}

impl<T> From<ServiceError> for ApiResponse<T> {
    fn from(err: ServiceError) -> Self {
        Self::failure(err.http_status(), err.message())
    }
}

// ---------------------------------------------------------------------------
// Ciphertext envelope
// ---------------------------------------------------------------------------

/// Transport wrapper carrying one ciphertext string as a request or response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Encrypted, serialised JSON document.
    pub body: String,
}

impl Envelope {
    /// Wrap a ciphertext string.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: String,
    /// Crate version of the running gateway.
    pub version: String,
}
