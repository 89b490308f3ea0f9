//! Axum request handlers for all service endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use common::protocol::{ApiResponse, Envelope, HealthResponse};
use envelope_codec::encrypt;
use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::envelope::{Reply, Sealed};
use super::state::AppState;

/// Decrypted request body of `POST /api/v1/demo`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DemoRequest {
    #[garde(length(min = 1, max = 64))]
    pub id: String,
}

/// Plaintext response payload of `POST /api/v1/demo`, sealed before sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoResponse {
    pub id: String,
    pub name: String,
}

/// `POST /api/v1/demo`: encrypted demo endpoint.
///
/// Request and response bodies are `{ "body": <ciphertext> }` envelopes; the
/// response is wrapped in the usual `{ success, statusCode, data, message }`.
pub async fn demo(
    State(state): State<AppState>,
    Sealed(req): Sealed<DemoRequest>,
) -> Reply<Envelope> {
    info!("serving demo request");

    let result = ApiResponse::ok_with_message(
        DemoResponse {
            id: req.id,
            name: "test".into(),
        },
        "success",
    );
    Reply(encrypt(state.cipher.as_ref(), Some(result)).await)
}

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    };
    (StatusCode::OK, Json(body))
}

/// Catch-all 404 handler.
pub async fn not_found() -> Reply<()> {
    Reply(ApiResponse::failure(
        StatusCode::NOT_FOUND.as_u16(),
        "The requested resource does not exist",
    ))
}
