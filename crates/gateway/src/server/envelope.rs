//! Binds the envelope codec into Axum handlers.
//!
//! - [`Sealed<T>`] extracts `{ "body": <ciphertext> }`, runs
//!   [`decrypt_and_validate`] and hands the handler a validated `T`. Any
//!   failure short-circuits with the failure envelope.
//! - [`Reply<T>`] turns an [`ApiResponse`] into an HTTP response whose status
//!   equals its `statusCode`.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{ApiResponse, Envelope};
use envelope_codec::decrypt_and_validate;
use garde::Validate;
use serde::{de::DeserializeOwned, Serialize};

use super::state::AppState;

/// A decrypted, validated request payload.
#[derive(Debug)]
pub struct Sealed<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for Sealed<T>
where
    T: DeserializeOwned + Validate + Send,
    T::Context: Default,
{
    type Rejection = Reply<()>;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(envelope) = Json::<Envelope>::from_request(req, state)
            .await
            .map_err(|rejection| {
                Reply(ApiResponse::failure(
                    StatusCode::BAD_REQUEST.as_u16(),
                    rejection.body_text(),
                ))
            })?;

        decrypt_and_validate::<T>(state.cipher.as_ref(), &envelope)
            .await
            .into_result()
            .map(Sealed)
            .map_err(Reply)
    }
}

/// HTTP rendering of an [`ApiResponse`].
#[derive(Debug)]
pub struct Reply<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_status_follows_status_code() {
        let resp = Reply(ApiResponse::<()>::failure(400, "No data provided")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Reply(ApiResponse::ok(Envelope::new("v1.a.b"))).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn reply_with_invalid_status_falls_back_to_500() {
        let resp = Reply(ApiResponse::<()>::failure(42, "odd")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
