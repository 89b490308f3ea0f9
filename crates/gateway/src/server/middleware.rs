//! Axum middleware applied to the router.
//!
//! Includes request correlation, the request log hooks, and the request timeout.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    body::HttpBody,
    extract::{MatchedPath, Query, Request},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::correlation::{self, CorrelationId, REQUEST_ID_HEADER, TRACE_ID_QUERY_PARAM};
use common::ApiResponse;
use tracing::{debug, info, warn, Span};

use super::envelope::Reply;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Establish the request's correlation id and run everything downstream in its scope.
///
/// Preflight (`OPTIONS`) requests pass through uncorrelated. Otherwise the id
/// comes from the `traceId` query parameter when usable, or is generated. It is
/// stored in the request extensions, bound as the ambient id for the whole
/// downstream future, and echoed in the `x-request-id` response header.
pub async fn correlate(mut request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let id = caller_supplied_id(request.uri()).unwrap_or_else(CorrelationId::generate);
    request.extensions_mut().insert(id.clone());
    let header = HeaderValue::from_str(id.as_str());

    let mut response = correlation::scope(id, next.run(request)).await;
    if let Ok(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn caller_supplied_id(uri: &Uri) -> Option<CorrelationId> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    let raw = params.get(TRACE_ID_QUERY_PARAM)?;
    let id = CorrelationId::from_caller(raw);
    if id.is_none() {
        debug!("ignoring unusable caller-supplied trace id");
    }
    id
}

/// Render the bare `408` produced by the timeout layer as a failure envelope.
///
/// Must sit directly outside `TimeoutLayer`.
pub async fn envelope_timeout(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::REQUEST_TIMEOUT || !response.body().is_end_stream() {
        return response;
    }

    warn!(timeout_secs = REQUEST_TIMEOUT.as_secs(), "request timed out");
    Reply(ApiResponse::<()>::failure(
        StatusCode::REQUEST_TIMEOUT.as_u16(),
        "Request timed out",
    ))
    .into_response()
}

/// Span wrapping each request; every event logged while handling it inherits
/// `method`, `uri`, the matched route and the ambient `request_id`.
pub fn request_span(request: &Request) -> Span {
    let request_id = correlation::current_id();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str);
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        route,
        request_id = request_id.as_ref().map(CorrelationId::as_str),
    )
}

/// Response half of the request log: status, latency and body size.
pub fn log_response(response: &Response, latency: Duration, _span: &Span) {
    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .or_else(|| response.body().size_hint().exact());
    info!(
        status = response.status().as_u16(),
        latency_ms = latency.as_millis() as u64,
        content_length,
        "finished processing request"
    );
}
