//! Axum router construction.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnRequest, TraceLayer},
};
use tracing::Level;

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Layer order, outermost first: correlation, compression, timeout envelope,
/// timeout, request log. The request log span is therefore always created
/// inside the request's correlation scope.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/demo", post(handlers::demo))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::request_span)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(middleware::log_response),
        )
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(from_fn(middleware::envelope_timeout))
        .layer(CompressionLayer::new())
        .layer(from_fn(middleware::correlate))
        .with_state(state)
}
