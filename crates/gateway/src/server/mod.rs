//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Establish the per-request correlation scope and request log span.
//! - Bind the envelope codec into handlers (`Sealed<T>` in, `Reply<T>` out).
//! - Inject shared application state (`AppState`) into handlers.

pub mod envelope;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
