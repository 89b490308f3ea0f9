//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No key material or decrypted payloads** in any span attribute or log field.
//! - Every line logged while a request is in flight carries that request's
//!   correlation id through the `request` span.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by `RUST_LOG`.

pub mod init;

pub use init::init_telemetry;
