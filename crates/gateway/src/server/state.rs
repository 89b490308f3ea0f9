//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use envelope_codec::Cipher;

/// Application state shared across all request handlers.
///
/// Cheap to clone: the cipher is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Cipher used to open request envelopes and seal response envelopes.
    pub cipher: Arc<dyn Cipher>,
}

impl AppState {
    /// Create a new [`AppState`] around the given cipher.
    pub fn new(cipher: Arc<dyn Cipher>) -> Self {
        Self { cipher }
    }
}
