//! Per-request correlation ids bound to the handling task.
//!
//! A [`CorrelationId`] is bound with [`scope`] for the lifetime of one request's
//! future and read back anywhere inside it with [`current_id`], without being
//! threaded through function signatures. The binding is stored in Tokio
//! task-local storage, which is re-entered on every poll: the id stays attached
//! across every `.await` of the request, and two interleaved requests on the
//! same worker never observe each other's id.
//!
//! Task-locals are not inherited by `tokio::spawn`. Work scheduled from inside a
//! request that must keep the request's id goes through [`spawn`].

use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Response header carrying the correlation id back to the caller.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Query parameter through which a caller may supply its own correlation id.
pub const TRACE_ID_QUERY_PARAM: &str = "traceId";

/// Longest caller-supplied id that is accepted verbatim.
pub const MAX_CALLER_ID_LEN: usize = 128;

tokio::task_local! {
    static CURRENT: CorrelationId;
}

/// Opaque identifier tying together every log line and response of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh, globally unique id (random UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a caller-supplied id.
    ///
    /// Returns `None` when the value is blank, longer than
    /// [`MAX_CALLER_ID_LEN`], or contains anything other than visible ASCII.
    /// Accepted ids are therefore always valid HTTP header values.
    pub fn from_caller(raw: &str) -> Option<Self> {
        let id = raw.trim();
        if id.is_empty() || id.len() > MAX_CALLER_ID_LEN {
            return None;
        }
        if !id.bytes().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        Some(Self(id.to_owned()))
    }

    /// The id as it appears in logs and the `x-request-id` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run `future` with `id` bound as the ambient correlation id.
///
/// The binding is visible to all code polled as part of `future`, including
/// code that runs after it suspends and resumes.
pub async fn scope<F>(id: CorrelationId, future: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(id, future).await
}

/// The correlation id bound to the running task, or `None` outside any request.
pub fn current_id() -> Option<CorrelationId> {
    CURRENT.try_with(CorrelationId::clone).ok()
}

/// Spawn a task that inherits the caller's ambient correlation id, if any.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current_id() {
        Some(id) => tokio::spawn(CURRENT.scope(id, future)),
        None => tokio::spawn(future),
    }
}
