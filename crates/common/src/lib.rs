//! Common types, protocol definitions, errors, and request correlation shared
//! across `envelope-gateway` crates.

pub mod correlation;
pub mod error;
pub mod protocol;

pub use correlation::CorrelationId;
pub use error::ServiceError;
pub use protocol::{ApiResponse, Envelope};
