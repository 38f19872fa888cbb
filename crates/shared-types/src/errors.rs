//! # Error Types
//!
//! Errors raised at the host boundary.

use thiserror::Error;

/// A host payload could not be turned into the structured form a capability
/// expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Text payload is not valid JSON.
    #[error("Malformed payload: {reason}")]
    Malformed { reason: String },

    /// Inbound message body is not valid UTF-8.
    #[error("Payload is not valid UTF-8: {reason}")]
    InvalidEncoding { reason: String },
}
