//! # Host Payloads
//!
//! The host delivers either a text payload (which must contain JSON) or an
//! already-structured value. Capabilities never inspect the runtime type of
//! a payload; they call one of the conversions below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PayloadError;

/// Payload handed to a capability by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HostPayload {
    /// Raw text. Parsed as JSON when a structured value is required.
    Text(String),
    /// Structured JSON value.
    Structured(Value),
}

impl HostPayload {
    /// Convert to a JSON value.
    ///
    /// Text payloads are parsed; a parse failure is `PayloadError::Malformed`.
    pub fn into_json(self) -> Result<Value, PayloadError> {
        match self {
            Self::Structured(value) => Ok(value),
            Self::Text(text) => {
                serde_json::from_str(&text).map_err(|e| PayloadError::Malformed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Render as the body of a method response.
    ///
    /// Structured values are serialized; text is passed through untouched.
    pub fn into_body_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured(value) => value.to_string(),
        }
    }

    /// Decode a raw message body (UTF-8 JSON) received from the edge hub.
    pub fn decode_message_body(body: &[u8]) -> Result<Value, PayloadError> {
        let text = std::str::from_utf8(body).map_err(|e| PayloadError::InvalidEncoding {
            reason: e.to_string(),
        })?;
        serde_json::from_str(text).map_err(|e| PayloadError::Malformed {
            reason: e.to_string(),
        })
    }
}

impl From<Value> for HostPayload {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<&str> for HostPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for HostPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
