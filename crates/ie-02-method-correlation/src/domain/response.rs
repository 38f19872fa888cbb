//! Pending responses and the keys that match them to invocations.

use serde::{Deserialize, Serialize};
use shared_types::{CorrelationId, HostPayload};
use std::fmt;

/// Body of a method response: text is sent as is, structured JSON is
/// rendered to text before sending.
pub type ResponseBody = HostPayload;

/// Status used when the host supplies a response without one.
pub const DEFAULT_RESPONSE_STATUS: i32 = 200;

/// A response supplied by the host flow, waiting for its invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMethodResponse {
    pub method_name: String,
    pub body: ResponseBody,
    pub status: i32,
    /// Echo of the invocation's correlation ID, when the producer kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

impl PendingMethodResponse {
    pub fn new(method_name: impl Into<String>, body: impl Into<ResponseBody>, status: i32) -> Self {
        Self {
            method_name: method_name.into(),
            body: body.into(),
            status,
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Whether this entry satisfies `key`.
    ///
    /// An entry addressed to one invocation never matches a bare method-name
    /// key.
    pub fn matches(&self, key: &ResponseKey) -> bool {
        match key {
            ResponseKey::Correlation(id) => self.correlation_id.as_ref() == Some(id),
            ResponseKey::Method(name) => self.correlation_id.is_none() && self.method_name == *name,
        }
    }
}

/// Lookup key into the correlation queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResponseKey {
    Correlation(CorrelationId),
    Method(String),
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKey::Correlation(id) => write!(f, "correlation:{id}"),
            ResponseKey::Method(name) => write!(f, "method:{name}"),
        }
    }
}

/// An invocation waiting for its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub method_name: String,
    pub correlation_id: CorrelationId,
}

impl Invocation {
    /// A new invocation with a freshly generated correlation ID.
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            correlation_id: CorrelationId::new(),
        }
    }

    /// Keys tried in order: the correlation ID, then the method name.
    pub fn keys(&self) -> [ResponseKey; 2] {
        [
            ResponseKey::Correlation(self.correlation_id),
            ResponseKey::Method(self.method_name.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_key_skips_addressed_entries() {
        let id = CorrelationId::new();
        let addressed = PendingMethodResponse::new("reboot", "{}", 200).with_correlation_id(id);
        let bare = PendingMethodResponse::new("reboot", "{}", 200);

        assert!(addressed.matches(&ResponseKey::Correlation(id)));
        assert!(!addressed.matches(&ResponseKey::Method("reboot".into())));
        assert!(bare.matches(&ResponseKey::Method("reboot".into())));
        assert!(!bare.matches(&ResponseKey::Correlation(id)));
    }

    #[test]
    fn test_method_key_is_exact() {
        let bare = PendingMethodResponse::new("reboot", "{}", 200);
        assert!(!bare.matches(&ResponseKey::Method("Reboot".into())));
        assert!(!bare.matches(&ResponseKey::Method("reboot2".into())));
    }

    #[test]
    fn test_invocation_keys_order() {
        let invocation = Invocation::new("reboot");
        let keys = invocation.keys();
        assert_eq!(keys[0], ResponseKey::Correlation(invocation.correlation_id));
        assert_eq!(keys[1], ResponseKey::Method("reboot".into()));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ResponseKey::Method("reboot".into()).to_string(), "method:reboot");
    }
}
