//! # Node Messages
//!
//! Messages exchanged between capabilities and the host flow.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationId;
use crate::payload::HostPayload;

/// Topic of a message emitted by a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTopic {
    /// Desired twin properties changed.
    Desired,
    /// Message received on a module input.
    Input,
    /// Direct method invoked.
    Method,
}

/// Message emitted by a capability into the host flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMessage {
    pub topic: MessageTopic,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

impl NodeMessage {
    /// A desired-properties patch from the twin.
    pub fn desired(patch: Value) -> Self {
        Self {
            topic: MessageTopic::Desired,
            payload: patch,
            input: None,
            method: None,
            correlation_id: None,
        }
    }

    /// A message that arrived on the named module input.
    pub fn input(input: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: MessageTopic::Input,
            payload,
            input: Some(input.into()),
            method: None,
            correlation_id: None,
        }
    }

    /// A direct method invocation awaiting a response from the flow.
    ///
    /// An absent request payload is emitted as JSON `null`.
    pub fn method(
        method: impl Into<String>,
        payload: Option<Value>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            topic: MessageTopic::Method,
            payload: payload.unwrap_or(Value::Null),
            input: None,
            method: Some(method.into()),
            correlation_id: Some(correlation_id),
        }
    }
}

/// Event delivered by the host to a capability: a twin patch to report, a
/// payload to send, or a method response to supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInput {
    pub payload: HostPayload,
    /// Method response status; ignored by non-method capabilities.
    #[serde(default)]
    pub status: Option<i32>,
    /// Echo of the correlation ID from an emitted method message.
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
}

impl HostInput {
    pub fn new(payload: impl Into<HostPayload>) -> Self {
        Self {
            payload: payload.into(),
            status: None,
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_message_defaults_to_null_payload() {
        let id = CorrelationId::new();
        let msg = NodeMessage::method("reboot", None, id);
        assert_eq!(msg.topic, MessageTopic::Method);
        assert_eq!(msg.payload, Value::Null);
        assert_eq!(msg.method.as_deref(), Some("reboot"));
        assert_eq!(msg.correlation_id, Some(id));
    }

    #[test]
    fn test_message_serialization_omits_empty_fields() {
        let msg = NodeMessage::desired(json!({"interval": 10}));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"topic": "desired", "payload": {"interval": 10}}));
    }

    #[test]
    fn test_host_input_deserializes_without_optionals() {
        let input: HostInput =
            serde_json::from_value(json!({"payload": {"kind": "text", "value": "{}"}})).unwrap();
        assert_eq!(input.payload, HostPayload::from("{}"));
        assert_eq!(input.status, None);
        assert_eq!(input.correlation_id, None);
    }
}
