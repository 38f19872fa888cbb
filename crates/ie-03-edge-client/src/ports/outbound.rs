//! # Outbound Ports (Driven Ports)
//!
//! The edge transport as seen by the client and its capabilities. Wire
//! encoding and transport security live behind these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ClientKind;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{ConnError, SendError, StateError};

/// Content type stamped on every outbound message.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content encoding stamped on every outbound message.
pub const UTF8_CONTENT_ENCODING: &str = "utf-8";

/// A message that arrived on one of the module's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub input_name: String,
    pub body: Vec<u8>,
}

impl InboundMessage {
    pub fn new(input_name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            input_name: input_name.into(),
            body: body.into(),
        }
    }
}

/// A message sent to one of the module's outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: String,
    pub content_type: String,
    pub content_encoding: String,
}

impl OutboundMessage {
    /// A UTF-8 JSON message carrying `value`.
    pub fn json(value: &Value) -> Self {
        Self {
            body: value.to_string(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            content_encoding: UTF8_CONTENT_ENCODING.to_string(),
        }
    }
}

/// Desired and reported twin properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinProperties {
    pub desired: Value,
    pub reported: Value,
}

/// A direct method request.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    pub method_name: String,
    pub payload: Option<Value>,
}

/// Response returned to the caller of a direct method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    pub status: i32,
    pub body: String,
}

/// One-shot channel back to the caller of a direct method.
#[derive(Debug)]
pub struct MethodResponder {
    tx: oneshot::Sender<MethodResponse>,
}

impl MethodResponder {
    /// A responder and the receiver the transport awaits.
    pub fn channel() -> (Self, oneshot::Receiver<MethodResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Send the response. Fails if the caller is gone.
    pub fn send(self, status: i32, body: String) -> Result<(), SendError> {
        self.tx
            .send(MethodResponse { status, body })
            .map_err(|_| SendError::Response("caller no longer waiting".to_string()))
    }
}

/// A direct method invocation delivered to a registered handler.
#[derive(Debug)]
pub struct MethodCall {
    pub request: MethodRequest,
    pub responder: MethodResponder,
}

/// Synchronized state ("twin") of the module or device.
#[async_trait]
pub trait StateHandle: Send + Sync {
    fn properties(&self) -> TwinProperties;

    /// Patch the reported properties.
    async fn apply_local_update(&self, patch: Value) -> Result<(), StateError>;

    /// Desired-property patches pushed by the cloud.
    fn remote_updates(&self) -> broadcast::Receiver<Value>;

    /// Stop delivering `remote_updates`. Existing receivers see the stream end.
    fn detach_notifications(&self);
}

/// The shared connectivity client.
#[async_trait]
pub trait ConnectivityHandle: Send + Sync {
    async fn open(&self) -> Result<(), ConnError>;

    async fn close(&self) -> Result<(), ConnError>;

    /// Asynchronous transport errors.
    fn errors(&self) -> broadcast::Receiver<ConnError>;

    /// Messages arriving on any input.
    fn inbound(&self) -> broadcast::Receiver<InboundMessage>;

    /// Acknowledge an inbound message.
    async fn complete(&self, message: &InboundMessage) -> Result<(), ConnError>;

    async fn send_outbound(&self, output: &str, message: OutboundMessage) -> Result<(), SendError>;

    async fn fetch_sync_state(&self) -> Result<Arc<dyn StateHandle>, StateError>;

    /// Route invocations of `method` to the returned receiver.
    fn register_method_handler(&self, method: &str) -> Result<mpsc::Receiver<MethodCall>, ConnError>;

    fn unregister_method_handler(&self, method: &str);

    /// Drop every inbound, error and method listener.
    fn remove_all_listeners(&self);
}

/// Creates connectivity handles.
#[async_trait]
pub trait ConnectivityProvider: Send + Sync {
    fn kind(&self) -> ClientKind;

    async fn create(&self) -> Result<Arc<dyn ConnectivityHandle>, ConnError>;
}
