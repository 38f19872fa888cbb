//! In-memory connectivity.
//!
//! Implements the outbound ports without a cloud transport. The runtime uses
//! it when no transport is linked in; tests use its hooks to inject inbound
//! traffic, invoke methods, push desired patches and simulate failures.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use shared_types::ClientKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::error::{ConnError, SendError, StateError};
use crate::ports::{
    ConnectivityHandle, ConnectivityProvider, InboundMessage, MethodCall, MethodRequest,
    MethodResponder, MethodResponse, OutboundMessage, StateHandle, TwinProperties,
};

const CHANNEL_CAPACITY: usize = 256;
const METHOD_QUEUE_DEPTH: usize = 32;

/// In-memory twin.
pub struct LoopbackTwin {
    properties: RwLock<TwinProperties>,
    updates: Mutex<Option<broadcast::Sender<Value>>>,
    fail_updates: Mutex<Option<String>>,
}

impl LoopbackTwin {
    pub fn new(desired: Value) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            properties: RwLock::new(TwinProperties {
                desired,
                reported: Value::Object(Map::new()),
            }),
            updates: Mutex::new(Some(tx)),
            fail_updates: Mutex::new(None),
        }
    }

    /// Simulate a desired-properties patch from the cloud.
    ///
    /// Returns the number of listeners that received it.
    pub fn push_desired(&self, patch: Value) -> usize {
        merge_patch(&mut self.properties.write().desired, &patch);
        match self.updates.lock().as_ref() {
            Some(tx) => tx.send(patch).unwrap_or(0),
            None => 0,
        }
    }

    pub fn reported(&self) -> Value {
        self.properties.read().reported.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.updates
            .lock()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Reopen notifications after a detach, as a fresh twin fetch does.
    fn reattach_notifications(&self) {
        let mut updates = self.updates.lock();
        if updates.is_none() {
            *updates = Some(broadcast::channel(CHANNEL_CAPACITY).0);
            debug!("Twin notifications reattached");
        }
    }

    /// Make reported-property updates fail with `reason` (`None` restores).
    pub fn fail_updates(&self, reason: Option<&str>) {
        *self.fail_updates.lock() = reason.map(str::to_string);
    }
}

impl Default for LoopbackTwin {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

#[async_trait]
impl StateHandle for LoopbackTwin {
    fn properties(&self) -> TwinProperties {
        self.properties.read().clone()
    }

    async fn apply_local_update(&self, patch: Value) -> Result<(), StateError> {
        if let Some(reason) = self.fail_updates.lock().clone() {
            return Err(StateError::Update(reason));
        }
        merge_patch(&mut self.properties.write().reported, &patch);
        Ok(())
    }

    fn remote_updates(&self) -> broadcast::Receiver<Value> {
        match self.updates.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            // Detached: hand out a receiver that is already closed.
            None => broadcast::channel(1).1,
        }
    }

    fn detach_notifications(&self) {
        if self.updates.lock().take().is_some() {
            debug!("Twin notifications detached");
        }
    }
}

/// Merge `patch` into `target` the way twin patches apply: objects merge
/// recursively and `null` removes a key.
fn merge_patch(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[derive(Default)]
struct Failures {
    open: Option<String>,
    fetch: Option<String>,
    send: Option<String>,
    complete: Option<String>,
}

/// In-memory connectivity client.
pub struct LoopbackConnectivity {
    open: AtomicBool,
    close_calls: AtomicUsize,
    inbound: Mutex<broadcast::Sender<InboundMessage>>,
    errors: Mutex<broadcast::Sender<ConnError>>,
    methods: Mutex<HashMap<String, mpsc::Sender<MethodCall>>>,
    sent: Mutex<Vec<(String, OutboundMessage)>>,
    completed: Mutex<Vec<InboundMessage>>,
    failures: Mutex<Failures>,
    twin: Arc<LoopbackTwin>,
}

impl LoopbackConnectivity {
    pub fn new() -> Self {
        Self::with_twin(Arc::new(LoopbackTwin::default()))
    }

    pub fn with_twin(twin: Arc<LoopbackTwin>) -> Self {
        Self {
            open: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            inbound: Mutex::new(broadcast::channel(CHANNEL_CAPACITY).0),
            errors: Mutex::new(broadcast::channel(CHANNEL_CAPACITY).0),
            methods: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
            twin,
        }
    }

    pub fn twin(&self) -> &Arc<LoopbackTwin> {
        &self.twin
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Deliver a message on `input_name`. Returns the number of listeners.
    pub fn inject_inbound(&self, input_name: &str, body: impl Into<Vec<u8>>) -> usize {
        self.inbound
            .lock()
            .send(InboundMessage::new(input_name, body))
            .unwrap_or(0)
    }

    /// Raise an asynchronous transport error.
    pub fn inject_error(&self, error: ConnError) -> usize {
        self.errors.lock().send(error).unwrap_or(0)
    }

    /// Invoke a direct method as a cloud caller would.
    ///
    /// Returns `None` when no handler is registered for `method`.
    pub async fn invoke_method(
        &self,
        method: &str,
        payload: Option<Value>,
    ) -> Option<oneshot::Receiver<MethodResponse>> {
        let handler = self.methods.lock().get(method).cloned()?;
        let (responder, rx) = MethodResponder::channel();
        let call = MethodCall {
            request: MethodRequest {
                method_name: method.to_string(),
                payload,
            },
            responder,
        };
        handler.send(call).await.ok()?;
        Some(rx)
    }

    pub fn has_method_handler(&self, method: &str) -> bool {
        self.methods.lock().contains_key(method)
    }

    pub fn sent_messages(&self) -> Vec<(String, OutboundMessage)> {
        self.sent.lock().clone()
    }

    pub fn completed_messages(&self) -> Vec<InboundMessage> {
        self.completed.lock().clone()
    }

    pub fn inbound_listener_count(&self) -> usize {
        self.inbound.lock().receiver_count()
    }

    pub fn fail_open(&self, reason: Option<&str>) {
        self.failures.lock().open = reason.map(str::to_string);
    }

    pub fn fail_fetch(&self, reason: Option<&str>) {
        self.failures.lock().fetch = reason.map(str::to_string);
    }

    pub fn fail_send(&self, reason: Option<&str>) {
        self.failures.lock().send = reason.map(str::to_string);
    }

    pub fn fail_complete(&self, reason: Option<&str>) {
        self.failures.lock().complete = reason.map(str::to_string);
    }
}

impl Default for LoopbackConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityHandle for LoopbackConnectivity {
    async fn open(&self) -> Result<(), ConnError> {
        if let Some(reason) = self.failures.lock().open.clone() {
            return Err(ConnError::Open(reason));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), ConnError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn errors(&self) -> broadcast::Receiver<ConnError> {
        self.errors.lock().subscribe()
    }

    fn inbound(&self) -> broadcast::Receiver<InboundMessage> {
        self.inbound.lock().subscribe()
    }

    async fn complete(&self, message: &InboundMessage) -> Result<(), ConnError> {
        if let Some(reason) = self.failures.lock().complete.clone() {
            return Err(ConnError::Complete(reason));
        }
        self.completed.lock().push(message.clone());
        Ok(())
    }

    async fn send_outbound(&self, output: &str, message: OutboundMessage) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::NotOpen);
        }
        if let Some(reason) = self.failures.lock().send.clone() {
            return Err(SendError::Output {
                output: output.to_string(),
                reason,
            });
        }
        self.sent.lock().push((output.to_string(), message));
        Ok(())
    }

    async fn fetch_sync_state(&self) -> Result<Arc<dyn StateHandle>, StateError> {
        if let Some(reason) = self.failures.lock().fetch.clone() {
            return Err(StateError::Fetch(reason));
        }
        self.twin.reattach_notifications();
        Ok(Arc::clone(&self.twin) as Arc<dyn StateHandle>)
    }

    fn register_method_handler(&self, method: &str) -> Result<mpsc::Receiver<MethodCall>, ConnError> {
        let mut methods = self.methods.lock();
        if methods.contains_key(method) {
            return Err(ConnError::HandlerRegistered(method.to_string()));
        }
        let (tx, rx) = mpsc::channel(METHOD_QUEUE_DEPTH);
        methods.insert(method.to_string(), tx);
        Ok(rx)
    }

    fn unregister_method_handler(&self, method: &str) {
        self.methods.lock().remove(method);
    }

    fn remove_all_listeners(&self) {
        // Replacing the senders closes every outstanding receiver.
        *self.inbound.lock() = broadcast::channel(CHANNEL_CAPACITY).0;
        *self.errors.lock() = broadcast::channel(CHANNEL_CAPACITY).0;
        self.methods.lock().clear();
    }
}

/// Provider handing out one shared loopback client.
pub struct LoopbackProvider {
    kind: ClientKind,
    connectivity: Arc<LoopbackConnectivity>,
    create_delay: Duration,
}

impl LoopbackProvider {
    pub fn new(kind: ClientKind) -> Self {
        Self::with_connectivity(kind, Arc::new(LoopbackConnectivity::new()))
    }

    pub fn with_connectivity(kind: ClientKind, connectivity: Arc<LoopbackConnectivity>) -> Self {
        Self {
            kind,
            connectivity,
            create_delay: Duration::ZERO,
        }
    }

    /// Delay every `create()` by `delay`.
    #[must_use]
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn connectivity(&self) -> &Arc<LoopbackConnectivity> {
        &self.connectivity
    }
}

#[async_trait]
impl ConnectivityProvider for LoopbackProvider {
    fn kind(&self) -> ClientKind {
        self.kind
    }

    async fn create(&self) -> Result<Arc<dyn ConnectivityHandle>, ConnError> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        info!(kind = %self.kind, "Created loopback client");
        Ok(Arc::clone(&self.connectivity) as Arc<dyn ConnectivityHandle>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_semantics() {
        let mut target = json!({"a": 1, "nested": {"x": 1, "y": 2}});
        merge_patch(&mut target, &json!({"a": null, "nested": {"y": 3}, "b": true}));
        assert_eq!(target, json!({"nested": {"x": 1, "y": 3}, "b": true}));
    }

    #[tokio::test]
    async fn test_twin_reported_and_desired() {
        let twin = LoopbackTwin::new(json!({"interval": 10}));
        let mut updates = twin.remote_updates();

        assert_eq!(twin.push_desired(json!({"interval": 20})), 1);
        assert_eq!(updates.recv().await.unwrap(), json!({"interval": 20}));
        assert_eq!(twin.properties().desired, json!({"interval": 20}));

        twin.apply_local_update(json!({"status": "ok"})).await.unwrap();
        assert_eq!(twin.reported(), json!({"status": "ok"}));

        twin.fail_updates(Some("offline"));
        assert!(twin.apply_local_update(json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_twin_detach_closes_listeners() {
        let twin = LoopbackTwin::default();
        let mut updates = twin.remote_updates();
        twin.detach_notifications();

        assert!(matches!(
            updates.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(matches!(
            twin.remote_updates().recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert_eq!(twin.push_desired(json!({})), 0);
    }

    #[tokio::test]
    async fn test_fetch_reattaches_detached_twin() {
        let client = LoopbackConnectivity::new();
        let twin = client.fetch_sync_state().await.unwrap();
        twin.detach_notifications();
        assert_eq!(client.twin().push_desired(json!({"a": 1})), 0);

        let twin = client.fetch_sync_state().await.unwrap();
        let mut updates = twin.remote_updates();
        assert_eq!(client.twin().push_desired(json!({"a": 2})), 1);
        assert_eq!(updates.recv().await.unwrap(), json!({"a": 2}));
    }

    #[tokio::test]
    async fn test_send_requires_open() {
        let client = LoopbackConnectivity::new();
        let message = OutboundMessage::json(&json!(1));
        assert_eq!(
            client.send_outbound("output1", message.clone()).await,
            Err(SendError::NotOpen)
        );

        client.open().await.unwrap();
        client.send_outbound("output1", message).await.unwrap();
        assert_eq!(client.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_method_round_trip() {
        let client = LoopbackConnectivity::new();
        let mut calls = client.register_method_handler("reboot").unwrap();
        assert!(client.register_method_handler("reboot").is_err());

        let response = client.invoke_method("reboot", None).await.unwrap();
        let call = calls.recv().await.unwrap();
        assert_eq!(call.request.method_name, "reboot");
        call.responder.send(200, "{}".into()).unwrap();
        assert_eq!(response.await.unwrap().status, 200);

        client.unregister_method_handler("reboot");
        assert!(client.invoke_method("reboot", None).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_all_listeners() {
        let client = LoopbackConnectivity::new();
        let mut inbound = client.inbound();
        let _calls = client.register_method_handler("reboot").unwrap();

        client.remove_all_listeners();

        assert!(matches!(
            inbound.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(!client.has_method_handler("reboot"));
        assert_eq!(client.inject_inbound("input1", "{}"), 0);
    }
}
