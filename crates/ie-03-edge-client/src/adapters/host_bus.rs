//! Node surface over the shared host event bus.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{EventPublisher, HostEvent};
use shared_types::{NodeMessage, NodeStatus};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::ports::NodeSurface;

/// Publishes a capability's messages, status changes and rejections as
/// `HostEvent`s.
pub struct BusNodeSurface {
    node_id: String,
    bus: Arc<dyn EventPublisher>,
    status: Mutex<Option<NodeStatus>>,
}

impl BusNodeSurface {
    pub fn new(node_id: impl Into<String>, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            node_id: node_id.into(),
            bus,
            status: Mutex::new(None),
        }
    }

    /// Last status set, if any.
    pub fn status(&self) -> Option<NodeStatus> {
        *self.status.lock()
    }
}

#[async_trait]
impl NodeSurface for BusNodeSurface {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    async fn emit(&self, message: NodeMessage) {
        trace!(node_id = %self.node_id, topic = ?message.topic, "Emitting message");
        self.bus
            .publish(HostEvent::NodeOutput {
                node_id: self.node_id.clone(),
                message,
            })
            .await;
    }

    async fn set_status(&self, status: NodeStatus) {
        *self.status.lock() = Some(status);
        self.bus
            .publish(HostEvent::StatusChanged {
                node_id: self.node_id.clone(),
                status,
            })
            .await;
    }

    async fn reject_input(&self, reason: String) {
        debug!(node_id = %self.node_id, %reason, "Input rejected");
        self.bus
            .publish(HostEvent::InputRejected {
                node_id: self.node_id.clone(),
                reason,
            })
            .await;
    }
}
