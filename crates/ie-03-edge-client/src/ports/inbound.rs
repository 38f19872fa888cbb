//! # Inbound Ports
//!
//! The host capability surface: how a capability talks back to the host
//! flow that owns it.

use async_trait::async_trait;
use shared_types::{NodeMessage, NodeStatus};

/// Host-side view of one capability node.
#[async_trait]
pub trait NodeSurface: Send + Sync {
    fn node_id(&self) -> &str;

    /// Emit a message into the host flow.
    async fn emit(&self, message: NodeMessage);

    async fn set_status(&self, status: NodeStatus);

    /// Report a host input the capability could not process.
    async fn reject_input(&self, reason: String);
}
