//! # Host Bus
//!
//! Broadcasts host events to every subscriber and remembers the last status
//! each node reported, so a host view attached late can render it.

use crate::events::{EventFilter, HostEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::NodeStatus;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Publishing side of the host bus, as seen by capabilities.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Returns how many subscribers received the event. Zero is normal while
    /// no host view is attached.
    async fn publish(&self, event: HostEvent) -> usize;

    fn published_count(&self) -> u64;
}

/// In-process host bus over `tokio::sync::broadcast`.
///
/// Publishing never waits; a slow subscriber lags and skips events.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<HostEvent>,
    statuses: RwLock<HashMap<String, NodeStatus>>,
    published: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            statuses: RwLock::new(HashMap::new()),
            published: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, nodes = ?filter.node_ids, "Host bus subscription");
        Subscription::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Last status published for `node_id`.
    #[must_use]
    pub fn last_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.statuses.read().get(node_id).copied()
    }

    /// Last status of every node that has reported one, sorted by node id.
    #[must_use]
    pub fn status_snapshot(&self) -> Vec<(String, NodeStatus)> {
        let mut snapshot: Vec<_> = self
            .statuses
            .read()
            .iter()
            .map(|(node, status)| (node.clone(), *status))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: HostEvent) -> usize {
        if let HostEvent::StatusChanged { node_id, status } = &event {
            self.statuses.write().insert(node_id.clone(), *status);
        }
        self.published.fetch_add(1, Ordering::Relaxed);

        let topic = event.topic();
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(topic = ?topic, receivers, "Host event published");
        receivers
    }

    fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
