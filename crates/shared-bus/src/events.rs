//! # Host Events
//!
//! Everything a capability hands back to the host flows through the bus as a
//! `HostEvent`: emitted messages, status changes, rejected inputs and
//! client lifecycle transitions.

use serde::{Deserialize, Serialize};
use shared_types::{NodeMessage, NodeStatus};

/// All events that can be published to the host bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HostEvent {
    /// A capability emitted a message into the host flow.
    NodeOutput {
        node_id: String,
        message: NodeMessage,
    },

    /// A capability changed its displayed status.
    StatusChanged { node_id: String, status: NodeStatus },

    /// A host input could not be processed (e.g. malformed payload).
    InputRejected { node_id: String, reason: String },

    /// The shared edge client moved to a new lifecycle state.
    ClientLifecycle { state: String },
}

impl HostEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NodeOutput { .. } => EventTopic::Output,
            Self::StatusChanged { .. } => EventTopic::Status,
            Self::InputRejected { .. } => EventTopic::Rejection,
            Self::ClientLifecycle { .. } => EventTopic::Lifecycle,
        }
    }

    /// Node the event belongs to, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeOutput { node_id, .. }
            | Self::StatusChanged { node_id, .. }
            | Self::InputRejected { node_id, .. } => Some(node_id),
            Self::ClientLifecycle { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Output,
    Status,
    Rejection,
    Lifecycle,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Nodes to include. Empty means all nodes; node-less events always pass.
    pub node_ids: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            node_ids: Vec::new(),
        }
    }

    /// Create a filter for events of a single node.
    #[must_use]
    pub fn node(node_id: impl Into<String>) -> Self {
        Self {
            topics: Vec::new(),
            node_ids: vec![node_id.into()],
        }
    }

    /// Restrict an existing filter to the given topics.
    #[must_use]
    pub fn with_topics(mut self, topics: Vec<EventTopic>) -> Self {
        self.topics = topics;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &HostEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let node_match = self.node_ids.is_empty()
            || event
                .node_id()
                .map_or(true, |id| self.node_ids.iter().any(|n| n == id));

        topic_match && node_match
    }
}
