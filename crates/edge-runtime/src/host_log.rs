//! Logs host bus traffic when no host flow engine is attached.

use shared_bus::{EventFilter, HostEvent, InMemoryEventBus};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Subscribe to every host event and log it. The task ends when the bus is
/// dropped.
pub fn spawn_event_log(bus: &InMemoryEventBus) -> JoinHandle<()> {
    let mut subscription = bus.subscribe(EventFilter::all());
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            log_event(&event);
        }
        debug!("Host bus closed, event log stopped");
    })
}

fn log_event(event: &HostEvent) {
    match event {
        HostEvent::NodeOutput { node_id, message } => {
            let payload = serde_json::to_string(message).unwrap_or_default();
            info!(node_id = %node_id, message = %payload, "Node output")
        }
        HostEvent::StatusChanged { node_id, status } => {
            debug!(node_id = %node_id, status = status.text(), "Node status")
        }
        HostEvent::InputRejected { node_id, reason } => {
            warn!(node_id = %node_id, reason = %reason, "Host input rejected")
        }
        HostEvent::ClientLifecycle { state } => info!(state = %state, "Client lifecycle"),
    }
}
