//! Twin capability: forwards desired-property patches to the host and
//! reports host inputs as reported properties.

use edge_telemetry::log_node_event;
use serde_json::Value;
use shared_types::{HostInput, NodeMessage, NodeStatus};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use super::CapabilityTask;
use crate::ports::StateHandle;

pub(super) async fn run(mut task: CapabilityTask) {
    if task.resolve_client().await.is_none() {
        return task.idle().await;
    }
    let Some(twin) = task.resolve_twin().await else {
        task.surface.set_status(NodeStatus::Disconnected).await;
        return task.idle().await;
    };

    let mut updates = Some(twin.remote_updates());
    loop {
        tokio::select! {
            _ = task.shutdown.triggered() => break,
            patch = next_patch(&mut updates) => match patch {
                Ok(patch) => on_desired(&task, patch).await,
                Err(RecvError::Lagged(skipped)) => {
                    log_node_event!(warn, task.node_id(), "Desired property patches dropped", skipped)
                }
                Err(RecvError::Closed) => {
                    log_node_event!(debug, task.node_id(), "Twin notifications detached");
                    updates = None;
                }
            },
            input = task.inputs.recv() => match input {
                Some(input) => on_report(&task, &twin, input).await,
                None => break,
            },
        }
    }

    task.finish().await;
}

async fn next_patch(updates: &mut Option<broadcast::Receiver<Value>>) -> Result<Value, RecvError> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn on_desired(task: &CapabilityTask, patch: Value) {
    task.surface.set_status(NodeStatus::Desired).await;
    log_node_event!(debug, task.node_id(), "Desired properties received", patch = %patch);
    task.surface.emit(NodeMessage::desired(patch)).await;
    task.surface.set_status(NodeStatus::Connected).await;
}

async fn on_report(task: &CapabilityTask, twin: &Arc<dyn StateHandle>, input: HostInput) {
    task.surface.set_status(NodeStatus::Reported).await;
    let Some(patch) = task.parse_input(input, "twin").await else {
        return;
    };

    match twin.apply_local_update(patch).await {
        Ok(()) => task.surface.set_status(NodeStatus::Connected).await,
        Err(e) => {
            log_node_event!(warn, task.node_id(), "Error updating reported properties", error = %e);
            task.surface.set_status(NodeStatus::Error).await;
        }
    }
}
