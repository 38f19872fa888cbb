//! Output capability: sends host payloads to one module output.

use edge_telemetry::log_node_event;
use edge_telemetry::metrics::MESSAGES_SENT;
use shared_types::{HostInput, NodeStatus};
use std::sync::Arc;

use super::CapabilityTask;
use crate::ports::{ConnectivityHandle, OutboundMessage};

pub(super) async fn run(mut task: CapabilityTask, output_name: String) {
    let Some(client) = task.resolve_client().await else {
        return task.idle().await;
    };

    loop {
        tokio::select! {
            _ = task.shutdown.triggered() => break,
            input = task.inputs.recv() => match input {
                Some(input) => on_input(&task, &client, &output_name, input).await,
                None => break,
            },
        }
    }

    task.finish().await;
}

async fn on_input(
    task: &CapabilityTask,
    client: &Arc<dyn ConnectivityHandle>,
    output_name: &str,
    input: HostInput,
) {
    task.surface.set_status(NodeStatus::Sent).await;
    let Some(value) = task.parse_input(input, "output").await else {
        return;
    };

    match client
        .send_outbound(output_name, OutboundMessage::json(&value))
        .await
    {
        Ok(()) => {
            MESSAGES_SENT.with_label_values(&[output_name, "ok"]).inc();
            log_node_event!(debug, task.node_id(), "Message sent", output = output_name);
            task.surface.set_status(NodeStatus::Connected).await;
        }
        Err(e) => {
            MESSAGES_SENT.with_label_values(&[output_name, "error"]).inc();
            log_node_event!(error, task.node_id(), "Error while sending message", output = output_name, error = %e);
            task.surface.set_status(NodeStatus::Error).await;
        }
    }
}
