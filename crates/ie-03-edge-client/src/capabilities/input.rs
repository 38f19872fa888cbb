//! Input capability: forwards messages arriving on one module input.

use edge_telemetry::log_node_event;
use edge_telemetry::metrics::MESSAGES_RECEIVED;
use shared_types::{HostPayload, NodeMessage, NodeStatus};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use super::CapabilityTask;
use crate::ports::{ConnectivityHandle, InboundMessage};

pub(super) async fn run(mut task: CapabilityTask, input_name: String) {
    let Some(client) = task.resolve_client().await else {
        return task.idle().await;
    };

    let mut inbound = Some(client.inbound());
    loop {
        tokio::select! {
            _ = task.shutdown.triggered() => break,
            message = next_message(&mut inbound) => match message {
                Ok(message) => on_message(&task, &client, &input_name, message).await,
                Err(RecvError::Lagged(skipped)) => {
                    log_node_event!(warn, task.node_id(), "Inbound messages dropped", skipped)
                }
                Err(RecvError::Closed) => {
                    log_node_event!(debug, task.node_id(), "Inbound listener removed");
                    inbound = None;
                }
            },
            input = task.inputs.recv() => match input {
                Some(_) => {
                    task.surface
                        .reject_input(format!("input '{input_name}' does not accept host input"))
                        .await
                }
                None => break,
            },
        }
    }

    task.finish().await;
}

async fn next_message(
    inbound: &mut Option<broadcast::Receiver<InboundMessage>>,
) -> Result<InboundMessage, RecvError> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn on_message(
    task: &CapabilityTask,
    client: &Arc<dyn ConnectivityHandle>,
    input_name: &str,
    message: InboundMessage,
) {
    // Every inbound message is acknowledged, whichever input it arrived on.
    if let Err(e) = client.complete(&message).await {
        log_node_event!(error, task.node_id(), "Failed to complete message", error = %e);
        task.surface.set_status(NodeStatus::Error).await;
    }

    if message.input_name != input_name {
        return;
    }

    task.surface.set_status(NodeStatus::Received).await;
    match HostPayload::decode_message_body(&message.body) {
        Ok(payload) if payload.is_null() => {
            log_node_event!(debug, task.node_id(), "Empty message body skipped", input = input_name);
            task.surface.set_status(NodeStatus::Connected).await;
        }
        Ok(payload) => {
            MESSAGES_RECEIVED.with_label_values(&[input_name]).inc();
            log_node_event!(debug, task.node_id(), "Message received", input = input_name);
            task.surface
                .emit(NodeMessage::input(input_name, payload))
                .await;
            task.surface.set_status(NodeStatus::Connected).await;
        }
        Err(e) => task.reject("input", &e).await,
    }
}
