//! Method capability: hands direct method invocations to the host flow and
//! returns the response the flow supplies later.
//!
//! The invocation is emitted with a fresh correlation ID and the wait runs in
//! its own task, so several invocations of the same method can be in flight.
//! Host inputs become pending responses in the shared correlation queue.

use edge_telemetry::log_node_event;
use edge_telemetry::metrics::{CORRELATION_MISSES, METHOD_RESPONSES_SENT, PENDING_RESPONSES};
use ie_01_rendezvous::{BackoffSchedule, ShutdownSignal};
use ie_02_method_correlation::{
    await_response, CorrelationError, CorrelationQueue, Invocation, PendingMethodResponse,
    DEFAULT_RESPONSE_STATUS,
};
use shared_types::{HostInput, NodeMessage, NodeStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::CapabilityTask;
use crate::ports::{MethodCall, NodeSurface};

pub(super) async fn run(mut task: CapabilityTask, method_name: String) {
    let Some(client) = task.resolve_client().await else {
        return task.idle().await;
    };

    let mut calls = match client.register_method_handler(&method_name) {
        Ok(calls) => Some(calls),
        Err(e) => {
            log_node_event!(error, task.node_id(), "Could not register method handler", method = %method_name, error = %e);
            task.surface.set_status(NodeStatus::Error).await;
            return task.idle().await;
        }
    };
    log_node_event!(info, task.node_id(), "Method handler registered", method = %method_name);

    let mut waiting = JoinSet::new();
    loop {
        tokio::select! {
            _ = task.shutdown.triggered() => break,
            call = next_call(&mut calls) => match call {
                Some(call) => {
                    let invocation = announce(&task, &method_name, &call).await;
                    waiting.spawn(respond_when_ready(
                        invocation,
                        call,
                        Arc::clone(&task.surface),
                        Arc::clone(task.context.responses()),
                        task.context.response_schedule(),
                        task.shutdown.clone(),
                    ));
                }
                None => {
                    log_node_event!(debug, task.node_id(), "Method handler removed", method = %method_name);
                    calls = None;
                }
            },
            input = task.inputs.recv() => match input {
                Some(input) => on_response(&task, &method_name, input),
                None => break,
            },
            Some(_) = waiting.join_next(), if !waiting.is_empty() => {}
        }
    }

    client.unregister_method_handler(&method_name);
    // In-flight waits observe the same shutdown and finish promptly.
    while waiting.join_next().await.is_some() {}
    task.finish().await;
}

async fn next_call(calls: &mut Option<mpsc::Receiver<MethodCall>>) -> Option<MethodCall> {
    match calls {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Emit the invocation to the host flow.
async fn announce(task: &CapabilityTask, method_name: &str, call: &MethodCall) -> Invocation {
    let invocation = Invocation::new(method_name);
    task.surface.set_status(NodeStatus::Method).await;
    log_node_event!(
        info,
        task.node_id(),
        "Direct method called",
        method = %method_name,
        correlation_id = %invocation.correlation_id
    );
    task.surface
        .emit(NodeMessage::method(
            method_name,
            call.request.payload.clone(),
            invocation.correlation_id,
        ))
        .await;
    invocation
}

async fn respond_when_ready(
    invocation: Invocation,
    call: MethodCall,
    surface: Arc<dyn NodeSurface>,
    queue: Arc<CorrelationQueue>,
    schedule: BackoffSchedule,
    shutdown: ShutdownSignal,
) {
    let result = await_response(&queue, &invocation, &schedule, &shutdown).await;
    PENDING_RESPONSES.set(queue.len() as f64);

    match result {
        Ok(resolution) => {
            let response = resolution.value;
            surface.set_status(NodeStatus::Response).await;
            let status = response.status;
            let body = response.body.into_body_text();
            match call.responder.send(status, body) {
                Ok(()) => {
                    let status_label = status.to_string();
                    METHOD_RESPONSES_SENT
                        .with_label_values(&[invocation.method_name.as_str(), status_label.as_str()])
                        .inc();
                    log_node_event!(
                        info,
                        surface.node_id(),
                        "Method response sent",
                        method = %invocation.method_name,
                        status,
                        attempts = resolution.attempts
                    );
                }
                Err(e) => {
                    log_node_event!(error, surface.node_id(), "Failed sending method response", error = %e)
                }
            }
        }
        Err(CorrelationError::Miss { attempts, .. }) => {
            CORRELATION_MISSES.inc();
            log_node_event!(
                warn,
                surface.node_id(),
                "No response supplied for method",
                method = %invocation.method_name,
                correlation_id = %invocation.correlation_id,
                attempts
            );
        }
        Err(CorrelationError::Cancelled { .. }) => {
            log_node_event!(debug, surface.node_id(), "Method response wait cancelled", method = %invocation.method_name);
            return;
        }
    }
    surface.set_status(NodeStatus::Connected).await;
}

fn on_response(task: &CapabilityTask, method_name: &str, input: HostInput) {
    let mut response = PendingMethodResponse::new(
        method_name,
        input.payload,
        input.status.unwrap_or(DEFAULT_RESPONSE_STATUS),
    );
    response.correlation_id = input.correlation_id;

    let queue = task.context.responses();
    queue.insert(response);
    PENDING_RESPONSES.set(queue.len() as f64);
}
