//! # Capabilities
//!
//! One tokio task per configured capability node. Each task resolves the
//! shared client (and, for twin nodes, the twin) from the context, then
//! attaches its behavior until teardown.
//!
//! ```text
//!  host ──send(HostInput)──▶ CapabilityHandle ──mpsc──▶ task
//!  host ◀──NodeSurface (messages, status, rejections)─── task
//!  close() ──▶ child shutdown ──▶ cancels resolves, detaches, Disconnected
//! ```

mod input;
mod method;
mod output;
mod twin;

use edge_telemetry::log_node_event;
use edge_telemetry::metrics::{INPUT_REJECTIONS, RESOLVE_ATTEMPTS, RESOLVE_FAILURES};
use ie_01_rendezvous::{BackoffResolver, BackoffSchedule, ResolveError, ResourceSlot, ShutdownSignal, ShutdownTrigger};
use shared_types::{CapabilityConfig, CapabilityKind, HostInput, NodeStatus, PayloadError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::context::{EdgeContext, CLIENT_RESOURCE, TWIN_RESOURCE};
use crate::error::CapabilityError;
use crate::ports::{ConnectivityHandle, NodeSurface, StateHandle};

/// Host inputs buffered per capability while it is resolving or busy.
pub const INPUT_BUFFER: usize = 64;

/// Output name used when a capability is configured with an empty one.
pub const FALLBACK_OUTPUT: &str = "output";

/// Handle to a running capability task.
pub struct CapabilityHandle {
    id: String,
    kind: &'static str,
    inputs: mpsc::Sender<HostInput>,
    trigger: ShutdownTrigger,
    task: JoinHandle<()>,
}

impl CapabilityHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Deliver a host input event.
    pub async fn send(&self, input: HostInput) -> Result<(), CapabilityError> {
        self.inputs
            .send(input)
            .await
            .map_err(|_| CapabilityError::Closed(self.id.clone()))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Tear the capability down and wait for its task to finish.
    pub async fn close(self) {
        self.trigger.trigger();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!(node_id = %self.id, "Capability task panicked");
            }
        }
    }
}

/// Start the capability described by `config`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_capability(
    config: &CapabilityConfig,
    context: Arc<EdgeContext>,
    surface: Arc<dyn NodeSurface>,
) -> CapabilityHandle {
    let (trigger, shutdown) = context.shutdown_signal().child();
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    let task = CapabilityTask {
        context,
        surface,
        shutdown,
        inputs: rx,
    };

    let join = match &config.kind {
        CapabilityKind::Twin { .. } => tokio::spawn(twin::run(task)),
        CapabilityKind::Input { input } => tokio::spawn(input::run(task, input.clone())),
        CapabilityKind::Output { output } => {
            let output = if output.is_empty() {
                FALLBACK_OUTPUT.to_string()
            } else {
                output.clone()
            };
            tokio::spawn(output::run(task, output))
        }
        CapabilityKind::Method { method } => tokio::spawn(method::run(task, method.clone())),
    };

    debug!(node_id = %config.id, kind = config.kind.type_name(), key = config.kind.key(), "Capability started");

    CapabilityHandle {
        id: config.id.clone(),
        kind: config.kind.type_name(),
        inputs: tx,
        trigger,
        task: join,
    }
}

/// State owned by a running capability task.
pub(crate) struct CapabilityTask {
    pub(crate) context: Arc<EdgeContext>,
    pub(crate) surface: Arc<dyn NodeSurface>,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) inputs: mpsc::Receiver<HostInput>,
}

impl CapabilityTask {
    pub(crate) fn node_id(&self) -> &str {
        self.surface.node_id()
    }

    /// Resolve the shared client; status goes `Disconnected -> Connected`.
    pub(crate) async fn resolve_client(&self) -> Option<Arc<dyn ConnectivityHandle>> {
        self.surface.set_status(NodeStatus::Disconnected).await;
        let client = self
            .resolve(CLIENT_RESOURCE, self.context.client_schedule(), self.context.client_slot(), "Module Client")
            .await?;
        self.surface.set_status(NodeStatus::Connected).await;
        Some(client)
    }

    pub(crate) async fn resolve_twin(&self) -> Option<Arc<dyn StateHandle>> {
        self.resolve(TWIN_RESOURCE, self.context.twin_schedule(), self.context.twin_slot(), "Module Twin")
            .await
    }

    async fn resolve<T: ?Sized>(
        &self,
        resource: &'static str,
        schedule: BackoffSchedule,
        slot: &ResourceSlot<T>,
        label: &str,
    ) -> Option<Arc<T>> {
        let resolver = BackoffResolver::new(resource, schedule, self.shutdown.clone());
        match resolver.resolve_slot(slot).await {
            Ok(resolution) => {
                RESOLVE_ATTEMPTS
                    .with_label_values(&[resource])
                    .inc_by(f64::from(resolution.attempts));
                Some(resolution.value)
            }
            Err(e) => {
                RESOLVE_ATTEMPTS
                    .with_label_values(&[resource])
                    .inc_by(f64::from(e.attempts()));
                RESOLVE_FAILURES
                    .with_label_values(&[resource, e.reason_label()])
                    .inc();
                match e {
                    ResolveError::Cancelled { .. } => {
                        log_node_event!(debug, self.node_id(), "Resolve cancelled", resource)
                    }
                    ResolveError::Exhausted { .. } => {
                        log_node_event!(warn, self.node_id(), "Resource can't be loaded", resource = label, error = %e)
                    }
                }
                None
            }
        }
    }

    /// Parse a host payload into JSON, surfacing failures to the host.
    pub(crate) async fn parse_input(&self, input: HostInput, capability: &str) -> Option<serde_json::Value> {
        match input.payload.into_json() {
            Ok(value) => Some(value),
            Err(e) => {
                self.reject(capability, &e).await;
                None
            }
        }
    }

    pub(crate) async fn reject(&self, capability: &str, e: &PayloadError) {
        log_node_event!(warn, self.node_id(), "Rejected host input", error = %e);
        INPUT_REJECTIONS.with_label_values(&[capability]).inc();
        self.surface.reject_input(e.to_string()).await;
        self.surface.set_status(NodeStatus::Error).await;
    }

    /// Capability could not attach: reject host inputs until teardown.
    pub(crate) async fn idle(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.triggered() => break,
                input = self.inputs.recv() => match input {
                    Some(_) => {
                        self.surface
                            .reject_input("edge client unavailable".to_string())
                            .await
                    }
                    None => break,
                },
            }
        }
        self.finish().await;
    }

    pub(crate) async fn finish(&self) {
        self.surface.set_status(NodeStatus::Disconnected).await;
        log_node_event!(debug, self.node_id(), "Capability stopped");
    }
}
