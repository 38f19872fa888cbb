//! Shared fixtures: a loopback client, a host bus and helpers that wait for
//! host events.

use ie_03_edge_client::{
    spawn_capability, BusNodeSurface, CapabilityHandle, ClientInitializer, ClientSession,
    EdgeContext, LoopbackConnectivity, LoopbackProvider, ResolverSettings,
};
use shared_bus::{EventFilter, HostEvent, InMemoryEventBus, Subscription};
use shared_types::{CapabilityConfig, CapabilityKind, ClientKind, NodeMessage, NodeStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Longest any single wait may take on the paused clock.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct Edge {
    pub context: Arc<EdgeContext>,
    pub connectivity: Arc<LoopbackConnectivity>,
    pub bus: Arc<InMemoryEventBus>,
    pub session: Option<ClientSession>,
}

impl Edge {
    /// Context with a ready client published into its slots.
    pub async fn connected(settings: ResolverSettings) -> Self {
        let provider = LoopbackProvider::new(ClientKind::Module);
        let connectivity = Arc::clone(provider.connectivity());
        let context = Arc::new(EdgeContext::new(settings));
        let session = ClientInitializer::new(Arc::new(provider), Arc::clone(&context))
            .initialize()
            .await
            .expect("loopback initialization");
        Self {
            context,
            connectivity,
            bus: Arc::new(InMemoryEventBus::new()),
            session: Some(session),
        }
    }

    /// Context whose slots stay empty until a test initializes it.
    pub fn empty(settings: ResolverSettings) -> Self {
        Self {
            context: Arc::new(EdgeContext::new(settings)),
            connectivity: Arc::new(LoopbackConnectivity::new()),
            bus: Arc::new(InMemoryEventBus::new()),
            session: None,
        }
    }

    pub fn spawn(&self, id: &str, kind: CapabilityKind) -> (CapabilityHandle, Subscription) {
        let events = self.bus.subscribe(EventFilter::node(id));
        let surface = Arc::new(BusNodeSurface::new(id, Arc::clone(&self.bus) as Arc<_>));
        let handle = spawn_capability(
            &CapabilityConfig::new(id, kind),
            Arc::clone(&self.context),
            surface,
        );
        (handle, events)
    }
}

pub fn method(name: &str) -> CapabilityKind {
    CapabilityKind::Method {
        method: name.to_string(),
    }
}

pub async fn next_event(events: &mut Subscription) -> HostEvent {
    timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for host event")
        .expect("host bus closed")
}

pub async fn wait_status(events: &mut Subscription, want: NodeStatus) {
    loop {
        if let HostEvent::StatusChanged { status, .. } = next_event(events).await {
            if status == want {
                return;
            }
        }
    }
}

pub async fn next_output(events: &mut Subscription) -> NodeMessage {
    loop {
        if let HostEvent::NodeOutput { message, .. } = next_event(events).await {
            return message;
        }
    }
}

/// Poll `condition` on the paused clock until it holds.
pub async fn until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition never became true");
}
