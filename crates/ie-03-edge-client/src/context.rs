//! Coordination context shared by the initializer and every capability.

use ie_01_rendezvous::{shutdown_channel, BackoffSchedule, ResourceSlot, ShutdownSignal, ShutdownTrigger};
use ie_02_method_correlation::{cleanup_task, CorrelationQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::ResolverSettings;
use crate::ports::{ConnectivityHandle, StateHandle};

/// Resource name of the connectivity client slot.
pub const CLIENT_RESOURCE: &str = "client";
/// Resource name of the twin slot.
pub const TWIN_RESOURCE: &str = "twin";

/// Owns the resource slots, the method-response queue, the resolver
/// schedules and the root shutdown signal.
pub struct EdgeContext {
    client: ResourceSlot<dyn ConnectivityHandle>,
    twin: ResourceSlot<dyn StateHandle>,
    responses: Arc<CorrelationQueue>,
    settings: ResolverSettings,
    trigger: ShutdownTrigger,
    shutdown: ShutdownSignal,
}

impl EdgeContext {
    pub fn new(settings: ResolverSettings) -> Self {
        let (trigger, shutdown) = shutdown_channel();
        Self {
            client: ResourceSlot::new(CLIENT_RESOURCE),
            twin: ResourceSlot::new(TWIN_RESOURCE),
            responses: Arc::new(CorrelationQueue::new()),
            settings,
            trigger,
            shutdown,
        }
    }

    pub fn client_slot(&self) -> &ResourceSlot<dyn ConnectivityHandle> {
        &self.client
    }

    pub fn twin_slot(&self) -> &ResourceSlot<dyn StateHandle> {
        &self.twin
    }

    pub fn responses(&self) -> &Arc<CorrelationQueue> {
        &self.responses
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn client_schedule(&self) -> BackoffSchedule {
        self.settings.client_schedule()
    }

    pub fn twin_schedule(&self) -> BackoffSchedule {
        self.settings.twin_schedule()
    }

    pub fn response_schedule(&self) -> BackoffSchedule {
        self.settings.response_schedule()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Fire the root shutdown: every capability and in-flight resolve stops.
    pub fn shutdown(&self) {
        self.trigger.trigger();
    }

    pub fn is_shut_down(&self) -> bool {
        self.trigger.is_triggered()
    }

    /// Start dropping unclaimed method responses older than the configured
    /// TTL. The task stops with the root shutdown.
    pub fn spawn_response_cleanup(&self) -> JoinHandle<()> {
        let ttl = self.settings.response_ttl;
        let interval = (ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(cleanup_task(
            Arc::clone(&self.responses),
            ttl,
            interval,
            self.shutdown_signal(),
        ))
    }
}

impl Default for EdgeContext {
    fn default() -> Self {
        Self::new(ResolverSettings::default())
    }
}

impl std::fmt::Debug for EdgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeContext")
            .field("client", &self.client)
            .field("twin", &self.twin)
            .field("pending_responses", &self.responses.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
