//! The edge runtime: one context, one client session, many capabilities.

use ie_03_edge_client::{
    spawn_capability, BusNodeSurface, CapabilityError, CapabilityHandle, ClientInitializer,
    ClientSession, ConnectivityProvider, EdgeConfig, EdgeContext, InitError,
};
use shared_bus::InMemoryEventBus;
use shared_types::HostInput;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime already started")]
    AlreadyStarted,

    #[error("no capability with id '{0}'")]
    UnknownNode(String),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Owns everything one edge bridge process runs.
pub struct EdgeRuntime {
    config: EdgeConfig,
    bus: Arc<InMemoryEventBus>,
    context: Arc<EdgeContext>,
    capabilities: Vec<CapabilityHandle>,
    session: Option<ClientSession>,
    background: Vec<JoinHandle<()>>,
    started: bool,
}

impl EdgeRuntime {
    pub fn new(config: EdgeConfig, bus: Arc<InMemoryEventBus>) -> Self {
        let context = Arc::new(EdgeContext::new(config.resolver.clone()));
        Self {
            config,
            bus,
            context,
            capabilities: Vec::new(),
            session: None,
            background: Vec::new(),
            started: false,
        }
    }

    /// Start the configured capabilities, then initialize the shared client.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Spawn the method-response cleanup task
    /// 2. Spawn every capability (they start resolving the client slot)
    /// 3. Run the client initializer, which publishes the slots
    ///
    /// An initialization failure is returned, but the capabilities keep
    /// running and settle on `Disconnected` once their budgets run out.
    pub async fn start(&mut self, provider: Arc<dyn ConnectivityProvider>) -> Result<(), RuntimeError> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.started = true;

        info!(
            client_kind = %self.config.client_kind,
            capabilities = self.config.capabilities.len(),
            "Starting edge runtime"
        );

        self.background.push(self.context.spawn_response_cleanup());

        for capability in &self.config.capabilities {
            let surface = Arc::new(BusNodeSurface::new(
                capability.id.clone(),
                Arc::clone(&self.bus) as Arc<_>,
            ));
            let handle = spawn_capability(capability, Arc::clone(&self.context), surface);
            self.capabilities.push(handle);
        }

        let initializer = ClientInitializer::new(provider, Arc::clone(&self.context))
            .with_events(Arc::clone(&self.bus) as Arc<_>);
        match initializer.initialize().await {
            Ok(session) => {
                info!(state = %session.state(), "Edge client ready");
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Edge client initialization failed");
                Err(e.into())
            }
        }
    }

    /// Deliver a host input to the capability with the given node id.
    pub async fn deliver(&self, node_id: &str, input: HostInput) -> Result<(), RuntimeError> {
        let handle = self
            .capabilities
            .iter()
            .find(|handle| handle.id() == node_id)
            .ok_or_else(|| RuntimeError::UnknownNode(node_id.to_string()))?;
        handle.send(input).await?;
        Ok(())
    }

    /// Shut down gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Close every capability (handlers and listeners detach)
    /// 2. Close the client session, clearing both slots
    /// 3. Fire the root shutdown and wait for background tasks
    pub async fn stop(&mut self) {
        info!("Initiating graceful shutdown...");

        for handle in self.capabilities.drain(..) {
            handle.close().await;
        }
        if let Some(session) = self.session.take() {
            session.close().await;
        }

        self.context.shutdown();
        for task in self.background.drain(..) {
            let _ = task.await;
        }

        info!("Shutdown complete");
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<EdgeContext> {
        &self.context
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn session(&self) -> Option<&ClientSession> {
        self.session.as_ref()
    }

    pub fn capability_ids(&self) -> Vec<&str> {
        self.capabilities.iter().map(CapabilityHandle::id).collect()
    }
}
