//! Initialization Path
//!
//! Creates and opens the shared client, fetches its twin and publishes both
//! into the context's slots. Runs once per attempt; any failure is fatal to
//! the attempt and leaves the slots empty. An attempt made while another
//! session's handles are published fails before touching the provider.

use ie_01_rendezvous::SlotError;
use parking_lot::Mutex;
use std::fmt;
use shared_bus::{EventPublisher, HostEvent};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::EdgeContext;
use crate::domain::{ClientState, Lifecycle};
use crate::error::{ConnError, InitError};
use crate::ports::{ConnectivityHandle, ConnectivityProvider, StateHandle};

/// Drives one client through `Connecting -> FetchingState -> Ready`.
pub struct ClientInitializer {
    provider: Arc<dyn ConnectivityProvider>,
    context: Arc<EdgeContext>,
    events: Option<Arc<dyn EventPublisher>>,
}

impl ClientInitializer {
    pub fn new(provider: Arc<dyn ConnectivityProvider>, context: Arc<EdgeContext>) -> Self {
        Self {
            provider,
            context,
            events: None,
        }
    }

    /// Publish lifecycle transitions to the host bus.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn initialize(&self) -> Result<ClientSession, InitError> {
        let mut lifecycle = Lifecycle::new();
        self.advance(&mut lifecycle, ClientState::Connecting).await?;

        if let Err(e) = self.ensure_vacant() {
            return Err(self.fail(&mut lifecycle, e.into()).await);
        }

        let (client, error_listener) = match self.connect().await {
            Ok(connected) => connected,
            Err(e) => return Err(self.fail(&mut lifecycle, e.into()).await),
        };

        self.advance(&mut lifecycle, ClientState::FetchingState).await?;

        let twin = match client.fetch_sync_state().await {
            Ok(twin) => twin,
            Err(e) => {
                self.release(&client, error_listener).await;
                return Err(self.fail(&mut lifecycle, e.into()).await);
            }
        };

        let properties = twin.properties();
        info!(
            desired = %properties.desired,
            reported = %properties.reported,
            "Twin properties"
        );

        if let Err(e) = self.publish(&client, &twin) {
            self.release(&client, error_listener).await;
            return Err(self.fail(&mut lifecycle, e).await);
        }

        self.advance(&mut lifecycle, ClientState::Ready).await?;
        info!(kind = %self.provider.kind(), "Client connected");

        Ok(ClientSession {
            client,
            twin,
            context: Arc::clone(&self.context),
            lifecycle: Mutex::new(lifecycle),
            error_listener: Mutex::new(Some(error_listener)),
            events: self.events.clone(),
        })
    }

    async fn connect(&self) -> Result<(Arc<dyn ConnectivityHandle>, JoinHandle<()>), ConnError> {
        let client = self.provider.create().await?;
        let error_listener = spawn_error_listener(client.errors());

        if let Err(e) = client.open().await {
            discard(&client, error_listener).await;
            return Err(e);
        }
        Ok((client, error_listener))
    }

    fn ensure_vacant(&self) -> Result<(), SlotError> {
        if let Some((generation, _)) = self.context.client_slot().try_get_versioned() {
            return Err(SlotError::AlreadyPublished {
                slot: self.context.client_slot().name(),
                generation,
            });
        }
        if let Some((generation, _)) = self.context.twin_slot().try_get_versioned() {
            return Err(SlotError::AlreadyPublished {
                slot: self.context.twin_slot().name(),
                generation,
            });
        }
        Ok(())
    }

    /// Discard a client this attempt created, unless it is the one another
    /// session has published. Providers may hand out a shared handle.
    async fn release(&self, client: &Arc<dyn ConnectivityHandle>, error_listener: JoinHandle<()>) {
        let live = self
            .context
            .client_slot()
            .try_get()
            .is_some_and(|current| same_handle(&current, client));
        if live {
            error_listener.abort();
            warn!("Failed attempt shares the live client; leaving it open");
            return;
        }
        discard(client, error_listener).await;
    }

    fn publish(
        &self,
        client: &Arc<dyn ConnectivityHandle>,
        twin: &Arc<dyn StateHandle>,
    ) -> Result<(), InitError> {
        self.context.client_slot().publish(Arc::clone(client))?;
        if let Err(e) = self.context.twin_slot().publish(Arc::clone(twin)) {
            self.context.client_slot().clear();
            return Err(e.into());
        }
        Ok(())
    }

    async fn advance(&self, lifecycle: &mut Lifecycle, next: ClientState) -> Result<(), InitError> {
        lifecycle.transition(next)?;
        publish_state(self.events.as_deref(), lifecycle.state()).await;
        Ok(())
    }

    async fn fail(&self, lifecycle: &mut Lifecycle, e: InitError) -> InitError {
        error!(error = %e, "Client initialization failed");
        if lifecycle
            .transition(ClientState::Failed(e.to_string()))
            .is_ok()
        {
            publish_state(self.events.as_deref(), lifecycle.state()).await;
        }
        e
    }
}

/// A connected client whose handles are published in the context.
pub struct ClientSession {
    client: Arc<dyn ConnectivityHandle>,
    twin: Arc<dyn StateHandle>,
    context: Arc<EdgeContext>,
    lifecycle: Mutex<Lifecycle>,
    error_listener: Mutex<Option<JoinHandle<()>>>,
    events: Option<Arc<dyn EventPublisher>>,
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("state", &self.state())
            .field("client_generation", &self.context.client_slot().generation())
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

impl ClientSession {
    pub fn state(&self) -> ClientState {
        self.lifecycle.lock().state().clone()
    }

    pub fn client(&self) -> &Arc<dyn ConnectivityHandle> {
        &self.client
    }

    pub fn twin(&self) -> &Arc<dyn StateHandle> {
        &self.twin
    }

    /// Tear the client down and clear both slots. Idempotent.
    pub async fn close(&self) {
        let closed = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.transition(ClientState::Closed).is_ok()
        };
        if !closed {
            debug!("Client session already closed");
            return;
        }

        self.twin.detach_notifications();
        self.client.remove_all_listeners();
        if let Some(listener) = self.error_listener.lock().take() {
            listener.abort();
        }
        if let Err(e) = self.client.close().await {
            warn!(error = %e, "Error closing client");
        }

        self.context.twin_slot().clear();
        self.context.client_slot().clear();
        info!("Client closed");

        publish_state(self.events.as_deref(), &ClientState::Closed).await;
    }
}

fn spawn_error_listener(mut errors: tokio::sync::broadcast::Receiver<ConnError>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match errors.recv().await {
                Ok(e) => error!(error = %e, "Client error"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Client errors dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn same_handle(a: &Arc<dyn ConnectivityHandle>, b: &Arc<dyn ConnectivityHandle>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Close a client that never reached `Ready`.
async fn discard(client: &Arc<dyn ConnectivityHandle>, error_listener: JoinHandle<()>) {
    error_listener.abort();
    client.remove_all_listeners();
    if let Err(e) = client.close().await {
        warn!(error = %e, "Error closing client");
    }
}

async fn publish_state(events: Option<&dyn EventPublisher>, state: &ClientState) {
    if let Some(events) = events {
        events
            .publish(HostEvent::ClientLifecycle {
                state: state.to_string(),
            })
            .await;
    }
}
