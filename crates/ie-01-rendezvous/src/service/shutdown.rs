//! Shutdown signalling over `tokio::sync::watch`.
//!
//! A resolve in progress at teardown must stop probing instead of handing a
//! stale resource to a closed consumer. Every resolve therefore takes a
//! `ShutdownSignal`; the owner of the matching `ShutdownTrigger` fires it.

use std::sync::Arc;
use tokio::sync::watch;

/// Fires a shutdown. Cloneable; firing is idempotent.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

/// Observes a shutdown. Cloneable; every clone sees the same state.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new signal observing this trigger.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the shutdown fires.
    ///
    /// If the trigger is dropped without firing, this never completes.
    pub async fn triggered(&mut self) {
        let fired = self.rx.wait_for(|fired| *fired).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }

    /// Derive a child pair that fires on its own trigger or when this signal
    /// fires, whichever comes first.
    ///
    /// Must be called from within a tokio runtime. The forwarding task ends
    /// once every child signal has been dropped.
    pub fn child(&self) -> (ShutdownTrigger, ShutdownSignal) {
        let (trigger, signal) = shutdown_channel();
        let mut parent = self.clone();
        let forward = trigger.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = parent.triggered() => forward.trigger(),
                _ = forward.tx.closed() => {}
            }
        });
        (trigger, signal)
    }
}
