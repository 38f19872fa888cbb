//! Backoff Resolver
//!
//! Repeatedly probes for a resource until it yields, the attempt budget runs
//! out, or shutdown fires. Probes are cheap non-blocking reads; waiting
//! happens only between them.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::shutdown::ShutdownSignal;
use crate::domain::{BackoffSchedule, ResourceSlot};
use crate::error::ResolveError;

/// A probe found nothing yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotReady {
    reason: String,
}

impl NotReady {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A successful resolve.
#[derive(Debug, Clone)]
pub struct Resolution<T> {
    pub value: T,
    /// Probes run, including the one that yielded.
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Probe until `probe` yields a value.
///
/// The first probe runs immediately. After the n-th failed probe the
/// resolver waits `schedule.delay_for(n)` unless that probe was the last one
/// in the budget; there is never a wait after the final probe. Shutdown is
/// checked before every probe and raced against every wait.
pub async fn resolve<T, F>(
    resource: &str,
    mut probe: F,
    schedule: &BackoffSchedule,
    shutdown: &ShutdownSignal,
) -> Result<Resolution<T>, ResolveError>
where
    F: FnMut() -> Result<T, NotReady>,
{
    let started = Instant::now();
    let max_attempts = schedule.attempts();
    let mut shutdown = shutdown.clone();
    let mut last_reason = String::new();

    for attempt in 1..=max_attempts {
        if shutdown.is_triggered() {
            return Err(cancelled(resource, attempt - 1));
        }

        match probe() {
            Ok(value) => {
                debug!(resource, attempt, "Resource resolved");
                return Ok(Resolution {
                    value,
                    attempts: attempt,
                    elapsed: started.elapsed(),
                });
            }
            Err(not_ready) => last_reason = not_ready.reason,
        }

        if attempt == max_attempts {
            break;
        }

        let delay = schedule.delay_for(attempt);
        trace!(
            resource,
            attempt,
            delay_ms = delay.as_millis() as u64,
            reason = %last_reason,
            "Resource not ready, backing off"
        );

        tokio::select! {
            biased;
            _ = shutdown.triggered() => return Err(cancelled(resource, attempt)),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    warn!(
        resource,
        attempts = max_attempts,
        reason = %last_reason,
        "Giving up on resource"
    );
    Err(ResolveError::Exhausted {
        resource: resource.to_string(),
        attempts: max_attempts,
        last_reason,
    })
}

fn cancelled(resource: &str, attempts: u32) -> ResolveError {
    debug!(resource, attempts, "Resolve cancelled by shutdown");
    ResolveError::Cancelled {
        resource: resource.to_string(),
        attempts,
    }
}

/// A resolver bound to one resource name, schedule and shutdown signal.
#[derive(Debug, Clone)]
pub struct BackoffResolver {
    resource: String,
    schedule: BackoffSchedule,
    shutdown: ShutdownSignal,
}

impl BackoffResolver {
    pub fn new(resource: impl Into<String>, schedule: BackoffSchedule, shutdown: ShutdownSignal) -> Self {
        Self {
            resource: resource.into(),
            schedule,
            shutdown,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    pub async fn resolve<T, F>(&self, probe: F) -> Result<Resolution<T>, ResolveError>
    where
        F: FnMut() -> Result<T, NotReady>,
    {
        resolve(&self.resource, probe, &self.schedule, &self.shutdown).await
    }

    /// Wait for `slot` to hold a value.
    pub async fn resolve_slot<T: ?Sized>(
        &self,
        slot: &ResourceSlot<T>,
    ) -> Result<Resolution<Arc<T>>, ResolveError> {
        self.resolve(|| {
            slot.try_get()
                .ok_or_else(|| NotReady::new(format!("{} not available yet", slot.name())))
        })
        .await
    }
}
