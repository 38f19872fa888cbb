//! Awaiting a deferred response through the backoff resolver.

use ie_01_rendezvous::{resolve, BackoffSchedule, NotReady, Resolution, ResolveError, ShutdownSignal};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{CorrelationQueue, Invocation, PendingMethodResponse};
use crate::error::CorrelationError;

/// Age after which an unclaimed response is dropped.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(300);

/// Poll `queue` for the response to `invocation`.
pub async fn await_response(
    queue: &CorrelationQueue,
    invocation: &Invocation,
    schedule: &BackoffSchedule,
    shutdown: &ShutdownSignal,
) -> Result<Resolution<PendingMethodResponse>, CorrelationError> {
    let resource = format!("method response '{}'", invocation.method_name);
    let probe = || {
        queue
            .take_for(invocation)
            .ok_or_else(|| NotReady::new("no matching response queued"))
    };

    match resolve(&resource, probe, schedule, shutdown).await {
        Ok(resolution) => {
            debug!(
                method = %invocation.method_name,
                correlation_id = %invocation.correlation_id,
                attempts = resolution.attempts,
                "Method response resolved"
            );
            Ok(resolution)
        }
        Err(ResolveError::Exhausted { attempts, .. }) => {
            info!(
                method = %invocation.method_name,
                correlation_id = %invocation.correlation_id,
                attempts,
                "Unable to find a response for method"
            );
            Err(CorrelationError::Miss {
                method: invocation.method_name.clone(),
                correlation_id: invocation.correlation_id,
                attempts,
            })
        }
        Err(ResolveError::Cancelled { .. }) => Err(CorrelationError::Cancelled {
            method: invocation.method_name.clone(),
            correlation_id: invocation.correlation_id,
        }),
    }
}

/// Background task dropping responses no invocation claimed within `ttl`.
///
/// Runs until `shutdown` fires.
pub async fn cleanup_task(
    queue: Arc<CorrelationQueue>,
    ttl: Duration,
    interval: Duration,
    mut shutdown: ShutdownSignal,
) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            _ = cleanup_interval.tick() => {
                let removed = queue.remove_expired(ttl);
                if removed > 0 {
                    warn!(removed, "Cleaned up unclaimed method responses");
                }
            }
        }
    }
    debug!("Correlation queue cleanup stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ie_01_rendezvous::shutdown_channel;

    fn one_second_cycle(attempts: u32) -> BackoffSchedule {
        BackoffSchedule::cyclic(attempts, Duration::from_secs(1), 10)
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_supplied_later_is_picked_up() {
        let queue = Arc::new(CorrelationQueue::new());
        let invocation = Invocation::new("reboot");

        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            producer.insert(PendingMethodResponse::new("reboot", "{}", 200));
        });

        let resolution = await_response(
            &queue,
            &invocation,
            &one_second_cycle(20),
            &ShutdownSignal::never(),
        )
        .await
        .unwrap();

        // Probes at t=0 and t=1s miss; the 2s wait ends at t=3s.
        assert_eq!(resolution.attempts, 3);
        assert_eq!(resolution.value.status, 200);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_after_budget() {
        let queue = CorrelationQueue::new();
        let invocation = Invocation::new("reboot");

        let err = await_response(
            &queue,
            &invocation,
            &BackoffSchedule::method_response(),
            &ShutdownSignal::never(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err,
            CorrelationError::Miss {
                method: "reboot".into(),
                correlation_id: invocation.correlation_id,
                attempts: 20,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_by_shutdown() {
        let queue = Arc::new(CorrelationQueue::new());
        let (trigger, signal) = shutdown_channel();
        let invocation = Invocation::new("reboot");

        let waiter = {
            let queue = Arc::clone(&queue);
            let invocation = invocation.clone();
            tokio::spawn(async move {
                await_response(&queue, &invocation, &one_second_cycle(20), &signal).await
            })
        };

        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.trigger();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(!err.is_miss());

        // A response arriving after cancellation stays queued.
        queue.insert(PendingMethodResponse::new("reboot", "{}", 200));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_drops_orphans_and_stops() {
        let queue = Arc::new(CorrelationQueue::new());
        let (trigger, signal) = shutdown_channel();
        queue.insert(PendingMethodResponse::new("orphan", "{}", 200));

        let task = tokio::spawn(cleanup_task(
            Arc::clone(&queue),
            Duration::from_secs(5),
            Duration::from_secs(1),
            signal,
        ));

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(queue.is_empty());
        assert_eq!(queue.stats().total_expired.load(std::sync::atomic::Ordering::Relaxed), 1);

        trigger.trigger();
        task.await.unwrap();
    }
}
