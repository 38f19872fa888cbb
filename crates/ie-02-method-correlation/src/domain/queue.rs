//! Correlation Queue - mailbox between the host-input side of a method
//! capability and its waiting invocations.
//!
//! Flow:
//! 1. An invocation arrives and is emitted to the host with a correlation ID
//! 2. The waiting side polls `take_for()` through the backoff resolver
//! 3. The host flow later supplies a response, which is `insert()`ed
//! 4. The next poll finds and removes it; orphans are dropped by
//!    `remove_expired()`

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::response::{Invocation, PendingMethodResponse, ResponseKey};

struct QueuedResponse {
    response: PendingMethodResponse,
    inserted_at: Instant,
}

/// Statistics for the correlation queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total responses inserted
    pub total_inserted: AtomicU64,
    /// Total responses handed to an invocation
    pub total_taken: AtomicU64,
    /// Total responses dropped by TTL expiry
    pub total_expired: AtomicU64,
}

/// Ordered collection of pending method responses.
///
/// Entries with the same key are kept and served in insertion order.
#[derive(Default)]
pub struct CorrelationQueue {
    entries: Mutex<VecDeque<QueuedResponse>>,
    stats: QueueStats,
}

impl CorrelationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a response.
    pub fn insert(&self, response: PendingMethodResponse) {
        debug!(
            method = %response.method_name,
            correlation_id = ?response.correlation_id,
            status = response.status,
            "Queued method response"
        );
        self.entries.lock().push_back(QueuedResponse {
            response,
            inserted_at: Instant::now(),
        });
        self.stats.total_inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove and return the oldest entry matching `key`.
    pub fn take_by_key(&self, key: &ResponseKey) -> Option<PendingMethodResponse> {
        let mut entries = self.entries.lock();
        let position = entries.iter().position(|e| e.response.matches(key))?;
        let taken = entries.remove(position)?;
        drop(entries);

        self.stats.total_taken.fetch_add(1, Ordering::Relaxed);
        debug!(
            key = %key,
            waited_ms = taken.inserted_at.elapsed().as_millis() as u64,
            "Matched method response"
        );
        Some(taken.response)
    }

    /// Take the response for `invocation`: by correlation ID first, then by
    /// method name.
    pub fn take_for(&self, invocation: &Invocation) -> Option<PendingMethodResponse> {
        invocation.keys().iter().find_map(|key| self.take_by_key(key))
    }

    /// Drop entries older than `ttl`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.lock().retain(|entry| {
            let age = now.duration_since(entry.inserted_at);
            if age > ttl {
                warn!(
                    method = %entry.response.method_name,
                    correlation_id = ?entry.response.correlation_id,
                    age_ms = age.as_millis() as u64,
                    "Dropping unclaimed method response"
                );
                removed += 1;
                false
            } else {
                true
            }
        });

        self.stats
            .total_expired
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
