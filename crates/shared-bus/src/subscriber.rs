//! # Event Subscriber
//!
//! Defines the subscription side of the host bus.

use crate::events::{EventFilter, HostEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// A subscription handle for receiving events.
///
/// Dropping the handle unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<HostEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<HostEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next event that matches the filter.
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<HostEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next matching event without waiting.
    ///
    /// - `Ok(Some(event))`: a matching event was buffered
    /// - `Ok(None)`: nothing buffered
    /// - `Err(SubscriptionError::Closed)`: the bus was dropped
    pub fn try_recv(&mut self) -> Result<Option<HostEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    #[must_use]
    pub fn event_filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// A filtered `Stream` of host events.
pub struct EventStream {
    inner: BroadcastStream<HostEvent>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<HostEvent>, filter: EventFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    #[must_use]
    pub fn event_filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = HostEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Event stream lagged, some events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
