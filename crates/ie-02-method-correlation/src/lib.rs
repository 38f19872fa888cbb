//! IE-02 Method Correlation - Matches deferred method responses to the
//! invocations waiting for them.
//!
//! A direct method invocation is emitted to the host flow tagged with a fresh
//! [`CorrelationId`](shared_types::CorrelationId). Some unrelated part of the
//! flow later supplies the response, which lands in the [`CorrelationQueue`].
//! The invocation side polls the queue through the backoff resolver.
//!
//! # Matching
//!
//! - A response that echoes the correlation ID matches only that invocation.
//! - A response without one matches the oldest waiting invocation of the same
//!   method name (FIFO).
//! - Responses nobody claims are dropped after a TTL by [`cleanup_task`].
//!
//! # Usage
//!
//! ```ignore
//! let invocation = Invocation::new("reboot");
//! // ... emit invocation.correlation_id with the method message ...
//! let response = await_response(&queue, &invocation, &schedule, &shutdown).await?;
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{
    CorrelationQueue, Invocation, PendingMethodResponse, QueueStats, ResponseBody, ResponseKey,
    DEFAULT_RESPONSE_STATUS,
};
pub use error::CorrelationError;
pub use service::{await_response, cleanup_task, DEFAULT_RESPONSE_TTL};
