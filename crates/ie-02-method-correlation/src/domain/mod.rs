//! Domain layer: pending responses, lookup keys and the correlation queue.

pub mod queue;
pub mod response;

pub use queue::{CorrelationQueue, QueueStats};
pub use response::{
    Invocation, PendingMethodResponse, ResponseBody, ResponseKey, DEFAULT_RESPONSE_STATUS,
};
