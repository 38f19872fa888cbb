//! Service layer: the backoff resolver and shutdown signalling.

pub mod resolver;
pub mod shutdown;

pub use resolver::{resolve, BackoffResolver, NotReady, Resolution};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
