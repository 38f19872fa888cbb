//! Adapters: the host bus surface and the in-memory transport.

pub mod host_bus;
pub mod loopback;

pub use host_bus::BusNodeSurface;
pub use loopback::{LoopbackConnectivity, LoopbackProvider, LoopbackTwin};
