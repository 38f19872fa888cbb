//! IE-03 Edge Client - The shared edge client and the capabilities built on it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         EdgeContext                              │
//! │   client slot   twin slot   correlation queue   root shutdown    │
//! └──────▲──────────────▲──────────────▲─────────────────┬───────────┘
//!        │ publish      │ publish      │ insert/take     │ child
//! ┌──────┴──────────────┴───┐   ┌──────┴─────────────────▼──────────┐
//! │   ClientInitializer     │   │  Capabilities (one task each)     │
//! │ Connecting → Fetching → │   │  twin · input · output · method   │
//! │ Ready ──close()──▶ Closed│   │  resolve slots via backoff        │
//! └──────────┬──────────────┘   └──────────────┬────────────────────┘
//!            │ ConnectivityProvider            │ NodeSurface
//!            ▼                                 ▼
//!     edge transport                      host event bus
//! ```
//!
//! The initializer and the capabilities never signal each other directly:
//! capabilities poll the context's slots through the backoff resolver and
//! degrade to `Disconnected` when the client never shows up.

#![warn(clippy::all)]

pub mod adapters;
pub mod capabilities;
pub mod context;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{BusNodeSurface, LoopbackConnectivity, LoopbackProvider, LoopbackTwin};
pub use capabilities::{spawn_capability, CapabilityHandle};
pub use context::EdgeContext;
pub use domain::{ClientState, DeviceIdentity, EdgeConfig, ResolverSettings, X509Credentials};
pub use error::{
    CapabilityError, ConfigError, ConnError, InitError, LifecycleError, SendError, StateError,
};
pub use ports::{ConnectivityHandle, ConnectivityProvider, NodeSurface, StateHandle};
pub use service::{ClientInitializer, ClientSession};
