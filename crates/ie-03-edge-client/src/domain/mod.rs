//! Domain layer: client lifecycle and configuration.

pub mod config;
pub mod lifecycle;

pub use config::{
    default_capabilities, load_capabilities, DeviceConfig, DeviceIdentity, EdgeConfig,
    ResolverSettings, X509Credentials,
};
pub use lifecycle::{ClientState, Lifecycle};
