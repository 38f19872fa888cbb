//! # Edge Runtime Library
//!
//! Exposes the runtime wiring for tests. The main entry point is the
//! `main.rs` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load telemetry and edge configuration from the environment
//! 2. Build the coordination context and the host event bus
//! 3. Spawn one task per configured capability
//! 4. Initialize the shared client, publishing the client and twin slots
//! 5. Run until Ctrl+C, then tear down in reverse order

#![warn(clippy::all)]

pub mod host_log;
pub mod runtime;

pub use host_log::spawn_event_log;
pub use runtime::{EdgeRuntime, RuntimeError};
