//! IE-01 Rendezvous - Late-binding access to resources created elsewhere.
//!
//! A producer publishes a resource (the connectivity client, the twin handle)
//! into a named [`ResourceSlot`] whenever it becomes available. Consumers that
//! start earlier do not wait on the slot; they poll it through a
//! [`BackoffResolver`] that gives up after a bounded number of attempts or as
//! soon as shutdown fires.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   publish / clear   ┌──────────────────┐
//! │   Producer    │ ──────────────────▶ │  ResourceSlot<T> │
//! │ (initializer) │                     │  value, gen      │
//! └───────────────┘                     └────────┬─────────┘
//!                                                │ try_get
//!                         ┌──────────────────────┴─────────┐
//!                         │        BackoffResolver         │
//!                         │  probe → wait(delay_for(n)) →  │
//!                         │  probe ... ← ShutdownSignal    │
//!                         └──────────────────────┬─────────┘
//!                                                ▼
//!                                     Consumer (capability)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ie_01_rendezvous::{BackoffResolver, BackoffSchedule, ResourceSlot, shutdown_channel};
//!
//! let slot = ResourceSlot::<Client>::new("client");
//! let (trigger, signal) = shutdown_channel();
//! let resolver = BackoffResolver::new("client", BackoffSchedule::client(), signal);
//! let client = resolver.resolve_slot(&slot).await?.value;
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{BackoffSchedule, DelayStrategy, ResourceSlot, DEFAULT_DELAY_CYCLE};
pub use error::{ResolveError, SlotError};
pub use service::{
    resolve, shutdown_channel, BackoffResolver, NotReady, Resolution, ShutdownSignal,
    ShutdownTrigger,
};
