//! # Shared Bus - Host Event Bus
//!
//! Carries everything capabilities hand back to the host flow engine.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Capability  │                    │  Host flow   │
//! │ (twin/input/ │    publish()       │  (status UI, │
//! │ output/meth) │ ──────┐            │  wiring)     │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Host Bus    │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Capabilities never talk to each other over the bus; method responses come
//! back through the correlation queue, not through events.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, HostEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Events buffered per subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

