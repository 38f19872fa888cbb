//! # Shared Types Crate
//!
//! Types that cross the boundary between the host flow engine and the edge
//! client capabilities.
//!
//! ## Design Principles
//!
//! - **Typed Host Boundary**: Host payloads arrive as an explicit
//!   `HostPayload` (text or structured). Parsing is a single, fallible step
//!   that yields `PayloadError::Malformed` instead of silently falling through.
//! - **Explicit Correlation**: Method invocations carry a `CorrelationId`
//!   that the response producer may echo back.
//! - **Status Vocabulary**: `NodeStatus` is the only way capabilities report
//!   their state to the host.

pub mod capability;
pub mod correlation;
pub mod errors;
pub mod message;
pub mod payload;
pub mod status;

pub use capability::{CapabilityConfig, CapabilityKind, ClientKind};
pub use correlation::CorrelationId;
pub use errors::PayloadError;
pub use message::{HostInput, MessageTopic, NodeMessage};
pub use payload::HostPayload;
pub use status::{NodeStatus, StatusFill, StatusIndicator};
