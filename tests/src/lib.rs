//! # Edge Bridge Test Suite
//!
//! Unified test crate for scenarios that span several crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # Loopback client, host bus and event helpers
//!     ├── rendezvous_flows.rs  # Initializer publishes, capabilities resolve
//!     ├── method_flows.rs      # Deferred method responses and correlation
//!     └── runtime_flows.rs     # Full runtime start/deliver/stop
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p edge-tests
//!
//! # By flow
//! cargo test -p edge-tests integration::method_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
