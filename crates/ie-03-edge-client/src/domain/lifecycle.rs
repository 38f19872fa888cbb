//! Client Lifecycle
//!
//! ```text
//! Uninitialized ──▶ Connecting ──▶ FetchingState ──▶ Ready ──▶ Closed
//!                       │               │
//!                       └──────┬────────┘
//!                              ▼
//!                        Failed(reason)
//! ```
//!
//! `Failed` and `Closed` are terminal. A new attempt uses a new lifecycle.

use std::fmt;
use tracing::debug;

use crate::error::LifecycleError;

/// State of the shared edge client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Connecting,
    FetchingState,
    Ready,
    Closed,
    Failed(String),
}

impl ClientState {
    pub fn can_transition_to(&self, next: &ClientState) -> bool {
        use ClientState::*;
        matches!(
            (self, next),
            (Uninitialized, Connecting)
                | (Connecting, FetchingState)
                | (FetchingState, Ready)
                | (Ready, Closed)
                | (Connecting, Failed(_))
                | (FetchingState, Failed(_))
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Connecting => f.write_str("connecting"),
            Self::FetchingState => f.write_str("fetching_state"),
            Self::Ready => f.write_str("ready"),
            Self::Closed => f.write_str("closed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Tracks the current state and rejects invalid transitions.
#[derive(Debug)]
pub struct Lifecycle {
    state: ClientState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ClientState::Uninitialized,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn transition(&mut self, next: ClientState) -> Result<(), LifecycleError> {
        if !self.state.can_transition_to(&next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state.clone(),
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, "Client state transition");
        self.state = next;
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
