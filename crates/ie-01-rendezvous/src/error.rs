//! Error types for the rendezvous subsystem

use thiserror::Error;

/// Errors from resource slot mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The slot already holds a live value; clear it before republishing.
    #[error("Resource slot '{slot}' already published (generation {generation})")]
    AlreadyPublished {
        slot: &'static str,
        generation: u64,
    },
}

/// Errors from the backoff resolver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Every probe in the attempt budget reported "not ready".
    #[error("Unable to resolve {resource} after {attempts} attempts: {last_reason}")]
    Exhausted {
        resource: String,
        attempts: u32,
        last_reason: String,
    },

    /// Shutdown fired while the resolve was in progress.
    #[error("Resolution of {resource} cancelled after {attempts} attempts")]
    Cancelled { resource: String, attempts: u32 },
}

impl ResolveError {
    /// Number of probes that ran before the resolve gave up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short label for metrics.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::Exhausted { .. } => "exhausted",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
