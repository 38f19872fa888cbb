//! Error types for method response correlation

use shared_types::CorrelationId;
use thiserror::Error;

/// Errors from awaiting a method response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// No response arrived within the attempt budget.
    #[error("No response for method '{method}' ({correlation_id}) after {attempts} attempts")]
    Miss {
        method: String,
        correlation_id: CorrelationId,
        attempts: u32,
    },

    /// Shutdown fired while waiting.
    #[error("Wait for method '{method}' ({correlation_id}) response cancelled")]
    Cancelled {
        method: String,
        correlation_id: CorrelationId,
    },
}

impl CorrelationError {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }
}
