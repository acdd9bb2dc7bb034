//! Orchestrator error types.

use std::fmt;

/// Errors from deciding what to do with an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The completion backend failed or timed out.
    BackendFailed { reason: String },
    /// The model's answer is not a decision.
    UnparseableDecision { reason: String },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendFailed { reason } => write!(f, "intent routing failed: {reason}"),
            Self::UnparseableDecision { reason } => {
                write!(f, "could not understand routing decision: {reason}")
            }
        }
    }
}

impl std::error::Error for RouterError {}
