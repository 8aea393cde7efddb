//! Automaton engine errors.

use super::error_code::{self, ErrorCode};
use super::Interrupt;

/// Errors raised by automaton (history) operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History invariant violated: {detail}")]
    InvariantViolated { detail: String },

    #[error("Node {index} does not belong to this history")]
    UnknownNode { index: usize },

    #[error(transparent)]
    Interrupt(#[from] Interrupt),
}

impl HistoryError {
    /// The interruption signal carried by this error, if any.
    pub fn interrupt(&self) -> Option<Interrupt> {
        match self {
            Self::Interrupt(i) => Some(*i),
            _ => None,
        }
    }
}

impl ErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvariantViolated { .. } => error_code::INVARIANT_VIOLATED,
            Self::Interrupt(i) => i.error_code(),
            _ => error_code::HISTORY_ERROR,
        }
    }
}
