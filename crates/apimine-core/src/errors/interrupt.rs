//! Cooperative interruption signals.

use super::error_code::{self, ErrorCode};

/// Raised by a checkpoint when a long-running loop must stop.
///
/// `Cancelled` is a user-requested global stop and must always reach the
/// top of the run. `Interrupted` abandons the current unit of work only and
/// may be swallowed at a stage or unit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Interrupt {
    #[error("operation cancelled")]
    Cancelled,

    #[error("operation interrupted")]
    Interrupted,
}

impl Interrupt {
    /// True for the global stop that must never be swallowed.
    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl ErrorCode for Interrupt {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            Self::Interrupted => error_code::INTERRUPTED,
        }
    }
}
