//! Query construction and search errors.

use super::error_code::{self, ErrorCode};
use super::{HistoryError, Interrupt};

/// Errors raised while building queries or searching a corpus.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Query steps {position} and {next} are both unknown; unknown steps cannot be chained")]
    ChainedUnknown { position: usize, next: usize },

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Cannot parse query step '{token}'")]
    InvalidStep { token: String },

    #[error("Top-k must be at least 1")]
    ZeroTopK,

    #[error("History error during search: {0}")]
    History(HistoryError),

    #[error(transparent)]
    Interrupt(#[from] Interrupt),
}

impl SearchError {
    /// Wrap a history error, lifting an interruption out of it.
    pub fn from_history(err: HistoryError) -> Self {
        match err {
            HistoryError::Interrupt(i) => Self::Interrupt(i),
            other => Self::History(other),
        }
    }

    /// The interruption signal carried by this error, if any.
    pub fn interrupt(&self) -> Option<Interrupt> {
        match self {
            Self::Interrupt(i) => Some(*i),
            _ => None,
        }
    }
}

impl ErrorCode for SearchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Interrupt(i) => i.error_code(),
            Self::History(e) => e.error_code(),
            _ => error_code::SEARCH_ERROR,
        }
    }
}
