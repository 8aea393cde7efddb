//! Converter stage errors.

use super::error_code::{self, ErrorCode};
use super::{HistoryError, Interrupt};

/// Errors a converter stage can end with.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Interrupt(#[from] Interrupt),

    #[error("History error in stage {stage}: {source}")]
    History {
        stage: String,
        source: HistoryError,
    },

    #[error("Stage {stage} failed: {message}")]
    Failed { stage: String, message: String },
}

impl ConvertError {
    /// Wrap a history error, lifting an interruption out of it so callers
    /// only ever have to look at one place for the signal.
    pub fn from_history(stage: &str, err: HistoryError) -> Self {
        match err {
            HistoryError::Interrupt(i) => Self::Interrupt(i),
            source => Self::History {
                stage: stage.to_string(),
                source,
            },
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

impl ErrorCode for ConvertError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Interrupt(i) => i.error_code(),
            Self::History { source, .. } => source.error_code(),
            Self::Failed { .. } => error_code::CONVERT_ERROR,
        }
    }
}
