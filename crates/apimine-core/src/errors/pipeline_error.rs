//! Pipeline errors and non-fatal error collection.

use super::error_code::{self, ErrorCode};
use super::{ConfigError, ConvertError, HistoryError, SearchError, StorageError};

/// Errors that can occur during a mining run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Convert error: {0}")]
    Convert(#[from] ConvertError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Stage {stage} skipped: {reason}")]
    StageSkipped { stage: String, reason: String },

    #[error("Unit {unit} abandoned: {reason}")]
    UnitAbandoned { unit: String, reason: String },

    #[error("Pipeline cancelled")]
    Cancelled,
}

impl ErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Convert(e) => e.error_code(),
            Self::History(e) => e.error_code(),
            Self::Search(e) => e.error_code(),
            Self::StageSkipped { .. } => error_code::PIPELINE_ERROR,
            Self::UnitAbandoned { .. } => error_code::UNIT_FAILED,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

/// Result of a run that accumulates non-fatal errors.
/// Allows partial results to be returned even when some units or stages fail.
#[derive(Debug, Default)]
pub struct PipelineResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run.
    pub errors: Vec<PipelineError>,
}

impl<T: Default> PipelineResult<T> {
    /// Create a new result with no errors.
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Add a non-fatal error to the result.
    pub fn add_error(&mut self, error: PipelineError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
