//! CLI errors.

use apimine_core::errors::error_code::{self, ErrorCode};
use apimine_core::errors::{ConfigError, PipelineError, SearchError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("No history at index {index}; the corpus holds {len}")]
    NoSuchHistory { index: usize, len: usize },

    #[error("Cannot write report: {0}")]
    Report(#[from] serde_json::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Search(e) => e.error_code(),
            Self::Pipeline(e) => e.error_code(),
            Self::NoSuchHistory { .. } => error_code::STORAGE_ERROR,
            Self::Report(_) => error_code::STORAGE_ERROR,
        }
    }
}
