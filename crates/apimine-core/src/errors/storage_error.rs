//! Collection persistence errors.

use std::path::PathBuf;

use super::error_code::{self, ErrorCode};

/// Errors that can occur while saving or loading a collection.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed collection blob in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Serialization failed for {path}: {message}")]
    Serialization { path: PathBuf, message: String },
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        error_code::STORAGE_ERROR
    }
}
