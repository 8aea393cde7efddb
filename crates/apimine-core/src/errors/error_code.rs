//! ErrorCode trait for structured error reporting.

/// Every error enum implements this to provide a stable code string
/// that callers (the CLI, log consumers) can match on.
pub trait ErrorCode {
    /// Returns the error code string (e.g., "HISTORY_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CANCELLED: &str = "CANCELLED";
pub const INTERRUPTED: &str = "INTERRUPTED";
pub const HISTORY_ERROR: &str = "HISTORY_ERROR";
pub const INVARIANT_VIOLATED: &str = "INVARIANT_VIOLATED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const CONVERT_ERROR: &str = "CONVERT_ERROR";
pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
pub const UNIT_FAILED: &str = "UNIT_FAILED";
pub const PIPELINE_ERROR: &str = "PIPELINE_ERROR";
