//! Error handling for apimine.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod convert_error;
pub mod error_code;
pub mod history_error;
pub mod interrupt;
pub mod pipeline_error;
pub mod search_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use convert_error::ConvertError;
pub use error_code::ErrorCode;
pub use history_error::HistoryError;
pub use interrupt::Interrupt;
pub use pipeline_error::{PipelineError, PipelineResult};
pub use search_error::SearchError;
pub use storage_error::StorageError;
