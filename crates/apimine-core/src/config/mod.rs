//! Configuration system for apimine.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod history_config;
pub mod miner_config;
pub mod pipeline_config;
pub mod search_config;
pub mod worker_config;

pub use history_config::HistoryConfig;
pub use miner_config::{CliOverrides, MinerConfig};
pub use pipeline_config::PipelineConfig;
pub use search_config::SearchConfig;
pub use worker_config::WorkerConfig;
