//! Top-level apimine configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{HistoryConfig, PipelineConfig, SearchConfig, WorkerConfig};
use crate::constants::{KNOWN_STAGES, PROJECT_CONFIG_FILE, TIE_BREAK_MOST_NODES, TIE_BREAK_MOST_TYPES};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`APIMINE_*`)
/// 3. Project config (`apimine.toml` in project root)
/// 4. User config (`~/.apimine/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MinerConfig {
    pub pipeline: PipelineConfig,
    pub search: SearchConfig,
    pub workers: WorkerConfig,
    pub history: HistoryConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub stages: Option<Vec<String>>,
    pub stage_timeout_ms: Option<u64>,
    pub threads: Option<usize>,
    pub max_repeat: Option<u32>,
    pub top_k: Option<usize>,
}

impl MinerConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        ::tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &MinerConfig) -> Result<(), ConfigError> {
        for stage in &config.pipeline.stages {
            if !KNOWN_STAGES.contains(&stage.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    field: "pipeline.stages".to_string(),
                    message: format!("unknown stage '{stage}'"),
                });
            }
        }
        if config.pipeline.stage_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "pipeline.stage_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(ref tie_break) = config.pipeline.inclusion_tie_break {
            if tie_break != TIE_BREAK_MOST_NODES && tie_break != TIE_BREAK_MOST_TYPES {
                return Err(ConfigError::ValidationFailed {
                    field: "pipeline.inclusion_tie_break".to_string(),
                    message: format!(
                        "must be '{TIE_BREAK_MOST_NODES}' or '{TIE_BREAK_MOST_TYPES}'"
                    ),
                });
            }
        }
        if config.search.max_repeat == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "search.max_repeat".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.search.top_k == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "search.top_k".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.workers.unit_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "workers.unit_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.apimine/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".apimine").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut MinerConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: MinerConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut MinerConfig, other: &MinerConfig) {
        if !other.pipeline.stages.is_empty() {
            base.pipeline.stages = other.pipeline.stages.clone();
        }
        if other.pipeline.stage_timeout_ms.is_some() {
            base.pipeline.stage_timeout_ms = other.pipeline.stage_timeout_ms;
        }
        if other.pipeline.inclusion_tie_break.is_some() {
            base.pipeline.inclusion_tie_break = other.pipeline.inclusion_tie_break.clone();
        }

        if other.search.max_repeat.is_some() {
            base.search.max_repeat = other.search.max_repeat;
        }
        if other.search.top_k.is_some() {
            base.search.top_k = other.search.top_k;
        }

        if other.workers.threads.is_some() {
            base.workers.threads = other.workers.threads;
        }
        if other.workers.unit_timeout_ms.is_some() {
            base.workers.unit_timeout_ms = other.workers.unit_timeout_ms;
        }

        if other.history.validate_mutations.is_some() {
            base.history.validate_mutations = other.history.validate_mutations;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `APIMINE_PIPELINE_STAGES`, `APIMINE_SEARCH_TOP_K`, etc.
    fn apply_env_overrides(config: &mut MinerConfig) {
        if let Ok(val) = std::env::var("APIMINE_PIPELINE_STAGES") {
            let stages: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !stages.is_empty() {
                config.pipeline.stages = stages;
            }
        }
        if let Ok(val) = std::env::var("APIMINE_PIPELINE_STAGE_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.pipeline.stage_timeout_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("APIMINE_SEARCH_MAX_REPEAT") {
            if let Ok(v) = val.parse::<u32>() {
                config.search.max_repeat = Some(v);
            }
        }
        if let Ok(val) = std::env::var("APIMINE_SEARCH_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.search.top_k = Some(v);
            }
        }
        if let Ok(val) = std::env::var("APIMINE_WORKERS_THREADS") {
            if let Ok(v) = val.parse::<usize>() {
                config.workers.threads = Some(v);
            }
        }
        if let Ok(val) = std::env::var("APIMINE_HISTORY_VALIDATE") {
            if let Ok(v) = val.parse::<bool>() {
                config.history.validate_mutations = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut MinerConfig, cli: &CliOverrides) {
        if let Some(ref stages) = cli.stages {
            config.pipeline.stages = stages.clone();
        }
        if let Some(v) = cli.stage_timeout_ms {
            config.pipeline.stage_timeout_ms = Some(v);
        }
        if let Some(v) = cli.threads {
            config.workers.threads = Some(v);
        }
        if let Some(v) = cli.max_repeat {
            config.search.max_repeat = Some(v);
        }
        if let Some(v) = cli.top_k {
            config.search.top_k = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
