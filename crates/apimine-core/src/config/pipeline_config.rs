//! Clustering pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_STAGES, DEFAULT_STAGE_TIMEOUT_MS, TIE_BREAK_MOST_NODES};

/// Configuration for the converter pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ordered stage names. Default: same_content, eliminate_unknowns,
    /// same_content, inclusion_unknown.
    #[serde(default)]
    pub stages: Vec<String>,
    /// Per-stage timeout in milliseconds. Default: 600000.
    pub stage_timeout_ms: Option<u64>,
    /// Tie-break for inclusion stages: "most_nodes" or "most_types".
    pub inclusion_tie_break: Option<String>,
}

impl PipelineConfig {
    /// Returns the effective stage list, defaulting to `DEFAULT_STAGES`.
    pub fn effective_stages(&self) -> Vec<String> {
        if self.stages.is_empty() {
            DEFAULT_STAGES.iter().map(|s| s.to_string()).collect()
        } else {
            self.stages.clone()
        }
    }

    /// Returns the effective per-stage timeout.
    pub fn effective_stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms.unwrap_or(DEFAULT_STAGE_TIMEOUT_MS))
    }

    /// Returns the effective inclusion tie-break name.
    pub fn effective_tie_break(&self) -> &str {
        self.inclusion_tie_break
            .as_deref()
            .unwrap_or(TIE_BREAK_MOST_NODES)
    }
}
