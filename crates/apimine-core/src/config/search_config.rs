//! Search configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_REPEAT, DEFAULT_TOP_K};

/// Configuration for search and sequence extraction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum visits of one node within an extracted walk. Default: 2.
    pub max_repeat: Option<u32>,
    /// Number of sequences kept per extraction. Default: 10.
    pub top_k: Option<usize>,
}

impl SearchConfig {
    /// Returns the effective repetition bound.
    pub fn effective_max_repeat(&self) -> u32 {
        self.max_repeat.unwrap_or(DEFAULT_MAX_REPEAT)
    }

    /// Returns the effective top-k.
    pub fn effective_top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }
}
