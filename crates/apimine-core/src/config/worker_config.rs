//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_THREADS, DEFAULT_UNIT_TIMEOUT_MS};

/// Configuration for the bounded worker pool used to harvest samples.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker threads (0 = auto-detect). Default: 0.
    pub threads: Option<usize>,
    /// Per-unit timeout in milliseconds. Default: 30000.
    pub unit_timeout_ms: Option<u64>,
}

impl WorkerConfig {
    /// Returns the effective thread count; 0 lets rayon pick.
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(DEFAULT_THREADS)
    }

    /// Returns the effective per-unit timeout.
    pub fn effective_unit_timeout(&self) -> Duration {
        Duration::from_millis(self.unit_timeout_ms.unwrap_or(DEFAULT_UNIT_TIMEOUT_MS))
    }
}
