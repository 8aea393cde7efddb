//! Automaton engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the automaton engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistoryConfig {
    /// Validate structural invariants after every mutating operation.
    /// Default: on in debug builds, off in release builds.
    pub validate_mutations: Option<bool>,
}

impl HistoryConfig {
    /// Returns whether mutations are validated.
    pub fn effective_validate_mutations(&self) -> bool {
        self.validate_mutations.unwrap_or(cfg!(debug_assertions))
    }
}
