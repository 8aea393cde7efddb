//! The explicit context threaded through collections, converters and search.

use std::path::Path;

use crate::config::{CliOverrides, MinerConfig};
use crate::errors::ConfigError;
use crate::events::EventDispatcher;
use crate::traits::cancellation::{CancellationToken, Checkpoint};

/// Configuration, run-wide cancellation and event dispatch for one mining run.
///
/// Collections hold an `Arc<MinerContext>` so every stage of a run sees the
/// same settings without any process-wide state.
#[derive(Debug, Clone, Default)]
pub struct MinerContext {
    pub config: MinerConfig,
    pub cancel: CancellationToken,
    pub events: EventDispatcher,
}

impl MinerContext {
    /// Context with the given configuration and a fresh cancellation token.
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            events: EventDispatcher::new(),
        }
    }

    /// Load configuration for `root` and wrap it in a context.
    pub fn load(root: &Path, cli: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        Ok(Self::new(MinerConfig::load(root, cli)?))
    }

    /// A checkpoint rooted at this context's cancellation token.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.cancel.clone())
    }

    /// Whether histories should validate their invariants after mutation.
    pub fn validate_mutations(&self) -> bool {
        self.config.history.effective_validate_mutations()
    }
}
