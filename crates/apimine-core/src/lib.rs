//! Core types, errors, configuration, cancellation, events, and tracing
//! for the apimine usage-pattern miner.
//!
//! Everything in here is shared by the analysis engine and the CLI. The
//! crate holds no process-wide state besides the tracing subscriber latch.

pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod traits;
pub mod types;

pub use context::MinerContext;
pub use traits::cancellation::{Cancellable, CancellationToken, Checkpoint};
