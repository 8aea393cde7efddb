//! apimine analysis engine.
//!
//! - **History**: weighted automata of method invocations, with join ("or"),
//!   merge ("and"), inclusion tests and unknown-edge elimination
//! - **Matcher**: the structural node equivalence every merge relies on
//! - **Collection**: a named set of histories bound to one `MinerContext`
//! - **Converters / Pipeline**: clustering strategies and the driver that
//!   sequences them
//! - **Harvest**: bounded worker pool feeding per-sample histories in
//! - **Search**: query construction, corpus ranking, sequence extraction
//!
//! Dependency chain: Label → Matcher → History → Collection →
//! (Converters → Pipeline) ∥ Search

pub mod collection;
pub mod converters;
pub mod export;
pub mod harvest;
pub mod history;
pub mod label;
pub mod matcher;
pub mod pipeline;
pub mod search;

pub use collection::Collection;
pub use history::{History, NodeId, Transition};
pub use label::{Label, LabelSet, MethodRef};
pub use matcher::Matcher;
pub use pipeline::{Pipeline, PipelineOutput, StageOutcome, StageReport};
