//! Structured field names shared by log events and CLI reports.
//!
//! Using the same names everywhere keeps log queries and report parsing simple.

/// Pipeline: stage name.
pub const STAGE: &str = "stage";

/// Pipeline: collection size entering a stage.
pub const STAGE_INPUT_SIZE: &str = "input_size";

/// Pipeline: collection size leaving a stage.
pub const STAGE_OUTPUT_SIZE: &str = "output_size";

/// Pipeline: stage wall time in milliseconds.
pub const STAGE_DURATION_MS: &str = "duration_ms";

/// Unknown elimination: unknown-edge count after a pass.
pub const UNKNOWN_EDGE_COUNT: &str = "unknown_edges";

/// Harvester: unit label.
pub const UNIT: &str = "unit";

/// Search: number of corpus histories scored.
pub const CORPUS_SIZE: &str = "corpus_size";

/// Search: number of non-zero hits.
pub const HIT_COUNT: &str = "hits";
