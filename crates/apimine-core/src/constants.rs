//! Shared constants for the apimine engine.

/// apimine version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "apimine.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "APIMINE_LOG";

/// Default tracing filter when `APIMINE_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "apimine=info";

/// Default per-stage timeout for pipeline converters (10 minutes).
pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 600_000;

/// Default per-unit timeout for harvesting samples (30 seconds).
pub const DEFAULT_UNIT_TIMEOUT_MS: u64 = 30_000;

/// Default number of worker threads (0 = auto-detect).
pub const DEFAULT_THREADS: usize = 0;

/// Default per-node repetition bound for sequence extraction.
pub const DEFAULT_MAX_REPEAT: u32 = 2;

/// Default number of sequences retained by sequence extraction.
pub const DEFAULT_TOP_K: usize = 10;

/// How many inner-loop iterations run between two checkpoint checks.
pub const CHECKPOINT_STRIDE: usize = 256;

/// Pipeline stage names, in default execution order.
pub const STAGE_SAME_CONTENT: &str = "same_content";
pub const STAGE_ELIMINATE_UNKNOWNS: &str = "eliminate_unknowns";
pub const STAGE_INCLUSION_STRUCTURAL: &str = "inclusion_structural";
pub const STAGE_INCLUSION_UNKNOWN: &str = "inclusion_unknown";
pub const STAGE_INCLUSION_ORDERING: &str = "inclusion_ordering";
pub const STAGE_TYPE_INTERSECTION: &str = "type_intersection";

/// Every stage name the pipeline driver understands.
pub const KNOWN_STAGES: [&str; 6] = [
    STAGE_SAME_CONTENT,
    STAGE_ELIMINATE_UNKNOWNS,
    STAGE_INCLUSION_STRUCTURAL,
    STAGE_INCLUSION_UNKNOWN,
    STAGE_INCLUSION_ORDERING,
    STAGE_TYPE_INTERSECTION,
];

/// The stage order used when the config does not name one.
pub const DEFAULT_STAGES: [&str; 4] = [
    STAGE_SAME_CONTENT,
    STAGE_ELIMINATE_UNKNOWNS,
    STAGE_SAME_CONTENT,
    STAGE_INCLUSION_UNKNOWN,
];

/// Inclusion tie-break names.
pub const TIE_BREAK_MOST_NODES: &str = "most_nodes";
pub const TIE_BREAK_MOST_TYPES: &str = "most_types";
