//! Event payload types for pipeline and harvest lifecycle events.

/// Payload for `on_pipeline_started`.
#[derive(Debug, Clone)]
pub struct PipelineStartedEvent {
    pub stages: Vec<String>,
    pub input_size: usize,
}

/// Payload for `on_stage_started`.
#[derive(Debug, Clone)]
pub struct StageStartedEvent {
    pub stage: String,
    pub position: usize,
    pub input_size: usize,
}

/// Payload for `on_stage_completed`.
#[derive(Debug, Clone)]
pub struct StageCompletedEvent {
    pub stage: String,
    pub input_size: usize,
    pub output_size: usize,
    pub duration_ms: u64,
}

/// Payload for `on_stage_skipped`.
#[derive(Debug, Clone)]
pub struct StageSkippedEvent {
    pub stage: String,
    pub reason: String,
}

/// Payload for `on_pipeline_completed`.
#[derive(Debug, Clone)]
pub struct PipelineCompletedEvent {
    pub output_size: usize,
    pub skipped_stages: usize,
    pub duration_ms: u64,
}

/// Payload for `on_unit_abandoned`.
#[derive(Debug, Clone)]
pub struct UnitAbandonedEvent {
    pub unit: String,
    pub reason: String,
}

/// Payload for `on_error`.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub error_code: String,
}
