//! MinerEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for handling apimine lifecycle events.
///
/// Handlers only override the events they care about. The trait requires
/// `Send + Sync` because harvest units report from worker threads.
pub trait MinerEventHandler: Send + Sync {
    // ---- Pipeline ----
    fn on_pipeline_started(&self, _event: &PipelineStartedEvent) {}
    fn on_stage_started(&self, _event: &StageStartedEvent) {}
    fn on_stage_completed(&self, _event: &StageCompletedEvent) {}
    fn on_stage_skipped(&self, _event: &StageSkippedEvent) {}
    fn on_pipeline_completed(&self, _event: &PipelineCompletedEvent) {}

    // ---- Harvest ----
    fn on_unit_abandoned(&self, _event: &UnitAbandonedEvent) {}

    // ---- Errors ----
    fn on_error(&self, _event: &ErrorEvent) {}
}
