//! EventDispatcher: synchronous event dispatch, free when empty.

use std::sync::Arc;

use super::handler::MinerEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn MinerEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn MinerEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler does not stop the others from receiving the event.
    fn emit<F: Fn(&dyn MinerEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                ::tracing::warn!("event handler panicked; continuing with remaining handlers");
            }
        }
    }

    // ---- Pipeline ----
    pub fn emit_pipeline_started(&self, event: &PipelineStartedEvent) {
        self.emit(|h| h.on_pipeline_started(event));
    }

    pub fn emit_stage_started(&self, event: &StageStartedEvent) {
        self.emit(|h| h.on_stage_started(event));
    }

    pub fn emit_stage_completed(&self, event: &StageCompletedEvent) {
        self.emit(|h| h.on_stage_completed(event));
    }

    pub fn emit_stage_skipped(&self, event: &StageSkippedEvent) {
        self.emit(|h| h.on_stage_skipped(event));
    }

    pub fn emit_pipeline_completed(&self, event: &PipelineCompletedEvent) {
        self.emit(|h| h.on_pipeline_completed(event));
    }

    // ---- Harvest ----
    pub fn emit_unit_abandoned(&self, event: &UnitAbandonedEvent) {
        self.emit(|h| h.on_unit_abandoned(event));
    }

    // ---- Errors ----
    pub fn emit_error(&self, event: &ErrorEvent) {
        self.emit(|h| h.on_error(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
