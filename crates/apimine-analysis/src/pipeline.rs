//! Pipeline driver: runs converter stages in order over a collection.
//!
//! Each stage runs under its own child checkpoint with the configured
//! timeout. A stage that is interrupted (timeout or unit-level abort) or
//! that fails is skipped: the driver logs it, records a non-fatal
//! `StageSkipped` error, and hands the stage's input to the next stage
//! unchanged. Cancellation and invariant violations end the run.

use std::time::{Duration, Instant};

use apimine_core::config::PipelineConfig;
use apimine_core::errors::{
    ConfigError, ConvertError, ErrorCode, HistoryError, Interrupt, PipelineError, PipelineResult,
};
use apimine_core::events::types::{
    ErrorEvent, PipelineCompletedEvent, PipelineStartedEvent, StageCompletedEvent,
    StageSkippedEvent, StageStartedEvent,
};
use serde::Serialize;

use crate::collection::Collection;
use crate::converters::{create_converter, Converter, TieBreak};

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Completed,
    Interrupted,
    Failed,
}

/// Per-stage diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub input_size: usize,
    pub output_size: usize,
    pub duration_ms: u64,
    pub outcome: StageOutcome,
}

/// The final collection plus one report per stage.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub collection: Collection,
    pub stages: Vec<StageReport>,
}

/// An ordered list of converter stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Converter>>,
    stage_timeout: Duration,
}

impl Pipeline {
    /// An empty pipeline.
    pub fn new(stage_timeout: Duration) -> Self {
        Self {
            stages: Vec::new(),
            stage_timeout,
        }
    }

    /// Build the stage list named by the configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let tie_break_name = config.effective_tie_break();
        let tie_break = TieBreak::from_name(tie_break_name).ok_or_else(|| ConfigError::ValidationFailed {
            field: "pipeline.inclusion_tie_break".to_string(),
            message: format!("unknown tie-break '{tie_break_name}'"),
        })?;
        let mut pipeline = Self::new(config.effective_stage_timeout());
        for name in config.effective_stages() {
            let stage = create_converter(&name, tie_break).ok_or_else(|| ConfigError::ValidationFailed {
                field: "pipeline.stages".to_string(),
                message: format!("unknown stage '{name}'"),
            })?;
            pipeline.stages.push(stage);
        }
        Ok(pipeline)
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: impl Converter + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run every stage over `input`.
    pub fn run(&self, input: Collection) -> Result<PipelineResult<PipelineOutput>, PipelineError> {
        let context = input.context().clone();
        let events = &context.events;
        let root = context.checkpoint();
        let started = Instant::now();

        let names = self.stage_names();
        tracing::info!(stages = ?names, input_size = input.len(), "pipeline started");
        events.emit_pipeline_started(&PipelineStartedEvent {
            stages: names,
            input_size: input.len(),
        });

        let mut result = PipelineResult::<PipelineOutput>::default();
        let mut reports = Vec::with_capacity(self.stages.len());
        let mut current = input;

        for (position, stage) in self.stages.iter().enumerate() {
            let name = stage.name();
            let input_size = current.len();
            if root.check() == Err(Interrupt::Cancelled) {
                return Err(Self::cancelled(name, &context.events));
            }

            let span = tracing::info_span!("stage", stage = name, position);
            let _guard = span.enter();
            events.emit_stage_started(&StageStartedEvent {
                stage: name.to_string(),
                position,
                input_size,
            });

            let checkpoint = root.child(Some(self.stage_timeout));
            let stage_started = Instant::now();
            let converted = stage.convert(&current, &checkpoint);
            let duration_ms = stage_started.elapsed().as_millis() as u64;

            let outcome = match converted {
                Ok(next) => {
                    let output_size = next.len();
                    tracing::info!(input_size, output_size, duration_ms, "stage completed");
                    events.emit_stage_completed(&StageCompletedEvent {
                        stage: name.to_string(),
                        input_size,
                        output_size,
                        duration_ms,
                    });
                    current = next;
                    StageOutcome::Completed
                }
                Err(err) => {
                    let outcome = match err.interrupt() {
                        Some(Interrupt::Cancelled) => {
                            return Err(Self::cancelled(name, &context.events));
                        }
                        Some(Interrupt::Interrupted) => StageOutcome::Interrupted,
                        None if is_invariant_violation(&err) => {
                            tracing::error!(error = %err, "invariant violated; aborting run");
                            events.emit_error(&ErrorEvent {
                                message: err.to_string(),
                                error_code: err.error_code().to_string(),
                            });
                            return Err(err.into());
                        }
                        None => StageOutcome::Failed,
                    };
                    let reason = err.to_string();
                    tracing::warn!(error = %reason, ?outcome, "stage skipped; passing input through");
                    events.emit_stage_skipped(&StageSkippedEvent {
                        stage: name.to_string(),
                        reason: reason.clone(),
                    });
                    result.add_error(PipelineError::StageSkipped {
                        stage: name.to_string(),
                        reason,
                    });
                    outcome
                }
            };

            reports.push(StageReport {
                stage: name.to_string(),
                input_size,
                output_size: current.len(),
                duration_ms,
                outcome,
            });
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let skipped_stages = reports
            .iter()
            .filter(|r| r.outcome != StageOutcome::Completed)
            .count();
        tracing::info!(output_size = current.len(), skipped_stages, duration_ms, "pipeline completed");
        events.emit_pipeline_completed(&PipelineCompletedEvent {
            output_size: current.len(),
            skipped_stages,
            duration_ms,
        });

        result.data = PipelineOutput {
            collection: current,
            stages: reports,
        };
        Ok(result)
    }

    fn cancelled(stage: &str, events: &apimine_core::events::EventDispatcher) -> PipelineError {
        let err = PipelineError::Cancelled;
        tracing::warn!(stage, "pipeline cancelled");
        events.emit_error(&ErrorEvent {
            message: format!("cancelled during stage {stage}"),
            error_code: err.error_code().to_string(),
        });
        err
    }
}

fn is_invariant_violation(err: &ConvertError) -> bool {
    matches!(
        err,
        ConvertError::History {
            source: HistoryError::InvariantViolated { .. },
            ..
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::SameContentClusterer;
    use crate::history::test_support::*;
    use apimine_core::Checkpoint;

    struct Failing;

    impl Converter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn convert(&self, _input: &Collection, _cp: &Checkpoint) -> Result<Collection, ConvertError> {
            Err(ConvertError::Failed {
                stage: "failing".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    fn sample() -> Collection {
        let mut c = Collection::default();
        c.add(linear(&[("a", 1)]));
        c.add(linear(&[("a", 1)]));
        c
    }

    #[test]
    fn test_failed_stage_passes_input_through() {
        let pipeline = Pipeline::new(Duration::from_secs(5))
            .with_stage(Failing)
            .with_stage(SameContentClusterer::weightless());
        let result = pipeline.run(sample()).unwrap();
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.data.stages[0].outcome, StageOutcome::Failed);
        assert_eq!(result.data.stages[0].output_size, 2);
        assert_eq!(result.data.collection.len(), 1);
    }

    #[test]
    fn test_from_config_uses_default_stages() {
        let pipeline = Pipeline::from_config(&PipelineConfig::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["same_content", "eliminate_unknowns", "same_content", "inclusion_unknown"]
        );
    }

    #[test]
    fn test_from_config_rejects_unknown_stage() {
        let config = PipelineConfig {
            stages: vec!["nope".to_string()],
            ..Default::default()
        };
        assert!(Pipeline::from_config(&config).is_err());
    }
}
