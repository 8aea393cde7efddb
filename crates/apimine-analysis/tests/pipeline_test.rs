//! Pipeline driver and harvester: stage sequencing, soft failure,
//! timeouts and cancellation.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use apimine_analysis::converters::{Converter, SameContentClusterer};
use apimine_analysis::harvest::{CollectionFileSource, Harvester, SampleSource};
use apimine_analysis::{Collection, Pipeline, StageOutcome};
use apimine_core::config::{MinerConfig, PipelineConfig};
use apimine_core::errors::{ConvertError, PipelineError};
use apimine_core::events::handler::MinerEventHandler;
use apimine_core::events::types::*;
use apimine_core::events::EventDispatcher;
use apimine_core::{Checkpoint, MinerContext};
use common::*;

#[derive(Default)]
struct Recorder {
    completed: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
}

impl MinerEventHandler for Recorder {
    fn on_stage_completed(&self, _event: &StageCompletedEvent) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_stage_skipped(&self, _event: &StageSkippedEvent) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_error(&self, _event: &ErrorEvent) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

fn context_with(recorder: &Arc<Recorder>) -> Arc<MinerContext> {
    let mut events = EventDispatcher::new();
    events.register(recorder.clone());
    Arc::new(MinerContext {
        events,
        ..MinerContext::default()
    })
}

/// Sleeps past any short deadline, then polls.
struct Slow;

impl Converter for Slow {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn convert(&self, input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        std::thread::sleep(Duration::from_millis(30));
        checkpoint.check()?;
        Ok(input.empty_like())
    }
}

/// Requests a global stop.
struct Cancelling;

impl Converter for Cancelling {
    fn name(&self) -> &'static str {
        "cancelling"
    }

    fn convert(&self, _input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        checkpoint.cancel();
        checkpoint.check()?;
        unreachable!("checkpoint reports cancellation")
    }
}

fn corpus(context: Arc<MinerContext>) -> Collection {
    let mut c = Collection::new(context);
    c.add(linear(&[("open", 1), ("read", 1), ("close", 1)]));
    c.add(linear(&[("open", 1), ("read", 1), ("close", 1)]));
    c.add(linear(&[("open", 1), ("?", 1), ("close", 1)]));
    c
}

#[test]
fn default_pipeline_collapses_corpus() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = Pipeline::from_config(&PipelineConfig::default()).unwrap();
    let result = pipeline.run(corpus(context_with(&recorder))).unwrap();

    assert!(result.is_clean());
    assert_eq!(result.data.stages.len(), 4);
    assert!(result.data.stages.iter().all(|s| s.outcome == StageOutcome::Completed));
    assert_eq!(result.data.collection.len(), 1);
    assert_eq!(result.data.collection.unknown_edge_count(), 0);
    assert_eq!(recorder.completed.load(Ordering::Relaxed), 4);
}

#[test]
fn timed_out_stage_is_skipped() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = Pipeline::new(Duration::from_millis(1)).with_stage(Slow);
    let result = pipeline.run(corpus(context_with(&recorder))).unwrap();

    assert_eq!(result.error_count(), 1);
    assert!(matches!(result.errors[0], PipelineError::StageSkipped { .. }));
    assert_eq!(result.data.stages[0].outcome, StageOutcome::Interrupted);
    // The slow stage's output is discarded; its input flows on.
    assert_eq!(result.data.stages[0].output_size, 3);
    assert_eq!(recorder.skipped.load(Ordering::Relaxed), 1);
}

#[test]
fn cancellation_aborts_the_run() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = Pipeline::new(Duration::from_secs(5))
        .with_stage(Cancelling)
        .with_stage(SameContentClusterer::weightless());
    let outcome = pipeline.run(corpus(context_with(&recorder)));
    assert!(matches!(outcome, Err(PipelineError::Cancelled)));
    assert_eq!(recorder.errors.load(Ordering::Relaxed), 1);
    assert_eq!(recorder.completed.load(Ordering::Relaxed), 0);
}

#[test]
fn configured_stages_run_in_order() {
    let config = MinerConfig::from_toml(
        r#"
        [pipeline]
        stages = ["type_intersection", "same_content"]
        "#,
    )
    .unwrap();
    let pipeline = Pipeline::from_config(&config.pipeline).unwrap();
    assert_eq!(pipeline.stage_names(), vec!["type_intersection", "same_content"]);
}

#[test]
fn harvested_files_feed_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    corpus(Arc::new(MinerContext::default())).save(&first).unwrap();
    std::fs::write(&second, "not json").unwrap();

    let context = Arc::new(MinerContext::default());
    let sources: Vec<Box<dyn SampleSource>> = vec![
        Box::new(CollectionFileSource::new(&first)),
        Box::new(CollectionFileSource::new(&second)),
    ];
    let harvested = Harvester::new(context).run(&sources).unwrap();
    assert_eq!(harvested.data.len(), 3);
    assert_eq!(harvested.error_count(), 1);

    let pipeline = Pipeline::from_config(&PipelineConfig::default()).unwrap();
    let result = pipeline.run(harvested.data).unwrap();
    assert_eq!(result.data.collection.len(), 1);
}
