//! Harvesting: turning samples into histories on a bounded worker pool.
//!
//! Every sample is one unit of work with its own child checkpoint and
//! timeout. A unit that times out, is interrupted, fails or panics is
//! abandoned:
//! its partial output is discarded, a warning is logged, and the run goes
//! on. Cancellation stops the whole harvest.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use apimine_core::errors::{ConvertError, ErrorCode, Interrupt, PipelineError, PipelineResult};
use apimine_core::events::types::{ErrorEvent, UnitAbandonedEvent};
use apimine_core::{Checkpoint, MinerContext};
use rayon::prelude::*;

use crate::collection::Collection;
use crate::history::History;

/// One unit of harvesting work.
pub trait SampleSource: Send + Sync {
    /// Name used in logs and as the default title of produced histories.
    fn name(&self) -> String;

    /// Produce histories, polling `checkpoint` in long loops.
    fn harvest(&self, checkpoint: &Checkpoint) -> Result<Vec<History>, ConvertError>;
}

/// A collection file written by `Collection::save`.
#[derive(Debug, Clone)]
pub struct CollectionFileSource {
    path: PathBuf,
}

impl CollectionFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for CollectionFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn harvest(&self, checkpoint: &Checkpoint) -> Result<Vec<History>, ConvertError> {
        checkpoint.check()?;
        let loaded = Collection::load(&self.path, Arc::new(MinerContext::default())).map_err(|e| {
            ConvertError::Failed {
                stage: "harvest".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(loaded.into_histories())
    }
}

/// Runs sample sources on a pool sized by `workers.threads`.
pub struct Harvester {
    context: Arc<MinerContext>,
}

type UnitOutcome = (String, Result<Vec<History>, ConvertError>);

impl Harvester {
    pub fn new(context: Arc<MinerContext>) -> Self {
        Self { context }
    }

    /// Harvest every source into one collection.
    pub fn run(&self, sources: &[Box<dyn SampleSource>]) -> Result<PipelineResult<Collection>, PipelineError> {
        let workers = &self.context.config.workers;
        let unit_timeout = workers.effective_unit_timeout();
        let root = self.context.checkpoint();

        let work = || -> Vec<UnitOutcome> {
            sources
                .par_iter()
                .map(|source| {
                    let checkpoint = root.child(Some(unit_timeout));
                    let produced = panic::catch_unwind(AssertUnwindSafe(|| {
                        checkpoint.check()?;
                        let histories = source.harvest(&checkpoint)?;
                        // A unit that overran its deadline is abandoned even
                        // if it returned.
                        checkpoint.check()?;
                        Ok(histories)
                    }))
                    .unwrap_or_else(|_| {
                        Err(ConvertError::Failed {
                            stage: "harvest".to_string(),
                            message: "unit panicked".to_string(),
                        })
                    });
                    (source.name(), produced)
                })
                .collect()
        };

        let outcomes = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers.effective_threads())
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                tracing::warn!(error = %e, "could not build worker pool; using the global pool");
                work()
            }
        };

        let mut result = PipelineResult::new(Collection::new(Arc::clone(&self.context)));
        for (unit, produced) in outcomes {
            match produced {
                Ok(histories) => {
                    for mut history in histories {
                        if history.title().is_none() {
                            history.set_title(unit.clone());
                        }
                        result.data.add(history);
                    }
                }
                Err(err) if err.interrupt() == Some(Interrupt::Cancelled) => {
                    tracing::warn!(unit = %unit, "harvest cancelled");
                    self.context.events.emit_error(&ErrorEvent {
                        message: format!("cancelled while harvesting {unit}"),
                        error_code: err.error_code().to_string(),
                    });
                    return Err(PipelineError::Cancelled);
                }
                Err(err) => {
                    let reason = err.to_string();
                    tracing::warn!(unit = %unit, error = %reason, "unit abandoned");
                    self.context.events.emit_unit_abandoned(&UnitAbandonedEvent {
                        unit: unit.clone(),
                        reason: reason.clone(),
                    });
                    result.add_error(PipelineError::UnitAbandoned { unit, reason });
                }
            }
        }

        tracing::info!(
            units = sources.len(),
            histories = result.data.len(),
            abandoned = result.error_count(),
            "harvest completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::*;

    struct Fixed(&'static str, Vec<History>);

    impl SampleSource for Fixed {
        fn name(&self) -> String {
            self.0.to_string()
        }

        fn harvest(&self, _cp: &Checkpoint) -> Result<Vec<History>, ConvertError> {
            Ok(self.1.clone())
        }
    }

    struct Broken;

    impl SampleSource for Broken {
        fn name(&self) -> String {
            "broken".to_string()
        }

        fn harvest(&self, _cp: &Checkpoint) -> Result<Vec<History>, ConvertError> {
            Err(ConvertError::Failed {
                stage: "harvest".to_string(),
                message: "unparseable sample".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_unit_is_abandoned() {
        let harvester = Harvester::new(Arc::new(MinerContext::default()));
        let sources: Vec<Box<dyn SampleSource>> = vec![
            Box::new(Fixed("A.java", vec![linear(&[("a", 1)])])),
            Box::new(Broken),
            Box::new(Fixed("B.java", vec![linear(&[("b", 1)]), linear(&[("c", 1)])])),
        ];
        let result = harvester.run(&sources).unwrap();
        assert_eq!(result.data.len(), 3);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.data.get(0).unwrap().title(), Some("A.java"));
    }

    struct Panicking;

    impl SampleSource for Panicking {
        fn name(&self) -> String {
            "panicking".to_string()
        }

        fn harvest(&self, _cp: &Checkpoint) -> Result<Vec<History>, ConvertError> {
            panic!("front-end bug")
        }
    }

    #[test]
    fn test_panicking_unit_is_abandoned() {
        let harvester = Harvester::new(Arc::new(MinerContext::default()));
        let sources: Vec<Box<dyn SampleSource>> = vec![
            Box::new(Panicking),
            Box::new(Fixed("A.java", vec![linear(&[("a", 1)])])),
        ];
        let result = harvester.run(&sources).unwrap();
        assert_eq!(result.data.len(), 1);
        assert!(matches!(result.errors[0], PipelineError::UnitAbandoned { .. }));
    }

    #[test]
    fn test_cancelled_run_propagates() {
        let context = MinerContext::default();
        context.checkpoint().cancel();
        let harvester = Harvester::new(Arc::new(context));
        let sources: Vec<Box<dyn SampleSource>> = vec![Box::new(Fixed("A.java", vec![]))];
        assert!(matches!(harvester.run(&sources), Err(PipelineError::Cancelled)));
    }
}
