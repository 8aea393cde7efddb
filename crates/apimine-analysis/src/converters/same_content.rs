//! Same-content clustering: histories with equal content collapse into the
//! first one seen.

use apimine_core::constants::{CHECKPOINT_STRIDE, STAGE_SAME_CONTENT};
use apimine_core::errors::ConvertError;
use apimine_core::types::collections::{FxHashMap, SmallVec2};
use apimine_core::Checkpoint;
use rayon::prelude::*;

use super::Converter;
use crate::collection::Collection;
use crate::history::History;

/// What "same content" means: a hash that agrees on equal content, and the
/// equivalence itself.
pub trait ContentKey: Send + Sync {
    fn digest(&self, history: &History) -> u64;
    fn same(&self, a: &History, b: &History) -> bool;
}

/// Structure and labels, weights ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightlessContent;

impl ContentKey for WeightlessContent {
    fn digest(&self, history: &History) -> u64 {
        history.content_hash()
    }

    fn same(&self, a: &History, b: &History) -> bool {
        a.equal_structure(b)
    }
}

/// Bucket by digest, compare within a bucket, merge each history into the
/// first equal representative.
pub struct SameContentClusterer {
    key: Box<dyn ContentKey>,
}

impl SameContentClusterer {
    pub fn new(key: impl ContentKey + 'static) -> Self {
        Self { key: Box::new(key) }
    }

    pub fn weightless() -> Self {
        Self::new(WeightlessContent)
    }
}

impl Converter for SameContentClusterer {
    fn name(&self) -> &'static str {
        STAGE_SAME_CONTENT
    }

    fn convert(&self, input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        let digests: Vec<u64> = input
            .histories()
            .par_iter()
            .map(|h| self.key.digest(h))
            .collect();
        checkpoint.check()?;

        let mut buckets: FxHashMap<u64, SmallVec2<usize>> = FxHashMap::default();
        let mut representatives: Vec<History> = Vec::new();
        let mut steps = 0;
        for (history, digest) in input.iter().zip(digests) {
            checkpoint.check_every(&mut steps, CHECKPOINT_STRIDE)?;
            let bucket = buckets.entry(digest).or_default();
            let equal = bucket
                .iter()
                .copied()
                .find(|&r| self.key.same(&representatives[r], history));
            match equal {
                Some(r) => representatives[r]
                    .merge_from(history, false)
                    .map_err(|e| ConvertError::from_history(STAGE_SAME_CONTENT, e))?,
                None => {
                    bucket.push(representatives.len());
                    representatives.push(history.clone());
                }
            }
        }

        tracing::debug!(
            input = input.len(),
            clusters = representatives.len(),
            "same-content clustering"
        );
        Ok(Collection::with_histories(
            input.context().clone(),
            representatives,
        ))
    }
}
