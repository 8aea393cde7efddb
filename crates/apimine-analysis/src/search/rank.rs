//! Ranking a corpus against a query.

use std::collections::BTreeMap;

use apimine_core::errors::{Interrupt, SearchError};
use apimine_core::Checkpoint;
use rayon::prelude::*;
use serde::Serialize;

use crate::collection::Collection;
use crate::history::History;

/// One history of the corpus that includes the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub index: usize,
    pub title: Option<String>,
    pub score: usize,
}

/// Aggregate results for all queries of one depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepthBucket {
    pub queries: usize,
    pub matched: usize,
    pub total_hits: usize,
    pub best_score: usize,
}

/// Rank `base` against `query`.
///
/// A history scores its depth when it includes the query (unknown steps
/// standing for any stretch of calls) and 0 otherwise; only non-zero
/// scores are returned, best first, ties in corpus order.
pub fn search(
    query: &History,
    base: &Collection,
    checkpoint: &Checkpoint,
) -> Result<Vec<SearchHit>, SearchError> {
    let scored = base
        .histories()
        .par_iter()
        .enumerate()
        .map(|(index, history)| {
            if !history.includes_with_unknown(query, checkpoint)? {
                return Ok(None);
            }
            Ok(Some(SearchHit {
                index,
                title: history.title().map(str::to_string),
                score: history.depth(),
            }))
        })
        .collect::<Result<Vec<_>, Interrupt>>()?;

    let mut hits: Vec<SearchHit> = scored.into_iter().flatten().filter(|h| h.score > 0).collect();
    hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
    tracing::debug!(corpus_size = base.len(), hits = hits.len(), "search completed");
    Ok(hits)
}

/// Run every query of `queries` against `base` and bucket the outcome by
/// query depth.
pub fn batch_search(
    queries: &Collection,
    base: &Collection,
    checkpoint: &Checkpoint,
) -> Result<BTreeMap<usize, DepthBucket>, SearchError> {
    let mut buckets: BTreeMap<usize, DepthBucket> = BTreeMap::new();
    for query in queries {
        let hits = search(query, base, checkpoint)?;
        let bucket = buckets.entry(query.depth()).or_default();
        bucket.queries += 1;
        if !hits.is_empty() {
            bucket.matched += 1;
        }
        bucket.total_hits += hits.len();
        if let Some(best) = hits.first() {
            bucket.best_score = bucket.best_score.max(best.score);
        }
    }
    tracing::info!(
        queries = queries.len(),
        buckets = buckets.len(),
        "batch search completed"
    );
    Ok(buckets)
}

/// Fill the unknown steps of `query` from `base`, repeating until no
/// further unknown transition resolves.
pub fn complete(
    query: &History,
    base: &Collection,
    checkpoint: &Checkpoint,
) -> Result<History, SearchError> {
    let mut completed = query.clone();
    while completed.unknown_edge_count() > 0 {
        let removed = completed
            .eliminate_unknowns(base.histories(), checkpoint)
            .map_err(SearchError::from_history)?;
        if removed == 0 {
            break;
        }
    }
    Ok(completed)
}
