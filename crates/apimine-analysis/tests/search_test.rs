//! Query construction, corpus search, completion and sequence extraction.

mod common;

use std::collections::BTreeSet;

use apimine_analysis::search::{
    batch_search, complete, extract_top_sequences, search, QueryBuilder,
};
use apimine_analysis::{Collection, History};
use apimine_core::errors::SearchError;
use apimine_core::Checkpoint;
use common::*;

fn corpus() -> Collection {
    let mut base = Collection::default();
    let mut read = linear(&[("open", 1), ("read", 1), ("close", 1)]);
    read.set_title("Reader.java");
    let mut write = linear(&[("open", 1), ("write", 1), ("flush", 1), ("close", 1)]);
    write.set_title("Writer.java");
    base.add(read);
    base.add(write);
    base.add(linear(&[("delete", 1)]));
    base
}

#[test]
fn parsed_query_finds_matching_histories() {
    let query = QueryBuilder::parse("java.io.File.open()V ? java.io.File.flush()V")
        .unwrap()
        .build()
        .unwrap();
    let hits = search(&query, &corpus(), &Checkpoint::unbounded()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title.as_deref(), Some("Writer.java"));
    assert_eq!(hits[0].score, 4);
}

#[test]
fn query_without_unknowns_requires_exact_prefix() {
    let query = QueryBuilder::new().call(call("open")).call(call("close")).build().unwrap();
    let hits = search(&query, &corpus(), &Checkpoint::unbounded()).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn batch_search_groups_by_depth() {
    let mut queries = Collection::default();
    queries.add(linear(&[("open", 1)]));
    queries.add(linear(&[("open", 1), ("?", 1), ("close", 1)]));
    queries.add(linear(&[("seek", 1), ("?", 1), ("close", 1)]));
    let buckets = batch_search(&queries, &corpus(), &Checkpoint::unbounded()).unwrap();

    assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(buckets[&1].matched, 1);
    assert_eq!(buckets[&1].total_hits, 2);
    assert_eq!(buckets[&3].queries, 2);
    assert_eq!(buckets[&3].matched, 1);
    assert_eq!(buckets[&3].best_score, 4);
}

#[test]
fn completion_fills_query_from_corpus() {
    let query = linear(&[("open", 1), ("?", 1), ("flush", 1)]);
    let completed = complete(&query, &corpus(), &Checkpoint::unbounded()).unwrap();
    assert_eq!(completed.unknown_edge_count(), 0);
    assert!(completed.equal_structure(&linear(&[("open", 1), ("write", 1), ("flush", 1)])));
}

#[test]
fn chained_unknown_query_is_rejected() {
    let err = QueryBuilder::parse("java.io.File.open()V ? ?")
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, SearchError::ChainedUnknown { .. }));
}

fn branching() -> History {
    let mut h = linear(&[("open", 2), ("read", 3), ("close", 1)]);
    h.join_from(&linear(&[("open", 2), ("write", 4), ("close", 1)]))
        .unwrap();
    h.join_from(&linear(&[("open", 2), ("seek", 1), ("close", 1)]))
        .unwrap();
    h
}

#[test]
fn top_sequences_returns_min_of_k_and_distinct() {
    let h = branching();
    let all = extract_top_sequences(None, &h, 10, 2, &Checkpoint::unbounded()).unwrap();
    assert_eq!(all.len(), 3);
    let scores: Vec<f64> = all.iter().map(|s| s.score).collect();
    assert_eq!(scores, vec![8.0, 6.0, 2.0]);

    let two = extract_top_sequences(None, &h, 2, 2, &Checkpoint::unbounded()).unwrap();
    assert_eq!(two.len(), 2);
    assert_eq!(two[0].score, 8.0);

    let distinct: BTreeSet<String> = all
        .iter()
        .map(|s| s.steps.iter().map(|(l, _)| l.to_string()).collect::<Vec<_>>().join(" "))
        .collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn top_sequences_with_query_keep_only_matches() {
    let query = linear(&[("open", 1), ("?", 1), ("close", 1)]);
    let h = branching();
    let all = extract_top_sequences(Some(&query), &h, 10, 2, &Checkpoint::unbounded()).unwrap();
    assert_eq!(all.len(), 3);

    let query = linear(&[("open", 1), ("write", 1)]);
    let filtered = extract_top_sequences(Some(&query), &h, 10, 2, &Checkpoint::unbounded()).unwrap();
    assert_eq!(filtered.len(), 1);
    let walk = filtered[0].to_history().unwrap();
    assert!(h.includes(&walk, &Checkpoint::unbounded()).unwrap());
}
