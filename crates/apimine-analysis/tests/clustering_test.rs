//! Clustering converters over realistic little corpora.

mod common;

use apimine_analysis::converters::{
    create_converter, Converter, InclusionClusterer, OrderingInclusion, SameContentClusterer,
    StructuralInclusion, TieBreak, TypeIntersectionClusterer,
};
use apimine_analysis::{Collection, History};
use apimine_core::constants::{STAGE_INCLUSION_ORDERING, STAGE_INCLUSION_STRUCTURAL};
use apimine_core::Checkpoint;
use common::*;

fn convert(converter: &dyn Converter, input: &Collection) -> Collection {
    converter.convert(input, &Checkpoint::unbounded()).unwrap()
}

#[test]
fn type_intersection_collapses_transitive_overlap() {
    let mut input = Collection::default();
    input.add(touching(&["A", "B"]));
    input.add(touching(&["B", "C"]));
    input.add(touching(&["C", "D"]));
    input.add(touching(&["E", "F"]));

    let out = convert(&TypeIntersectionClusterer, &input);
    assert_eq!(out.len(), 2);
    let first: Vec<String> = out.get(0).unwrap().types().into_iter().collect();
    assert_eq!(first, vec!["A", "B", "C", "D"]);
    let second: Vec<String> = out.get(1).unwrap().types().into_iter().collect();
    assert_eq!(second, vec!["E", "F"]);
}

#[test]
fn same_content_ignores_weights() {
    let mut input = Collection::default();
    input.add(linear(&[("open", 1), ("close", 1)]));
    input.add(linear(&[("open", 7), ("close", 2)]));
    input.add(linear(&[("open", 1), ("read", 1)]));

    let out = convert(&SameContentClusterer::weightless(), &input);
    assert_eq!(out.len(), 2);
    assert_eq!(out.get(0).unwrap().max_weight(), 8);
}

#[test]
fn ordering_inclusion_accepts_gapped_subsequence() {
    let mut input = Collection::default();
    input.add(linear(&[("open", 1), ("close", 1)]));
    input.add(linear(&[("open", 1), ("read", 1), ("close", 1)]));

    let structural =
        InclusionClusterer::new(STAGE_INCLUSION_STRUCTURAL, StructuralInclusion, TieBreak::MostNodes);
    assert_eq!(convert(&structural, &input).len(), 2);

    let ordering = InclusionClusterer::new(STAGE_INCLUSION_ORDERING, OrderingInclusion, TieBreak::MostNodes);
    assert_eq!(convert(&ordering, &input).len(), 1);
}

fn tie_break_corpus() -> Collection {
    let mut wrapped = History::new();
    wrapped
        .extend_with_method_call(call_on("java.io.Stream", "wrap"), 1)
        .unwrap();
    wrapped.extend_with_method_call(call("read"), 1).unwrap();

    let mut input = Collection::default();
    input.add(linear(&[("read", 1)]));
    input.add(linear(&[("open", 1), ("read", 1), ("close", 1)]));
    input.add(wrapped);
    input
}

#[test]
fn most_nodes_tie_break_picks_longest_container() {
    let clusterer = create_converter(STAGE_INCLUSION_STRUCTURAL, TieBreak::MostNodes).unwrap();
    let out = convert(clusterer.as_ref(), &tie_break_corpus());
    assert_eq!(out.len(), 2);
    assert_eq!(out.get(0).unwrap().max_weight(), 2);
    assert_eq!(out.get(1).unwrap().max_weight(), 1);
}

#[test]
fn most_types_tie_break_picks_widest_container() {
    let clusterer = create_converter(STAGE_INCLUSION_STRUCTURAL, TieBreak::MostTypes).unwrap();
    let out = convert(clusterer.as_ref(), &tie_break_corpus());
    assert_eq!(out.len(), 2);
    assert_eq!(out.get(0).unwrap().max_weight(), 1);
    assert_eq!(out.get(1).unwrap().max_weight(), 2);
}

#[test]
fn cancelled_clustering_reports_interrupt() {
    let checkpoint = Checkpoint::unbounded();
    checkpoint.cancel();
    let clusterer = create_converter(STAGE_INCLUSION_STRUCTURAL, TieBreak::MostNodes).unwrap();
    let err = clusterer.convert(&tie_break_corpus(), &checkpoint).unwrap_err();
    assert!(err.interrupt().is_some_and(|i| i.is_cancelled()));
}
