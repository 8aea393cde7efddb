//! History engine benchmarks.
//!
//! Benchmarks: merging many linear histories, unknown elimination against a
//! corpus, and top-k sequence extraction.
//! Run with: cargo bench -p apimine-analysis --bench history_bench

use apimine_analysis::search::extract_top_sequences;
use apimine_analysis::{History, MethodRef};
use apimine_core::Checkpoint;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const CALLS: [&str; 6] = ["open", "read", "write", "flush", "seek", "close"];

/// Linear history `open, <i-dependent middle>, close`.
fn sample(i: usize, gap: bool) -> History {
    let mut h = History::new();
    h.extend_with_method_call(MethodRef::new("java.io.File", "open", "()V"), 1)
        .unwrap();
    if gap {
        h.extend_with_unknown(1).unwrap();
    } else {
        for step in 0..(i % 4 + 1) {
            let name = CALLS[1 + (i + step) % 4];
            h.extend_with_method_call(MethodRef::new("java.io.File", name, "()V"), 1)
                .unwrap();
        }
    }
    h.extend_with_method_call(MethodRef::new("java.io.File", "close", "()V"), 1)
        .unwrap();
    h
}

fn merge_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_merge");
    for size in [10, 100, 500] {
        let inputs: Vec<History> = (0..size).map(|i| sample(i, false)).collect();
        group.bench_with_input(BenchmarkId::new("merge_from", size), &inputs, |b, inputs| {
            b.iter(|| {
                let mut merged = History::new();
                for h in inputs {
                    merged.merge_from(h, false).unwrap();
                }
                merged
            });
        });
    }
    group.finish();
}

fn eliminate(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_eliminate");
    group.sample_size(20);
    for size in [10, 100] {
        let base: Vec<History> = (0..size).map(|i| sample(i, false)).collect();
        let query = sample(0, true);
        group.bench_with_input(BenchmarkId::new("eliminate_unknowns", size), &base, |b, base| {
            b.iter(|| {
                let mut h = query.clone();
                h.eliminate_unknowns(base, &Checkpoint::unbounded()).unwrap();
                h
            });
        });
    }
    group.finish();
}

fn top_sequences(c: &mut Criterion) {
    let mut merged = History::new();
    for i in 0..200 {
        merged.merge_from(&sample(i, false), false).unwrap();
    }
    c.bench_function("extract_top_sequences", |b| {
        b.iter(|| extract_top_sequences(None, &merged, 10, 2, &Checkpoint::unbounded()).unwrap());
    });
}

criterion_group!(benches, merge_many, eliminate, top_sequences);
criterion_main!(benches);
