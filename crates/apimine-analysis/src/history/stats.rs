//! Structural statistics, content hashing and derived label facts.

use std::collections::BTreeSet;

use apimine_core::types::collections::{FxHashMap, FxHashSet};
use xxhash_rust::xxh3::Xxh3;

use super::{History, NodeId};
use crate::label::Label;

/// Weight statistics over the transitions that count: unknown transitions
/// and transitions carrying a constructor are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightStats {
    pub average: f64,
    pub max: u64,
    pub counted: usize,
}

impl History {
    /// Length of the longest acyclic path from the root, in transitions.
    ///
    /// Iterative depth-first search with memoisation. A node's memo entry is
    /// seeded with 0 before its successors are explored, so a back-edge to a
    /// node still on the stack contributes 1 instead of recursing forever.
    pub fn depth(&self) -> usize {
        struct Frame {
            node: NodeId,
            succs: Vec<NodeId>,
            next: usize,
            best: usize,
        }

        let mut memo: FxHashMap<NodeId, usize> = FxHashMap::default();
        memo.insert(self.root, 0);
        let mut stack = vec![Frame {
            node: self.root,
            succs: self.successors(self.root).collect(),
            next: 0,
            best: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(&succ) = frame.succs.get(frame.next) {
                frame.next += 1;
                if let Some(&known) = memo.get(&succ) {
                    frame.best = frame.best.max(known + 1);
                } else {
                    memo.insert(succ, 0);
                    let succs = self.successors(succ).collect();
                    stack.push(Frame {
                        node: succ,
                        succs,
                        next: 0,
                        best: 0,
                    });
                }
                continue;
            }
            let Some(done) = stack.pop() else { break };
            memo.insert(done.node, done.best);
            if let Some(parent) = stack.last_mut() {
                parent.best = parent.best.max(done.best + 1);
            }
        }
        memo.get(&self.root).copied().unwrap_or(0)
    }

    /// Largest number of outgoing transitions on any node.
    pub fn max_degree(&self) -> usize {
        self.nodes().map(|n| self.out_degree(n)).max().unwrap_or(0)
    }

    pub fn weight_stats(&self) -> WeightStats {
        let mut total: u128 = 0;
        let mut max = 0;
        let mut counted = 0;
        for (_, _, t) in self.transitions() {
            if t.is_unknown() || t.labels.has_constructor() {
                continue;
            }
            total += u128::from(t.weight);
            max = max.max(t.weight);
            counted += 1;
        }
        let average = if counted == 0 {
            0.0
        } else {
            total as f64 / counted as f64
        };
        WeightStats {
            average,
            max,
            counted,
        }
    }

    pub fn average_weight(&self) -> f64 {
        self.weight_stats().average
    }

    pub fn max_weight(&self) -> u64 {
        self.weight_stats().max
    }

    /// Hash of the weightless content: transition count plus the set of
    /// labels in use. Histories with equal content always hash equally.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&(self.edge_count() as u64).to_le_bytes());
        for label in self.labels_in_use() {
            hasher.update(label.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hasher.digest()
    }

    /// Every distinct label on any transition, unknown included.
    pub fn labels_in_use(&self) -> BTreeSet<Label> {
        self.transitions()
            .flat_map(|(_, _, t)| t.labels.iter().cloned())
            .collect()
    }

    /// Concrete labels on any transition.
    pub fn methods(&self) -> BTreeSet<Label> {
        self.labels_in_use()
            .into_iter()
            .filter(|l| !l.is_unknown())
            .collect()
    }

    /// Declaring types of every concrete label.
    pub fn types(&self) -> BTreeSet<String> {
        self.transitions()
            .flat_map(|(_, _, t)| t.labels.iter().filter_map(|l| l.owner().map(str::to_string)))
            .collect()
    }

    /// Ordering facts: `(a, b)` whenever a transition labelled `b` can be
    /// taken after a transition labelled `a`. Unknown labels are left out.
    pub fn ordering(&self) -> BTreeSet<(Label, Label)> {
        let mut reach: FxHashMap<NodeId, FxHashSet<NodeId>> = FxHashMap::default();
        let mut pairs = BTreeSet::new();
        for (_, y, first) in self.transitions() {
            if first.is_unknown() {
                continue;
            }
            let after = reach.entry(y).or_insert_with(|| self.reachable_from(y));
            for &z in after.iter() {
                for (_, second) in self.outgoing(z) {
                    if second.is_unknown() {
                        continue;
                    }
                    for a in &first.labels {
                        for b in &second.labels {
                            pairs.insert((a.clone(), b.clone()));
                        }
                    }
                }
            }
        }
        pairs
    }
}
