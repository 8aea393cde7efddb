//! Node matching: when two states, possibly in different histories, are
//! considered the same state.
//!
//! Two nodes match when their incoming label sets match (see
//! `LabelSet::matches`). When unknown labels are involved the incoming sets
//! alone say too little, so every pair of predecessors must match as well.
//! A node always matches itself.

use std::collections::BTreeSet;
use std::ptr;

use apimine_core::types::collections::FxHashMap;

use crate::history::{History, NodeId};
use crate::label::LabelSet;

static NO_LABELS: LabelSet = LabelSet::EMPTY;

/// Node matcher over a pair of histories with precomputed incoming label
/// sets, so repeated queries during a merge stay cheap.
pub struct Matcher<'a> {
    left: &'a History,
    right: &'a History,
    left_incoming: FxHashMap<NodeId, LabelSet>,
    right_incoming: FxHashMap<NodeId, LabelSet>,
}

impl<'a> Matcher<'a> {
    pub fn new(left: &'a History, right: &'a History) -> Self {
        let left_incoming = incoming_index(left);
        let right_incoming = if ptr::eq(left, right) {
            left_incoming.clone()
        } else {
            incoming_index(right)
        };
        Self {
            left,
            right,
            left_incoming,
            right_incoming,
        }
    }

    /// Whether `n1` of the left history matches `n2` of the right history.
    pub fn matches(&self, n1: NodeId, n2: NodeId) -> bool {
        if ptr::eq(self.left, self.right) && n1 == n2 {
            return self.left.contains_node(n1);
        }
        let (Some(in1), Some(in2)) = (self.left_incoming.get(&n1), self.right_incoming.get(&n2)) else {
            return false;
        };
        if !in1.matches(in2) {
            return false;
        }
        if in1.has_unknown() || in2.has_unknown() {
            let preds1: BTreeSet<NodeId> = self.left.predecessors(n1).collect();
            let preds2: BTreeSet<NodeId> = self.right.predecessors(n2).collect();
            for &p1 in &preds1 {
                for &p2 in &preds2 {
                    if !self.left_labels(p1).matches(self.right_labels(p2)) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Cached incoming label set of a left node.
    pub fn left_labels(&self, node: NodeId) -> &LabelSet {
        self.left_incoming.get(&node).unwrap_or(&NO_LABELS)
    }

    /// Cached incoming label set of a right node.
    pub fn right_labels(&self, node: NodeId) -> &LabelSet {
        self.right_incoming.get(&node).unwrap_or(&NO_LABELS)
    }
}

fn incoming_index(history: &History) -> FxHashMap<NodeId, LabelSet> {
    history
        .nodes()
        .map(|n| (n, history.incoming_labels(n)))
        .collect()
}

/// One-off node match without building a reusable matcher.
pub fn nodes_match(left: &History, n1: NodeId, right: &History, n2: NodeId) -> bool {
    Matcher::new(left, right).matches(n1, n2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::*;

    #[test]
    fn test_node_matches_itself() {
        let h = linear(&[("open", 1), ("?", 1), ("close", 1)]);
        let m = Matcher::new(&h, &h);
        for n in h.nodes() {
            assert!(m.matches(n, n));
        }
    }

    #[test]
    fn test_roots_match_across_histories() {
        let a = linear(&[("open", 1)]);
        let b = linear(&[("read", 1)]);
        assert!(nodes_match(&a, a.root(), &b, b.root()));
    }

    #[test]
    fn test_nodes_match_on_incoming_labels() {
        let a = linear(&[("open", 1), ("read", 1)]);
        let b = linear(&[("read", 3)]);
        let a_last = a.bfs_order()[2];
        let b_last = b.bfs_order()[1];
        assert!(nodes_match(&a, a_last, &b, b_last));
        assert!(!nodes_match(&a, a.bfs_order()[1], &b, b_last));
    }

    #[test]
    fn test_unknown_targets_also_compare_predecessors() {
        let a = linear(&[("open", 1), ("?", 1)]);
        let b = linear(&[("create", 1), ("?", 1)]);
        let a_last = a.bfs_order()[2];
        let b_last = b.bfs_order()[2];
        assert!(!nodes_match(&a, a_last, &b, b_last));

        let c = linear(&[("open", 5), ("?", 2)]);
        assert!(nodes_match(&a, a_last, &c, c.bfs_order()[2]));
    }
}
