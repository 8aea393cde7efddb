//! Top-k method sequences of a history.
//!
//! Walks start at the root and may visit each node at most `max_repeat`
//! times. A walk is reported when it reaches a node without successors, an
//! active node, or a node it cannot leave without breaking the repetition
//! bound. Walks with the same label sequence are reported once, with their
//! best score. The score of a walk is the product of its weights.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use apimine_core::constants::CHECKPOINT_STRIDE;
use apimine_core::errors::{HistoryError, SearchError};
use apimine_core::types::collections::FxHashMap;
use apimine_core::Checkpoint;

use crate::history::{History, NodeId};
use crate::label::LabelSet;

/// One walk through a history.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSequence {
    pub steps: Vec<(LabelSet, u64)>,
    pub score: f64,
}

impl MethodSequence {
    fn new(steps: Vec<(LabelSet, u64)>) -> Self {
        let score = steps.iter().map(|(_, w)| *w as f64).product();
        Self { steps, score }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Rebuild the walk as a one-path history.
    pub fn to_history(&self) -> Result<History, HistoryError> {
        let mut history = History::new();
        for (labels, weight) in &self.steps {
            history.extend_with(labels.clone(), *weight)?;
        }
        Ok(history)
    }
}

/// Heap entry: higher score first, earlier discovery breaks ties.
struct Ranked {
    sequence: MethodSequence,
    order: usize,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sequence
            .score
            .total_cmp(&other.sequence.score)
            .then_with(|| other.order.cmp(&self.order))
    }
}

struct Frame {
    node: NodeId,
    edges: Vec<(NodeId, LabelSet, u64)>,
    next: usize,
    extended: bool,
    reported: bool,
}

/// The `k` best-scoring walks of `history`, best first.
///
/// With a `query`, only walks whose one-path history includes it (unknown
/// steps standing for any stretch) are kept.
pub fn extract_top_sequences(
    query: Option<&History>,
    history: &History,
    k: usize,
    max_repeat: u32,
    checkpoint: &Checkpoint,
) -> Result<Vec<MethodSequence>, SearchError> {
    if k == 0 {
        return Err(SearchError::ZeroTopK);
    }
    let max_repeat = max_repeat.max(1);

    let frame = |node: NodeId, reported: bool| {
        let mut edges: Vec<_> = history
            .outgoing(node)
            .map(|(to, t)| (to, t.labels.clone(), t.weight))
            .collect();
        edges.sort_by_key(|(to, _, _)| *to);
        Frame {
            node,
            edges,
            next: 0,
            extended: false,
            reported,
        }
    };

    // Distinct label sequences, each with its best walk and discovery order.
    let mut found: FxHashMap<Vec<LabelSet>, (MethodSequence, usize)> = FxHashMap::default();
    let mut report = |path: &[(LabelSet, u64)]| {
        let key: Vec<LabelSet> = path.iter().map(|(l, _)| l.clone()).collect();
        let candidate = MethodSequence::new(path.to_vec());
        let order = found.len();
        let entry = found.entry(key).or_insert_with(|| (candidate.clone(), order));
        if candidate.score > entry.0.score {
            entry.0 = candidate;
        }
    };

    let mut visits: FxHashMap<NodeId, u32> = FxHashMap::default();
    visits.insert(history.root(), 1);
    let mut path: Vec<(LabelSet, u64)> = Vec::new();
    let mut stack = vec![frame(history.root(), false)];
    let mut steps = 0;

    while let Some(top) = stack.last_mut() {
        checkpoint.check_every(&mut steps, CHECKPOINT_STRIDE)?;
        if let Some((to, labels, weight)) = top.edges.get(top.next).cloned() {
            top.next += 1;
            let seen = visits.entry(to).or_insert(0);
            if *seen >= max_repeat {
                continue;
            }
            *seen += 1;
            top.extended = true;
            path.push((labels, weight));
            let reported = history.is_active(to) && history.out_degree(to) > 0;
            if reported {
                report(&path);
            }
            stack.push(frame(to, reported));
            continue;
        }

        let Some(done) = stack.pop() else { break };
        if !done.extended && !done.reported && !path.is_empty() {
            report(&path);
        }
        if !stack.is_empty() {
            path.pop();
            if let Some(seen) = visits.get_mut(&done.node) {
                *seen -= 1;
            }
        }
    }

    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
    for (sequence, order) in found.into_values() {
        checkpoint.check()?;
        if let Some(query) = query {
            let walk = sequence.to_history().map_err(SearchError::from_history)?;
            if !walk.includes_with_unknown(query, checkpoint)? {
                continue;
            }
        }
        heap.push(Reverse(Ranked { sequence, order }));
        if heap.len() > k {
            heap.pop();
        }
    }

    // Ascending order of `Reverse` is descending order of `Ranked`.
    let best: Vec<MethodSequence> = heap
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| r.sequence)
        .collect();
    tracing::debug!(k, returned = best.len(), "top sequences extracted");
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::*;

    fn diamond() -> History {
        // open -> (read x5 | write x2) -> close x3
        let mut h = History::new();
        let root = h.root();
        let opened = h.add_node();
        let (read, wrote, closed) = (h.add_node(), h.add_node(), h.add_node());
        h.add_transition(root, opened, labels("open"), 1).unwrap();
        h.add_transition(opened, read, labels("read"), 5).unwrap();
        h.add_transition(opened, wrote, labels("write"), 2).unwrap();
        h.add_transition(read, closed, labels("close"), 3).unwrap();
        h.add_transition(wrote, closed, labels("close"), 3).unwrap();
        h.set_active([closed]).unwrap();
        h
    }

    fn names(sequence: &MethodSequence) -> Vec<String> {
        sequence.steps.iter().map(|(l, _)| l.to_string()).collect()
    }

    #[test]
    fn test_sequences_ordered_by_weight_product() {
        let top = extract_top_sequences(None, &diamond(), 5, 2, &Checkpoint::unbounded()).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].score, 15.0);
        assert_eq!(top[1].score, 6.0);
        assert!(names(&top[0])[1].contains("read"));
    }

    #[test]
    fn test_k_bounds_the_result() {
        let top = extract_top_sequences(None, &diamond(), 1, 2, &Checkpoint::unbounded()).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].score, 15.0);
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let err = extract_top_sequences(None, &diamond(), 0, 2, &Checkpoint::unbounded()).unwrap_err();
        assert!(matches!(err, SearchError::ZeroTopK));
    }

    #[test]
    fn test_query_filters_walks() {
        let query = linear(&[("open", 1), ("?", 1), ("close", 1)]);
        let top = extract_top_sequences(Some(&query), &diamond(), 5, 2, &Checkpoint::unbounded()).unwrap();
        assert_eq!(top.len(), 2);
        let query = linear(&[("write", 1)]);
        let top = extract_top_sequences(Some(&query), &diamond(), 5, 2, &Checkpoint::unbounded()).unwrap();
        assert!(top.is_empty());
    }

    #[test]
    fn test_cycles_respect_repeat_bound() {
        // root -a-> x -b-> x (self loop)
        let mut h = History::new();
        let x = h.add_node();
        h.add_transition(h.root(), x, labels("a"), 2).unwrap();
        h.add_transition(x, x, labels("b"), 3).unwrap();
        let once = extract_top_sequences(None, &h, 10, 1, &Checkpoint::unbounded()).unwrap();
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].len(), 1);
        let twice = extract_top_sequences(None, &h, 10, 2, &Checkpoint::unbounded()).unwrap();
        assert_eq!(twice.len(), 1);
        assert_eq!(twice[0].len(), 2);
        assert_eq!(twice[0].score, 6.0);
    }

    #[test]
    fn test_walk_rebuilds_into_linear_history() {
        let top = extract_top_sequences(None, &diamond(), 1, 2, &Checkpoint::unbounded()).unwrap();
        let walk = top[0].to_history().unwrap();
        assert_eq!(walk.edge_count(), 3);
        assert!(diamond().includes(&walk, &Checkpoint::unbounded()).unwrap());
    }
}
