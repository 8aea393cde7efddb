//! Unknown-edge elimination: replace an unknown stretch with the concrete
//! paths a corpus of base histories shows between the same context and the
//! same continuation.

use apimine_core::constants::CHECKPOINT_STRIDE;
use apimine_core::errors::{HistoryError, Interrupt};
use apimine_core::types::collections::{FxHashMap, FxHashSet};
use apimine_core::Checkpoint;

use super::{History, NodeId, Transition, WeightPolicy};
use crate::label::LabelSet;

/// A partial history standing in for one unknown stretch: its root is glued
/// to the source of the unknown transition, `end` to the continuation
/// target.
struct Fragment {
    history: History,
    end: NodeId,
}

impl Fragment {
    fn absorb(&mut self, other: &Fragment) {
        let mut pinned = FxHashMap::default();
        pinned.insert(other.history.root, self.history.root);
        pinned.insert(other.end, self.end);
        let mut excluded = FxHashSet::default();
        excluded.insert(self.history.root);
        excluded.insert(self.end);
        self.history
            .absorb_pinned(&other.history, WeightPolicy::Max, &pinned, &excluded);
    }
}

impl History {
    /// Replace unknown transitions with concrete paths found in `base`.
    ///
    /// For an unknown transition `from -> to`, the context is the label set
    /// entering `from`, and each transition leaving `to` is a continuation.
    /// A continuation is resolved when some base history has a node entered
    /// by the context from which a concrete path reaches a transition
    /// matching the continuation. All such paths are spliced in between
    /// `from` and the continuation target, with interior weights rescaled to
    /// the unknown transition's weight. Transitions into the continuation
    /// target keep the continuation's own weight. The unknown transition
    /// itself is deleted only once every continuation is resolved.
    ///
    /// Unknown transitions into an active node, or with no continuation, are
    /// kept: nothing downstream pins down what they stand for.
    ///
    /// Returns how many unknown transitions were removed.
    pub fn eliminate_unknowns(
        &mut self,
        base: &[History],
        checkpoint: &Checkpoint,
    ) -> Result<usize, HistoryError> {
        let sites: Vec<(NodeId, NodeId, u64)> = self
            .transitions()
            .filter(|(_, _, t)| t.is_unknown())
            .map(|(from, to, t)| (from, to, t.weight))
            .collect();

        let mut removed = 0;
        for (from, to, weight) in sites {
            checkpoint.check()?;
            if !self.transition(from, to).is_some_and(Transition::is_unknown) {
                continue;
            }
            if self.is_active(to) {
                continue;
            }
            let continuations: Vec<(NodeId, Transition)> = self
                .outgoing(to)
                .filter(|(_, t)| !t.is_unknown())
                .map(|(target, t)| (target, t.clone()))
                .collect();
            if continuations.is_empty() {
                continue;
            }

            let context = self.incoming_labels(from);
            let mut resolved_all = true;
            for (target, continuation) in continuations {
                match collect_fragment(base, &context, &continuation, weight, checkpoint)? {
                    Some(fragment) => self.splice(from, target, &fragment),
                    None => resolved_all = false,
                }
            }
            if resolved_all {
                self.remove_transition(from, to);
                self.prune_unreachable();
                removed += 1;
            }
        }

        tracing::debug!(
            removed,
            remaining = self.unknown_edge_count(),
            "unknown elimination pass"
        );
        self.ensure_valid()?;
        Ok(removed)
    }

    /// Glue a fragment in with fresh interior nodes.
    fn splice(&mut self, from: NodeId, target: NodeId, fragment: &Fragment) {
        let mut pinned = FxHashMap::default();
        pinned.insert(fragment.history.root, from);
        pinned.insert(fragment.end, target);
        let excluded: FxHashSet<NodeId> = self.nodes().collect();
        self.absorb_pinned(&fragment.history, WeightPolicy::Max, &pinned, &excluded);
    }
}

/// Join the per-start-node fragments every base history contributes for one
/// continuation. `None` when no base history resolves it.
fn collect_fragment(
    base: &[History],
    context: &LabelSet,
    continuation: &Transition,
    unknown_weight: u64,
    checkpoint: &Checkpoint,
) -> Result<Option<Fragment>, Interrupt> {
    let mut fragment: Option<Fragment> = None;
    let mut steps = 0;
    for history in base {
        for start in history.nodes() {
            checkpoint.check_every(&mut steps, CHECKPOINT_STRIDE)?;
            if !context.is_empty() && !history.incoming_labels(start).matches(context) {
                continue;
            }
            let Some(found) = extract(history, start, context, continuation, unknown_weight) else {
                continue;
            };
            match fragment.as_mut() {
                Some(acc) => acc.absorb(&found),
                None => fragment = Some(found),
            }
        }
    }
    Ok(fragment)
}

/// The sub-history of `history` between `start` and the transitions that
/// match `continuation`, over concrete transitions only.
fn extract(
    history: &History,
    start: NodeId,
    context: &LabelSet,
    continuation: &Transition,
    unknown_weight: u64,
) -> Option<Fragment> {
    let concrete = |t: &Transition| !t.is_unknown();

    let mut region = FxHashSet::default();
    region.insert(start);
    let mut queue = vec![start];
    while let Some(node) = queue.pop() {
        for (next, t) in history.outgoing(node) {
            if concrete(t) && region.insert(next) {
                queue.push(next);
            }
        }
    }

    let mut region_sorted: Vec<NodeId> = region.iter().copied().collect();
    region_sorted.sort_unstable();

    let exits: Vec<(NodeId, &Transition)> = region_sorted
        .iter()
        .flat_map(|&u| history.outgoing(u).map(move |(_, t)| (u, t)))
        .filter(|(_, t)| concrete(t) && t.labels.overlaps(&continuation.labels))
        .collect();
    if exits.is_empty() {
        return None;
    }

    let mut body: FxHashSet<NodeId> = exits.iter().map(|&(u, _)| u).collect();
    let mut queue: Vec<NodeId> = body.iter().copied().collect();
    while let Some(node) = queue.pop() {
        for (prev, t) in history.incoming(node) {
            if concrete(t) && region.contains(&prev) && body.insert(prev) {
                queue.push(prev);
            }
        }
    }
    let body_sorted: Vec<NodeId> = region_sorted
        .into_iter()
        .filter(|n| body.contains(n))
        .collect();

    let mut entry: u64 = history
        .incoming(start)
        .filter(|(_, t)| concrete(t) && (context.is_empty() || t.labels.overlaps(context)))
        .map(|(_, t)| t.weight)
        .sum();
    if entry == 0 {
        entry = history
            .outgoing(start)
            .filter(|(next, t)| concrete(t) && body.contains(next))
            .map(|(_, t)| t.weight)
            .sum::<u64>()
            + exits
                .iter()
                .filter(|&&(u, _)| u == start)
                .map(|(_, t)| t.weight)
                .sum::<u64>();
    }
    let scale = |w: u64| -> u64 {
        if entry == 0 {
            return w.max(1);
        }
        let scaled = (w as f64 * unknown_weight as f64 / entry as f64).round();
        (scaled as u64).max(1)
    };

    let mut mini = History::new();
    mini.active.clear();
    mini.derived_from = history.sources();
    let mut map: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    map.insert(start, mini.root);
    for &node in &body_sorted {
        if node != start {
            map.insert(node, mini.graph.add_node(()));
        }
    }
    let end = mini.graph.add_node(());

    for &x in &body_sorted {
        for (y, t) in history.outgoing(x) {
            // The fragment root stands for a node outside the fragment, so
            // transitions back into `start` have nowhere to go.
            if !concrete(t) || y == start {
                continue;
            }
            if let (Some(&a), Some(&b)) = (map.get(&x), map.get(&y)) {
                mini.combine_transition(a, b, &t.labels, scale(t.weight), WeightPolicy::Max);
            }
        }
    }
    // Exits stand in for the continuation transition being replaced.
    for &(u, t) in &exits {
        if let Some(&a) = map.get(&u) {
            mini.combine_transition(a, end, &t.labels, continuation.weight, WeightPolicy::Max);
        }
    }

    Some(Fragment { history: mini, end })
}
