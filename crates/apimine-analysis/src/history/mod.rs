//! History: a weighted automaton of method invocations on one object type.
//!
//! Nodes are abstract program states; transitions carry a label set and an
//! integer weight (how often the transition was observed). The root is the
//! unique entry node. Active nodes are the current frontier that
//! `extend_with_*` appends to.
//!
//! Invariants (checked by `validate`):
//! - the root has no incoming transition
//! - every other node has at least one incoming transition
//! - every label set is non-empty and entirely unknown or entirely concrete
//! - no unknown self-loops, and no unknown transition followed by another
//! - at most one transition per ordered node pair

mod combine;
mod embed;
mod eliminate;
mod stats;

use std::collections::{BTreeSet, VecDeque};

use apimine_core::errors::HistoryError;
use apimine_core::types::collections::{FxHashSet, SmallVec8};
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::label::{LabelSet, MethodRef};

pub use combine::WeightPolicy;
pub use stats::WeightStats;

/// Node handle inside one history. Handles from different histories are
/// unrelated even when numerically equal.
pub type NodeId = NodeIndex<u32>;

/// A labelled, weighted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub labels: LabelSet,
    pub weight: u64,
}

impl Transition {
    pub fn new(labels: LabelSet, weight: u64) -> Self {
        Self { labels, weight }
    }

    pub fn is_unknown(&self) -> bool {
        self.labels.is_unknown()
    }
}

fn default_validation() -> bool {
    cfg!(debug_assertions)
}

/// A weighted usage automaton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    graph: StableGraph<(), Transition, Directed>,
    root: NodeId,
    active: BTreeSet<NodeId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    derived_from: BTreeSet<String>,
    #[serde(skip, default = "default_validation")]
    validate_mutations: bool,
}

impl History {
    /// A history with only a root node, which is also the only active node.
    pub fn new() -> Self {
        let mut graph = StableGraph::new();
        let root = graph.add_node(());
        let mut active = BTreeSet::new();
        active.insert(root);
        Self {
            graph,
            root,
            active,
            title: None,
            derived_from: BTreeSet::new(),
            validate_mutations: default_validation(),
        }
    }

    /// An empty history carrying a title (usually the sample it came from).
    pub fn titled(title: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.title = Some(title.into());
        history
    }

    /// Turn post-mutation invariant checks on or off.
    pub fn set_validation(&mut self, enabled: bool) {
        self.validate_mutations = enabled;
    }

    pub fn validates_mutations(&self) -> bool {
        self.validate_mutations
    }

    // ---- Structure ----

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.graph.contains_node(node)
    }

    /// All nodes, in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// All transitions as `(from, to, transition)`.
    pub fn transitions(&self) -> impl Iterator<Item = (NodeId, NodeId, &Transition)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    /// The transition from `from` to `to`, if present.
    pub fn transition(&self, from: NodeId, to: NodeId) -> Option<&Transition> {
        self.graph
            .find_edge(from, to)
            .and_then(|e| self.graph.edge_weight(e))
    }

    /// Outgoing transitions of `node` as `(target, transition)`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &Transition)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
    }

    /// Incoming transitions of `node` as `(source, transition)`.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &Transition)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
    }

    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors_directed(node, Direction::Outgoing)
    }

    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors_directed(node, Direction::Incoming)
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.graph.edges_directed(node, Direction::Outgoing).count()
    }

    /// Union of the label sets of all transitions entering `node`.
    pub fn incoming_labels(&self, node: NodeId) -> LabelSet {
        let mut labels = LabelSet::new();
        for (_, t) in self.incoming(node) {
            labels.extend_from(&t.labels);
        }
        labels
    }

    /// Number of transitions with an unknown label set.
    pub fn unknown_edge_count(&self) -> usize {
        self.graph
            .edge_references()
            .filter(|e| e.weight().is_unknown())
            .count()
    }

    /// Nodes reachable from `start`, including `start`.
    pub fn reachable_from(&self, start: NodeId) -> FxHashSet<NodeId> {
        let mut seen = FxHashSet::default();
        if !self.graph.contains_node(start) {
            return seen;
        }
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            for next in self.successors(node) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Nodes in breadth-first order from the root, followed by any
    /// unreachable nodes in arena order.
    pub fn bfs_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.node_count());
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(self.root);
        queue.push_back(self.root);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            let mut next: SmallVec8<NodeId> = self.successors(node).collect();
            next.sort_unstable();
            for n in next {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        for node in self.graph.node_indices() {
            if seen.insert(node) {
                order.push(node);
            }
        }
        order
    }

    // ---- Active set ----

    pub fn active(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.active.iter().copied()
    }

    pub fn is_active(&self, node: NodeId) -> bool {
        self.active.contains(&node)
    }

    pub fn activate(&mut self, node: NodeId) -> Result<(), HistoryError> {
        self.require_node(node)?;
        self.active.insert(node);
        Ok(())
    }

    /// Replace the active set.
    pub fn set_active(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> Result<(), HistoryError> {
        let nodes: BTreeSet<NodeId> = nodes.into_iter().collect();
        for &node in &nodes {
            self.require_node(node)?;
        }
        self.active = nodes;
        Ok(())
    }

    // ---- Provenance ----

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Titles of the histories folded into this one.
    pub fn derived_from(&self) -> &BTreeSet<String> {
        &self.derived_from
    }

    /// Forget the title and every recorded source.
    pub fn clear_provenance(&mut self) {
        self.title = None;
        self.derived_from.clear();
    }

    /// This history's own title plus everything it was derived from.
    pub fn sources(&self) -> BTreeSet<String> {
        let mut sources = self.derived_from.clone();
        if let Some(title) = &self.title {
            sources.insert(title.clone());
        }
        sources
    }

    // ---- Construction ----

    /// Add a detached node. The caller must connect it before the history
    /// is validated again.
    pub fn add_node(&mut self) -> NodeId {
        self.graph.add_node(())
    }

    /// Add a transition, summing weights with an existing one on the same
    /// node pair.
    pub fn add_transition(
        &mut self,
        from: NodeId,
        to: NodeId,
        labels: LabelSet,
        weight: u64,
    ) -> Result<(), HistoryError> {
        self.require_node(from)?;
        self.require_node(to)?;
        if labels.is_empty() {
            return Err(HistoryError::InvariantViolated {
                detail: "transition with an empty label set".to_string(),
            });
        }
        self.combine_transition(from, to, &labels, weight, WeightPolicy::Sum);
        Ok(())
    }

    /// Append a call to every active node. Each active node gets its own
    /// fresh successor, and the successors become the active set.
    pub fn extend_with_method_call(&mut self, method: MethodRef, weight: u64) -> Result<(), HistoryError> {
        self.extend_with(LabelSet::method(method), weight)
    }

    /// Append an unknown stretch to every active node. Active nodes already
    /// reached by an unknown transition absorb it and stay active.
    pub fn extend_with_unknown(&mut self, weight: u64) -> Result<(), HistoryError> {
        self.extend_with(LabelSet::unknown(), weight)
    }

    /// Append `labels` to every active node.
    pub fn extend_with(&mut self, labels: LabelSet, weight: u64) -> Result<(), HistoryError> {
        if labels.is_empty() {
            return Err(HistoryError::InvariantViolated {
                detail: "extension with an empty label set".to_string(),
            });
        }
        let unknown = labels.is_unknown();
        let frontier: Vec<NodeId> = self.active.iter().copied().collect();
        let mut next = BTreeSet::new();
        let mut sources = Vec::with_capacity(frontier.len());
        for node in frontier {
            if unknown && self.incoming_labels(node).is_unknown() {
                next.insert(node);
            } else {
                sources.push(node);
            }
        }
        for from in sources {
            let target = self.graph.add_node(());
            self.combine_transition(from, target, &labels, weight, WeightPolicy::Sum);
            next.insert(target);
        }
        if !next.is_empty() {
            self.active = next;
        }
        self.ensure_valid()
    }

    /// Add `weight` to an existing edge or create it. Unknown and concrete
    /// label sets never mix: concrete labels replace a placeholder, and a
    /// placeholder arriving on a concrete edge only contributes weight.
    pub(crate) fn combine_transition(
        &mut self,
        from: NodeId,
        to: NodeId,
        labels: &LabelSet,
        weight: u64,
        policy: WeightPolicy,
    ) {
        match self.graph.find_edge(from, to) {
            Some(edge) => {
                let existing = &mut self.graph[edge];
                if existing.labels.is_unknown() == labels.is_unknown() {
                    existing.labels.extend_from(labels);
                } else if existing.labels.is_unknown() {
                    existing.labels = labels.clone();
                }
                existing.weight = policy.combine(existing.weight, weight);
            }
            None => {
                self.graph
                    .add_edge(from, to, Transition::new(labels.clone(), weight));
            }
        }
    }

    pub(crate) fn remove_transition(&mut self, from: NodeId, to: NodeId) -> Option<Transition> {
        let edge = self.graph.find_edge(from, to)?;
        self.graph.remove_edge(edge)
    }

    /// Drop every node unreachable from the root. Returns how many went.
    pub fn prune_unreachable(&mut self) -> usize {
        let reachable = self.reachable_from(self.root);
        let dead: Vec<NodeId> = self
            .graph
            .node_indices()
            .filter(|n| !reachable.contains(n))
            .collect();
        for &node in &dead {
            self.graph.remove_node(node);
            self.active.remove(&node);
        }
        dead.len()
    }

    fn require_node(&self, node: NodeId) -> Result<(), HistoryError> {
        if self.graph.contains_node(node) {
            Ok(())
        } else {
            Err(HistoryError::UnknownNode {
                index: node.index(),
            })
        }
    }

    // ---- Invariants ----

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), HistoryError> {
        let violation = |detail: String| Err(HistoryError::InvariantViolated { detail });

        if !self.graph.contains_node(self.root) {
            return violation("root node missing".to_string());
        }
        if self.incoming(self.root).next().is_some() {
            return violation("root has an incoming transition".to_string());
        }
        for node in self.graph.node_indices() {
            if node != self.root && self.incoming(node).next().is_none() {
                return violation(format!("node {} has no incoming transition", node.index()));
            }
        }
        for &node in &self.active {
            if !self.graph.contains_node(node) {
                return violation(format!("active node {} is not in the history", node.index()));
            }
        }

        let mut pairs = FxHashSet::default();
        for edge in self.graph.edge_references() {
            let (from, to, t) = (edge.source(), edge.target(), edge.weight());
            if !pairs.insert((from, to)) {
                return violation(format!(
                    "duplicate transition {} -> {}",
                    from.index(),
                    to.index()
                ));
            }
            if t.labels.is_empty() {
                return violation(format!("empty label set on {} -> {}", from.index(), to.index()));
            }
            if t.labels.is_mixed() {
                return violation(format!(
                    "mixed unknown and concrete labels on {} -> {}",
                    from.index(),
                    to.index()
                ));
            }
            if t.is_unknown() {
                if from == to {
                    return violation(format!("unknown self-loop on {}", from.index()));
                }
                if self.outgoing(to).any(|(_, next)| next.is_unknown()) {
                    return violation(format!("chained unknown transitions through {}", to.index()));
                }
            }
        }
        Ok(())
    }

    /// Validate when mutation checks are on.
    pub(crate) fn ensure_valid(&self) -> Result<(), HistoryError> {
        if self.validate_mutations {
            self.validate()
        } else {
            Ok(())
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_new_history_is_root_only() {
        let h = History::new();
        assert_eq!(h.node_count(), 1);
        assert_eq!(h.edge_count(), 0);
        assert!(h.is_active(h.root()));
        assert!(h.validate().is_ok());
    }

    #[test]
    fn test_extend_moves_frontier() {
        let h = linear(&[("open", 1), ("read", 2)]);
        assert_eq!(h.node_count(), 3);
        assert_eq!(h.active().count(), 1);
        let last = h.active().next().unwrap();
        assert_eq!(h.incoming_labels(last), labels("read"));
    }

    #[test]
    fn test_extend_forks_every_active_node() {
        let mut h = linear(&[("open", 1), ("read", 1)]);
        h.join_from(&linear(&[("open", 1), ("write", 1)])).unwrap();
        assert_eq!(h.active().count(), 2);
        h.extend_with_method_call(call("close"), 1).unwrap();
        assert_eq!(h.active().count(), 2);
        assert_eq!(h.node_count(), 6);
        assert!(h.active().all(|n| h.incoming_labels(n) == labels("close")));
    }

    #[test]
    fn test_unknown_extension_is_absorbed() {
        let h = linear(&[("open", 1), ("?", 1), ("?", 1)]);
        assert_eq!(h.unknown_edge_count(), 1);
        assert!(h.validate().is_ok());
    }

    #[test]
    fn test_root_with_incoming_edge_is_invalid() {
        let mut h = linear(&[("open", 1)]);
        h.set_validation(false);
        let last = h.active().next().unwrap();
        h.add_transition(last, h.root(), labels("close"), 1).unwrap();
        assert!(h.validate().is_err());
    }

    #[test]
    fn test_add_transition_rejects_foreign_node() {
        let mut h = History::new();
        let other = linear(&[("a", 1), ("b", 1), ("c", 1)]);
        let foreign = other.bfs_order()[3];
        let err = h.add_transition(h.root(), foreign, labels("x"), 1);
        assert!(matches!(err, Err(HistoryError::UnknownNode { .. })));
    }

    #[test]
    fn test_prune_unreachable_drops_orphans() {
        let mut h = linear(&[("a", 1)]);
        h.set_validation(false);
        let orphan = h.add_node();
        h.activate(orphan).unwrap();
        assert_eq!(h.prune_unreachable(), 1);
        assert!(!h.is_active(orphan));
        assert!(h.validate().is_ok());
    }
}
