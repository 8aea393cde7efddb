//! Join ("or", max weights) and merge ("and", summed weights).

use apimine_core::errors::HistoryError;
use apimine_core::types::collections::{FxHashMap, FxHashSet};

use super::{History, NodeId};
use crate::matcher::Matcher;

/// How the weights of two transitions landing on the same node pair combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightPolicy {
    /// Keep the larger weight (join).
    Max,
    /// Add the weights (merge).
    Sum,
}

impl WeightPolicy {
    pub fn combine(self, a: u64, b: u64) -> u64 {
        match self {
            Self::Max => a.max(b),
            Self::Sum => a.saturating_add(b),
        }
    }
}

impl History {
    /// Fold `other` into this history as an alternative ("or"). Transitions
    /// that land on the same node pair keep the larger weight.
    pub fn join_from(&mut self, other: &History) -> Result<(), HistoryError> {
        self.absorb(other, WeightPolicy::Max, false).map(|_| ())
    }

    /// Fold `other` into this history as additional evidence ("and").
    /// Transitions that land on the same node pair add their weights.
    ///
    /// With `inclusion`, `other` is known to be contained in this history, so
    /// its root is anchored at the first node whose outgoing labels match the
    /// root's outgoing labels instead of at this history's root.
    pub fn merge_from(&mut self, other: &History, inclusion: bool) -> Result<(), HistoryError> {
        self.absorb(other, WeightPolicy::Sum, inclusion).map(|_| ())
    }

    pub(crate) fn absorb(
        &mut self,
        other: &History,
        policy: WeightPolicy,
        inclusion: bool,
    ) -> Result<FxHashMap<NodeId, NodeId>, HistoryError> {
        let anchor = if inclusion {
            self.inclusion_anchor(other)
        } else {
            self.root
        };
        let mut pinned = FxHashMap::default();
        pinned.insert(other.root, anchor);
        let mapping = self.absorb_pinned(other, policy, &pinned, &FxHashSet::default());
        self.ensure_valid()?;
        Ok(mapping)
    }

    /// Core of join and merge. Every node of `other` is mapped once, before
    /// any transition is added: pinned nodes go where they are told, the rest
    /// to the first matching node here (skipping `excluded`), or to a fresh
    /// node. Returns the mapping from `other`'s nodes to this history's.
    pub(crate) fn absorb_pinned(
        &mut self,
        other: &History,
        policy: WeightPolicy,
        pinned: &FxHashMap<NodeId, NodeId>,
        excluded: &FxHashSet<NodeId>,
    ) -> FxHashMap<NodeId, NodeId> {
        let plan: Vec<(NodeId, Option<NodeId>)> = {
            let matcher = Matcher::new(self, other);
            let candidates: Vec<NodeId> = self.nodes().filter(|n| !excluded.contains(n)).collect();
            other
                .nodes()
                .map(|theirs| {
                    let ours = pinned.get(&theirs).copied().or_else(|| {
                        candidates
                            .iter()
                            .copied()
                            .find(|&ours| matcher.matches(ours, theirs))
                    });
                    (theirs, ours)
                })
                .collect()
        };

        let mut mapping = FxHashMap::default();
        for (theirs, ours) in plan {
            let ours = match ours {
                Some(node) => node,
                None => self.graph.add_node(()),
            };
            mapping.insert(theirs, ours);
        }

        for (from, to, t) in other.transitions() {
            let (Some(&a), Some(&b)) = (mapping.get(&from), mapping.get(&to)) else {
                continue;
            };
            if a == b && t.is_unknown() {
                continue;
            }
            self.combine_transition(a, b, &t.labels, t.weight, policy);
        }

        for node in other.active() {
            if let Some(&ours) = mapping.get(&node) {
                self.active.insert(ours);
            }
        }
        self.derived_from.extend(other.sources());
        mapping
    }

    /// First node whose outgoing label sets cover every outgoing label set of
    /// `other`'s root, falling back to the root.
    fn inclusion_anchor(&self, other: &History) -> NodeId {
        let wanted: Vec<_> = other.outgoing(other.root).map(|(_, t)| &t.labels).collect();
        if wanted.is_empty() {
            return self.root;
        }
        self.nodes()
            .find(|&node| {
                wanted
                    .iter()
                    .all(|w| self.outgoing(node).any(|(_, t)| t.labels.matches(w)))
            })
            .unwrap_or(self.root)
    }
}
