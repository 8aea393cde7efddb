//! Inclusion and content equality, decided by a backtracking search for an
//! embedding of a guest history into a host history.
//!
//! Guest nodes are assigned in breadth-first order. A node reached through
//! an already-assigned predecessor only tries that predecessor's successors
//! in the host, which keeps the search narrow on the tree-like shapes that
//! usage histories mostly have.

use apimine_core::constants::CHECKPOINT_STRIDE;
use apimine_core::errors::Interrupt;
use apimine_core::types::collections::{FxHashMap, FxHashSet};
use apimine_core::Checkpoint;

use super::{History, NodeId, Transition};
use crate::matcher::Matcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Bijective, equal labels, equal weights when `weighted`.
    Isomorphic { weighted: bool },
    /// Homomorphism rooted anywhere in the host; host labels are exact
    /// supersets of guest labels.
    Structural,
    /// Known parts matched node-by-node, unknown stretches bridged by
    /// reachability in the host.
    WithUnknown,
}

struct Embedding<'a> {
    host: &'a History,
    guest: &'a History,
    mode: Mode,
    matcher: Matcher<'a>,
    host_nodes: Vec<NodeId>,
    order: Vec<NodeId>,
    skipped: FxHashSet<NodeId>,
    assigned: FxHashMap<NodeId, NodeId>,
    used: FxHashSet<NodeId>,
    reach: FxHashMap<NodeId, FxHashSet<NodeId>>,
    checkpoint: &'a Checkpoint,
    steps: usize,
}

impl<'a> Embedding<'a> {
    fn new(host: &'a History, guest: &'a History, mode: Mode, checkpoint: &'a Checkpoint) -> Self {
        let matcher = Matcher::new(host, guest);
        let skipped: FxHashSet<NodeId> = if mode == Mode::WithUnknown {
            guest
                .nodes()
                .filter(|&n| matcher.right_labels(n).is_unknown())
                .collect()
        } else {
            FxHashSet::default()
        };
        let order = guest
            .bfs_order()
            .into_iter()
            .filter(|n| !skipped.contains(n))
            .collect();
        Self {
            host,
            guest,
            mode,
            matcher,
            host_nodes: host.nodes().collect(),
            order,
            skipped,
            assigned: FxHashMap::default(),
            used: FxHashSet::default(),
            reach: FxHashMap::default(),
            checkpoint,
            steps: 0,
        }
    }

    fn run(mut self) -> Result<bool, Interrupt> {
        self.checkpoint.check()?;
        if let Mode::Isomorphic { .. } = self.mode {
            if self.host.node_count() != self.guest.node_count()
                || self.host.edge_count() != self.guest.edge_count()
            {
                return Ok(false);
            }
        }
        self.extend(0)
    }

    fn extend(&mut self, depth: usize) -> Result<bool, Interrupt> {
        self.checkpoint.check_every(&mut self.steps, CHECKPOINT_STRIDE)?;
        let Some(&g) = self.order.get(depth) else {
            return self.complete();
        };
        for h in self.candidates(g) {
            if !self.admissible(g, h) {
                continue;
            }
            self.assigned.insert(g, h);
            let injective = matches!(self.mode, Mode::Isomorphic { .. });
            if injective {
                self.used.insert(h);
            }
            if self.consistent(g) && self.extend(depth + 1)? {
                return Ok(true);
            }
            self.assigned.remove(&g);
            if injective {
                self.used.remove(&h);
            }
        }
        Ok(false)
    }

    /// Whether a guest transition constrains the embedding edge-by-edge.
    fn checked(&self, from: NodeId, to: NodeId, t: &Transition) -> bool {
        match self.mode {
            Mode::WithUnknown => {
                !t.is_unknown() && !self.skipped.contains(&from) && !self.skipped.contains(&to)
            }
            _ => true,
        }
    }

    fn candidates(&self, g: NodeId) -> Vec<NodeId> {
        if g == self.guest.root() {
            return match self.mode {
                Mode::Structural => self.host_nodes.clone(),
                _ => vec![self.host.root()],
            };
        }
        let anchor = self
            .guest
            .incoming(g)
            .filter(|&(p, t)| self.checked(p, g, t))
            .find_map(|(p, _)| self.assigned.get(&p).copied());
        match anchor {
            Some(hp) => {
                let mut next: Vec<NodeId> = self.host.successors(hp).collect();
                next.sort_unstable();
                next.dedup();
                next
            }
            None => self.host_nodes.clone(),
        }
    }

    fn admissible(&self, g: NodeId, h: NodeId) -> bool {
        match self.mode {
            Mode::Isomorphic { .. } => !self.used.contains(&h) && self.matcher.matches(h, g),
            Mode::Structural => true,
            Mode::WithUnknown => {
                !self.matcher.left_labels(h).is_unknown() && self.matcher.matches(h, g)
            }
        }
    }

    /// Every checked guest transition between `g` and an assigned node has a
    /// compatible host transition.
    fn consistent(&self, g: NodeId) -> bool {
        let Some(&hg) = self.assigned.get(&g) else {
            return false;
        };
        let outgoing = self.guest.outgoing(g).map(|(x, t)| (g, x, t));
        let incoming = self.guest.incoming(g).map(|(x, t)| (x, g, t));
        for (from, to, t) in outgoing.chain(incoming) {
            if !self.checked(from, to, t) {
                continue;
            }
            let other = if from == g { to } else { from };
            let Some(&ho) = self.assigned.get(&other) else {
                continue;
            };
            let (hf, ht) = if from == g { (hg, ho) } else { (ho, hg) };
            let Some(host_t) = self.host.transition(hf, ht) else {
                return false;
            };
            let compatible = match self.mode {
                Mode::Isomorphic { weighted } => {
                    host_t.labels == t.labels && (!weighted || host_t.weight == t.weight)
                }
                Mode::Structural => host_t.labels.is_superset(&t.labels),
                Mode::WithUnknown => host_t.labels.covers(&t.labels),
            };
            if !compatible {
                return false;
            }
        }
        true
    }

    /// Final acceptance once every ordered guest node is assigned.
    fn complete(&mut self) -> Result<bool, Interrupt> {
        if self.mode != Mode::WithUnknown {
            return Ok(true);
        }
        let guest = self.guest;
        let host = self.host;
        for (f, t, unknown) in guest.transitions() {
            if !unknown.is_unknown() {
                continue;
            }
            let Some(&hf) = self.assigned.get(&f) else {
                continue;
            };
            for (t2, cont) in guest.outgoing(t) {
                if cont.is_unknown() {
                    continue;
                }
                let Some(&h2) = self.assigned.get(&t2) else {
                    continue;
                };
                self.checkpoint.check_every(&mut self.steps, CHECKPOINT_STRIDE)?;
                let reach = self
                    .reach
                    .entry(hf)
                    .or_insert_with(|| host.reachable_from(hf));
                let bridged = reach.iter().any(|&u| {
                    host.transition(u, h2)
                        .is_some_and(|ht| ht.labels.covers(&cont.labels))
                });
                if !bridged {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl History {
    /// Whether every transition of `other` maps onto a transition here with
    /// a superset of its labels, the embedding rooted at any node.
    pub fn includes(&self, other: &History, checkpoint: &Checkpoint) -> Result<bool, Interrupt> {
        Embedding::new(self, other, Mode::Structural, checkpoint).run()
    }

    /// Inclusion that lets each unknown transition of `other` stand for an
    /// arbitrary stretch here: the known parts must match node-by-node, and
    /// after the source of an unknown transition some reachable node must
    /// carry each continuation into the continuation's matched target.
    pub fn includes_with_unknown(
        &self,
        other: &History,
        checkpoint: &Checkpoint,
    ) -> Result<bool, Interrupt> {
        Embedding::new(self, other, Mode::WithUnknown, checkpoint).run()
    }

    /// Same shape, same labels, same weights. Active sets are not compared.
    pub fn equal_content(&self, other: &History) -> bool {
        self.isomorphic(other, true)
    }

    /// Same shape and labels, weights ignored.
    pub fn equal_structure(&self, other: &History) -> bool {
        self.isomorphic(other, false)
    }

    fn isomorphic(&self, other: &History, weighted: bool) -> bool {
        let checkpoint = Checkpoint::unbounded();
        Embedding::new(self, other, Mode::Isomorphic { weighted }, &checkpoint)
            .run()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn cp() -> Checkpoint {
        Checkpoint::unbounded()
    }

    #[test]
    fn test_equal_content_compares_weights() {
        let a = linear(&[("open", 1), ("close", 2)]);
        let b = linear(&[("open", 1), ("close", 2)]);
        let c = linear(&[("open", 1), ("close", 3)]);
        assert!(a.equal_content(&b));
        assert!(!a.equal_content(&c));
        assert!(a.equal_structure(&c));
    }

    #[test]
    fn test_includes_suffix_anywhere() {
        let host = linear(&[("open", 1), ("read", 1), ("close", 1)]);
        let guest = linear(&[("read", 1), ("close", 1)]);
        assert!(host.includes(&guest, &cp()).unwrap());
        assert!(!guest.includes(&host, &cp()).unwrap());
    }

    #[test]
    fn test_includes_is_reflexive() {
        let h = linear(&[("open", 1), ("?", 1), ("close", 1)]);
        assert!(h.includes(&h, &cp()).unwrap());
        assert!(h.includes_with_unknown(&h, &cp()).unwrap());
    }

    #[test]
    fn test_unknown_bridges_longer_stretch() {
        let host = linear(&[("a", 1), ("b", 1), ("c", 1)]);
        let guest = linear(&[("a", 1), ("?", 1), ("c", 1)]);
        assert!(host.includes_with_unknown(&guest, &cp()).unwrap());
        let other = linear(&[("a", 1), ("?", 1), ("d", 1)]);
        assert!(!host.includes_with_unknown(&other, &cp()).unwrap());
    }

    #[test]
    fn test_cancelled_checkpoint_stops_search() {
        let host = linear(&[("a", 1), ("b", 1)]);
        let cp = cp();
        cp.cancel();
        assert_eq!(host.includes(&host, &cp), Err(Interrupt::Cancelled));
        assert_eq!(host.includes_with_unknown(&host, &cp), Err(Interrupt::Cancelled));
    }
}
