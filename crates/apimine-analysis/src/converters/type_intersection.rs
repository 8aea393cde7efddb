//! Type-intersection clustering: histories that share any participating
//! type end up in one cluster, transitively.

use std::collections::BTreeMap;

use apimine_core::constants::{CHECKPOINT_STRIDE, STAGE_TYPE_INTERSECTION};
use apimine_core::errors::ConvertError;
use apimine_core::types::collections::FxHashMap;
use apimine_core::Checkpoint;
use rayon::prelude::*;

use super::Converter;
use crate::collection::Collection;

/// Disjoint sets over history indices. The representative of a set is
/// always its lowest index, so clusters are named after their first
/// member.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeIntersectionClusterer;

impl Converter for TypeIntersectionClusterer {
    fn name(&self) -> &'static str {
        STAGE_TYPE_INTERSECTION
    }

    fn convert(&self, input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        let types: Vec<_> = input.histories().par_iter().map(|h| h.types()).collect();

        let mut sets = DisjointSets::new(input.len());
        let mut first_with_type: FxHashMap<&str, usize> = FxHashMap::default();
        let mut steps = 0;
        for (i, owned) in types.iter().enumerate() {
            for ty in owned {
                checkpoint.check_every(&mut steps, CHECKPOINT_STRIDE)?;
                match first_with_type.get(ty.as_str()) {
                    Some(&j) => sets.union(i, j),
                    None => {
                        first_with_type.insert(ty.as_str(), i);
                    }
                }
            }
        }

        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..input.len() {
            clusters.entry(sets.find(i)).or_default().push(i);
        }

        let mut output = input.empty_like();
        for (first, members) in clusters {
            checkpoint.check()?;
            let mut merged = input.histories()[first].clone();
            for i in members.into_iter().skip(1) {
                merged
                    .merge_from(&input.histories()[i], false)
                    .map_err(|e| ConvertError::from_history(STAGE_TYPE_INTERSECTION, e))?;
            }
            output.add(merged);
        }
        tracing::debug!(input = input.len(), clusters = output.len(), "type-intersection clustering");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::label::MethodRef;

    fn on(owner: &str, name: &str) -> History {
        let mut h = History::new();
        h.extend_with_method_call(MethodRef::new(owner, name, "()V"), 1)
            .unwrap();
        h
    }

    #[test]
    fn test_disjoint_sets_keep_lowest_representative() {
        let mut sets = DisjointSets::new(4);
        sets.union(3, 1);
        sets.union(1, 2);
        assert_eq!(sets.find(3), 1);
        assert_eq!(sets.find(2), 1);
        assert_eq!(sets.find(0), 0);
    }

    #[test]
    fn test_shared_types_cluster_transitively() {
        let mut a = on("File", "open");
        a.extend_with_method_call(MethodRef::new("Stream", "read", "()I"), 1)
            .unwrap();
        let mut input = Collection::default();
        input.add(on("Socket", "connect"));
        input.add(a);
        input.add(on("Stream", "close"));
        input.add(on("File", "delete"));

        let out = TypeIntersectionClusterer
            .convert(&input, &Checkpoint::unbounded())
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(1).unwrap().types().len(), 2);
    }
}
