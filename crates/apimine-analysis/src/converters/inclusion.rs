//! Inclusion clustering: every history is merged into the top of its chain
//! of containers.
//!
//! 1. For each history, find every other history that contains it
//!    (in parallel; the containment test is pluggable).
//! 2. A tie-break picks one declared container per history.
//! 3. Following declared containers leads to a top container. Mutual
//!    containment forms a cycle; the cycle's lowest index is the top.
//! 4. Each cluster is the top container with every member merged in.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use apimine_core::constants::{TIE_BREAK_MOST_NODES, TIE_BREAK_MOST_TYPES};
use apimine_core::errors::{ConvertError, Interrupt};
use apimine_core::types::collections::FxHashMap;
use apimine_core::Checkpoint;
use rayon::prelude::*;

use super::Converter;
use crate::collection::Collection;
use crate::history::History;
use crate::label::Label;

/// Facts about one history, computed once per conversion.
pub struct Profile<'a> {
    pub index: usize,
    pub history: &'a History,
    pub node_count: usize,
    pub types: BTreeSet<String>,
    pub labels: BTreeSet<Label>,
    pub ordering: Option<BTreeSet<(Label, Label)>>,
}

impl<'a> Profile<'a> {
    pub fn new(index: usize, history: &'a History, with_ordering: bool) -> Self {
        Self {
            index,
            history,
            node_count: history.node_count(),
            types: history.types(),
            labels: history.labels_in_use(),
            ordering: with_ordering.then(|| history.ordering()),
        }
    }
}

/// Whether one history contains another.
pub trait Containment: Send + Sync {
    /// Whether this test reads `Profile::ordering`.
    fn needs_ordering(&self) -> bool {
        false
    }

    fn contains(
        &self,
        container: &Profile<'_>,
        contained: &Profile<'_>,
        checkpoint: &Checkpoint,
    ) -> Result<bool, Interrupt>;
}

/// `History::includes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralInclusion;

impl Containment for StructuralInclusion {
    fn contains(
        &self,
        container: &Profile<'_>,
        contained: &Profile<'_>,
        checkpoint: &Checkpoint,
    ) -> Result<bool, Interrupt> {
        if !container.labels.is_superset(&contained.labels) {
            return Ok(false);
        }
        container.history.includes(contained.history, checkpoint)
    }
}

/// `History::includes_with_unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownInclusion;

impl Containment for UnknownInclusion {
    fn contains(
        &self,
        container: &Profile<'_>,
        contained: &Profile<'_>,
        checkpoint: &Checkpoint,
    ) -> Result<bool, Interrupt> {
        container
            .history
            .includes_with_unknown(contained.history, checkpoint)
    }
}

/// Call-ordering inclusion: every ordering fact and every method of the
/// contained history also holds in the container.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderingInclusion;

impl Containment for OrderingInclusion {
    fn needs_ordering(&self) -> bool {
        true
    }

    fn contains(
        &self,
        container: &Profile<'_>,
        contained: &Profile<'_>,
        checkpoint: &Checkpoint,
    ) -> Result<bool, Interrupt> {
        checkpoint.check()?;
        let methods = |p: &Profile<'_>| -> BTreeSet<Label> {
            p.labels.iter().filter(|l| !l.is_unknown()).cloned().collect()
        };
        if !methods(container).is_superset(&methods(contained)) {
            return Ok(false);
        }
        Ok(match (&container.ordering, &contained.ordering) {
            (Some(outer), Some(inner)) => outer.is_superset(inner),
            _ => false,
        })
    }
}

/// How a history picks one declared container among several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Largest node count, then lowest index.
    #[default]
    MostNodes,
    /// Most participating types, then largest node count, then lowest index.
    MostTypes,
}

impl TieBreak {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TIE_BREAK_MOST_NODES => Some(Self::MostNodes),
            TIE_BREAK_MOST_TYPES => Some(Self::MostTypes),
            _ => None,
        }
    }

    pub fn pick(self, containers: &[usize], profiles: &[Profile<'_>]) -> Option<usize> {
        containers.iter().copied().max_by_key(|&j| {
            let p = &profiles[j];
            let types = match self {
                Self::MostNodes => 0,
                Self::MostTypes => p.types.len(),
            };
            (types, p.node_count, Reverse(j))
        })
    }
}

/// Inclusion clustering over a pluggable containment test.
pub struct InclusionClusterer {
    name: &'static str,
    containment: Box<dyn Containment>,
    tie_break: TieBreak,
}

impl InclusionClusterer {
    pub fn new(name: &'static str, containment: impl Containment + 'static, tie_break: TieBreak) -> Self {
        Self {
            name,
            containment: Box::new(containment),
            tie_break,
        }
    }

    fn containers(
        &self,
        profiles: &[Profile<'_>],
        checkpoint: &Checkpoint,
    ) -> Result<Vec<Vec<usize>>, Interrupt> {
        (0..profiles.len())
            .into_par_iter()
            .map(|i| {
                let mut found = Vec::new();
                for (j, container) in profiles.iter().enumerate() {
                    if j == i {
                        continue;
                    }
                    checkpoint.check()?;
                    if self.containment.contains(container, &profiles[i], checkpoint)? {
                        found.push(j);
                    }
                }
                Ok(found)
            })
            .collect()
    }
}

/// Follow declared containers from `start` to the top.
fn top_container(start: usize, declared: &[Option<usize>]) -> usize {
    let mut path = vec![start];
    let mut position: FxHashMap<usize, usize> = FxHashMap::default();
    position.insert(start, 0);
    let mut current = start;
    while let Some(next) = declared[current] {
        if let Some(&at) = position.get(&next) {
            return path[at..].iter().copied().min().unwrap_or(next);
        }
        position.insert(next, path.len());
        path.push(next);
        current = next;
    }
    current
}

impl Converter for InclusionClusterer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn convert(&self, input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        let with_ordering = self.containment.needs_ordering();
        let profiles: Vec<Profile<'_>> = input
            .histories()
            .par_iter()
            .enumerate()
            .map(|(i, h)| Profile::new(i, h, with_ordering))
            .collect();

        let containers = self.containers(&profiles, checkpoint)?;
        let declared: Vec<Option<usize>> = containers
            .iter()
            .map(|c| self.tie_break.pick(c, &profiles))
            .collect();

        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..profiles.len() {
            clusters
                .entry(top_container(i, &declared))
                .or_default()
                .push(i);
        }

        let mut output = input.empty_like();
        for (top, members) in clusters {
            checkpoint.check()?;
            let mut merged = input.histories()[top].clone();
            for i in members.into_iter().filter(|&i| i != top) {
                merged
                    .merge_from(&input.histories()[i], true)
                    .map_err(|e| ConvertError::from_history(self.name, e))?;
            }
            output.add(merged);
        }

        tracing::debug!(
            stage = self.name,
            input = input.len(),
            clusters = output.len(),
            "inclusion clustering"
        );
        Ok(output)
    }
}
