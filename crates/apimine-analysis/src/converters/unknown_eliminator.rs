//! Repeated unknown elimination against the collection itself.

use apimine_core::constants::STAGE_ELIMINATE_UNKNOWNS;
use apimine_core::errors::ConvertError;
use apimine_core::Checkpoint;
use rayon::prelude::*;

use super::Converter;
use crate::collection::Collection;
use crate::history::History;

/// Runs `eliminate_unknowns` on every history, using the whole collection
/// as the base, until the total unknown-edge count stops decreasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownEliminator;

impl UnknownEliminator {
    pub fn new() -> Self {
        Self
    }

    fn pass(&self, current: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        let base = current.histories();
        let histories = base
            .par_iter()
            .map(|h| {
                let mut h: History = h.clone();
                if h.unknown_edge_count() > 0 {
                    h.eliminate_unknowns(base, checkpoint)
                        .map_err(|e| ConvertError::from_history(STAGE_ELIMINATE_UNKNOWNS, e))?;
                }
                Ok(h)
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;
        Ok(Collection::with_histories(current.context().clone(), histories))
    }
}

impl Converter for UnknownEliminator {
    fn name(&self) -> &'static str {
        STAGE_ELIMINATE_UNKNOWNS
    }

    fn convert(&self, input: &Collection, checkpoint: &Checkpoint) -> Result<Collection, ConvertError> {
        let mut current = input.clone();
        let mut count = current.unknown_edge_count();
        let mut passes = 0;
        while count > 0 {
            let next = self.pass(&current, checkpoint)?;
            let next_count = next.unknown_edge_count();
            passes += 1;
            tracing::debug!(
                unknown_edges = next_count,
                pass = passes,
                "unknown elimination pass"
            );
            if next_count >= count {
                break;
            }
            current = next;
            count = next_count;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::*;

    #[test]
    fn test_gaps_are_filled_from_siblings() {
        let mut input = Collection::default();
        input.add(linear(&[("a", 1), ("b", 1), ("c", 1)]));
        input.add(linear(&[("a", 1), ("?", 1), ("c", 1)]));
        let out = UnknownEliminator::new()
            .convert(&input, &Checkpoint::unbounded())
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.unknown_edge_count(), 0);
        assert!(out.get(1).unwrap().equal_structure(out.get(0).unwrap()));
    }

    #[test]
    fn test_stops_when_nothing_resolves() {
        let mut input = Collection::default();
        input.add(linear(&[("a", 1), ("?", 1), ("z", 1)]));
        let out = UnknownEliminator::new()
            .convert(&input, &Checkpoint::unbounded())
            .unwrap();
        assert_eq!(out.unknown_edge_count(), 1);
    }
}
