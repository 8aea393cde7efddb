//! Collection: an ordered set of histories sharing one mining context.

use std::path::Path;
use std::sync::Arc;

use apimine_core::errors::StorageError;
use apimine_core::MinerContext;
use serde::{Deserialize, Serialize};

use crate::history::History;

/// Version tag written into saved collections.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CollectionFile {
    format_version: u32,
    histories: Vec<History>,
}

/// An ordered set of histories plus the context every operation on them
/// runs under.
#[derive(Debug, Clone)]
pub struct Collection {
    context: Arc<MinerContext>,
    histories: Vec<History>,
}

impl Collection {
    pub fn new(context: Arc<MinerContext>) -> Self {
        Self {
            context,
            histories: Vec::new(),
        }
    }

    pub fn with_histories(context: Arc<MinerContext>, histories: Vec<History>) -> Self {
        let mut collection = Self::new(context);
        for history in histories {
            collection.add(history);
        }
        collection
    }

    /// An empty collection under the same context.
    pub fn empty_like(&self) -> Self {
        Self::new(Arc::clone(&self.context))
    }

    pub fn context(&self) -> &Arc<MinerContext> {
        &self.context
    }

    /// Append a history; it picks up the context's validation setting.
    pub fn add(&mut self, mut history: History) {
        history.set_validation(self.context.validate_mutations());
        self.histories.push(history);
    }

    /// Append clones of every history in `other`.
    pub fn union(&mut self, other: &Collection) {
        for history in &other.histories {
            self.add(history.clone());
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<History> {
        if index < self.histories.len() {
            Some(self.histories.remove(index))
        } else {
            None
        }
    }

    pub fn retain(&mut self, keep: impl FnMut(&History) -> bool) {
        self.histories.retain(keep);
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn get(&self, index: usize) -> Option<&History> {
        self.histories.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &History> {
        self.histories.iter()
    }

    pub fn histories(&self) -> &[History] {
        &self.histories
    }

    pub fn into_histories(self) -> Vec<History> {
        self.histories
    }

    /// A new collection holding clones of the histories that pass `keep`.
    pub fn filter(&self, mut keep: impl FnMut(&History) -> bool) -> Collection {
        let mut out = self.empty_like();
        for history in &self.histories {
            if keep(history) {
                out.add(history.clone());
            }
        }
        out
    }

    /// Total unknown transitions across all histories.
    pub fn unknown_edge_count(&self) -> usize {
        self.histories.iter().map(History::unknown_edge_count).sum()
    }

    /// Write the collection as JSON.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let file = CollectionFile {
            format_version: FORMAT_VERSION,
            histories: self.histories.clone(),
        };
        let json = serde_json::to_string(&file).map_err(|e| StorageError::Serialization {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a collection written by `save`. Every history is validated.
    pub fn load(path: &Path, context: Arc<MinerContext>) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CollectionFile = serde_json::from_str(&json).map_err(|e| StorageError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if file.format_version != FORMAT_VERSION {
            return Err(StorageError::Malformed {
                path: path.to_path_buf(),
                message: format!("unsupported format version {}", file.format_version),
            });
        }
        for (i, history) in file.histories.iter().enumerate() {
            history.validate().map_err(|e| StorageError::Malformed {
                path: path.to_path_buf(),
                message: format!("history {i}: {e}"),
            })?;
        }
        tracing::debug!(path = %path.display(), histories = file.histories.len(), "loaded collection");
        Ok(Self::with_histories(context, file.histories))
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new(Arc::new(MinerContext::default()))
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a History;
    type IntoIter = std::slice::Iter<'a, History>;

    fn into_iter(self) -> Self::IntoIter {
        self.histories.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::test_support::*;

    #[test]
    fn test_add_remove_retain() {
        let mut c = Collection::default();
        c.add(linear(&[("a", 1)]));
        c.add(linear(&[("a", 1), ("?", 1)]));
        c.add(linear(&[("b", 1)]));
        assert_eq!(c.len(), 3);
        assert_eq!(c.unknown_edge_count(), 1);
        assert!(c.remove(5).is_none());
        assert!(c.remove(2).is_some());
        c.retain(|h| h.unknown_edge_count() == 0);
        assert_eq!(c.len(), 1);
        c.clear();
        assert!(c.is_empty());
    }

    #[test]
    fn test_filter_keeps_context() {
        let mut c = Collection::default();
        c.add(linear(&[("a", 1)]));
        c.add(linear(&[("a", 1), ("b", 1)]));
        let deep = c.filter(|h| h.depth() > 1);
        assert_eq!(deep.len(), 1);
        assert!(Arc::ptr_eq(deep.context(), c.context()));
    }

    #[test]
    fn test_union_appends() {
        let mut a = Collection::default();
        a.add(linear(&[("a", 1)]));
        let mut b = a.empty_like();
        b.add(linear(&[("b", 1)]));
        a.union(&b);
        assert_eq!(a.len(), 2);
    }
}
