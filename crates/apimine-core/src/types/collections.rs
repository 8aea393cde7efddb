//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;
pub use std::collections::{BTreeMap, BTreeSet};

/// SmallVec sized for edge label sets (usually one label).
pub type SmallVec2<T> = SmallVec<[T; 2]>;

/// SmallVec sized for per-node adjacency (usually <8).
pub type SmallVec8<T> = SmallVec<[T; 8]>;
