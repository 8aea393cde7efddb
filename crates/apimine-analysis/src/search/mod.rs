//! Searching a corpus of mined patterns.
//!
//! A query is a history, usually linear and usually holding unknown steps.
//! [`search`] ranks the histories of a collection that include the query
//! (unknown steps may stand for any stretch of calls), [`complete`] fills a
//! query's gaps from the corpus, and [`extract_top_sequences`] lists the
//! heaviest call sequences a pattern allows.

pub mod query;
pub mod rank;
pub mod sequences;

pub use query::QueryBuilder;
pub use rank::{batch_search, complete, search, DepthBucket, SearchHit};
pub use sequences::{extract_top_sequences, MethodSequence};
