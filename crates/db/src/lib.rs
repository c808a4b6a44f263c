//! Single-file SQLite storage for the index.
//!
//! One database file holds chunks, their vectors and full-text rows, symbols,
//! references, the file cache and index metadata. Every public write is a
//! single transaction; the per-file replacement used by the indexer is one
//! transaction end to end, so a crash mid-pass leaves the previous state of
//! each file intact.

mod chunks;
mod file_cache;
mod meta;
mod refs;
mod schema;
mod store;
mod symbols;
mod vectors;

pub use chunks::{FtsHealth, ScoredChunk, SearchFilters};
pub use meta::StoreStats;
pub use store::{DbError, Result, Store};
pub use symbols::{SymbolQuery, SymbolSort};
pub use vectors::{bytes_to_vector, cosine_similarity, vector_to_bytes};
