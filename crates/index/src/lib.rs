//! Ingestion pipeline: scan, chunk, extract, embed, commit.
//!
//! The [`Indexer`] drives the phases over a worker pool, reporting progress
//! through an mpsc channel and committing one transaction per file so a
//! crash or cancellation never leaves a file half-indexed.

mod chunker;
mod extract;
mod indexer;
mod progress;
mod scanner;

pub use chunker::Chunker;
pub use extract::{Extraction, extract_file};
pub use indexer::{IndexError, IndexOptions, Indexer};
pub use progress::{IndexPhase, IndexProgress};
pub use scanner::{ScannedFile, SourceFile, scan};
