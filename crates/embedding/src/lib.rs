//! Embedding and reranking provider boundary.
//!
//! The engine treats providers as black boxes behind these traits. Concrete
//! implementations are registered by name in the write-once
//! [`ProviderRegistry`]; the bundled [`HttpProvider`] speaks the Ollama-style
//! `/api/embed` protocol and [`mock`] provides a deterministic in-process
//! provider for tests.

mod http;
pub mod mock;
mod registry;
mod resilient;
pub mod validation;

use async_trait::async_trait;
pub use http::HttpProvider;
pub use registry::ProviderRegistry;
pub use resilient::{ResilientProvider, RetryConfig};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Provider error: {0}")]
  Provider(String),
  #[error("Provider not available: {0}")]
  Unavailable(String),
  #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
  DimensionMismatch { expected: usize, got: usize },
  #[error("Unknown provider: {0}")]
  UnknownProvider(String),
  #[error("Request timed out")]
  Timeout,
  #[error("Cancelled")]
  Cancelled,
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// A single reranked document: its position in the submitted list plus the
/// model's relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankResult {
  pub index: usize,
  pub score: f32,
}

/// The narrow boundary the engine depends on for embeddings.
///
/// Implementations must be thread-safe; callers must not rely on request
/// order outside a single `embed` call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  fn name(&self) -> &str;

  /// Vector width. May be a configured hint until the first embedding has
  /// been produced; the engine freezes the observed width into metadata.
  fn dimensions(&self) -> usize;

  fn max_batch_size(&self) -> usize;

  /// Embed a batch of texts, preserving order. Implementations batch
  /// internally up to `max_batch_size` and convert to f32. A vector-width
  /// disagreement within the batch is a provider error and rejects the
  /// whole batch.
  async fn embed(&self, cancel: &CancellationToken, texts: &[String]) -> Result<Vec<Vec<f32>>>;

  /// Optional model pre-load. Failures are non-fatal for indexing.
  async fn warmup(&self, cancel: &CancellationToken) -> Result<()>;

  /// Quick availability probe, bounded by the configured short timeout.
  async fn available(&self, cancel: &CancellationToken) -> bool;

  /// Release any held resources. Idempotent.
  async fn close(&self);
}

impl std::fmt::Debug for dyn EmbeddingProvider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EmbeddingProvider").field("name", &self.name()).finish()
  }
}

/// The boundary for optional second-stage reranking.
#[async_trait]
pub trait Reranker: Send + Sync {
  fn name(&self) -> &str;

  fn max_documents(&self) -> usize;

  /// Score `(query, doc)` pairs. Returns one entry per submitted document.
  async fn rerank(&self, cancel: &CancellationToken, query: &str, docs: &[String]) -> Result<Vec<RerankResult>>;

  async fn warmup(&self, cancel: &CancellationToken) -> Result<()>;

  async fn close(&self);
}
