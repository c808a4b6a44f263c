//! Deterministic in-process providers for tests.
//!
//! The mock embedder hashes each token of the input into a fixed-width
//! bag-of-words vector, so texts sharing vocabulary have positive cosine
//! similarity and repeated runs produce identical vectors. No network, no
//! model weights.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{EmbeddingError, EmbeddingProvider, RerankResult, Reranker, Result};

fn tokens(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_alphanumeric() && c != '_')
    .filter(|t| !t.is_empty())
    .map(|t| t.to_lowercase())
    .collect()
}

fn bucket(token: &str, dimensions: usize) -> usize {
  use std::hash::{Hash, Hasher};
  let mut hasher = std::collections::hash_map::DefaultHasher::new();
  token.hash(&mut hasher);
  (hasher.finish() as usize) % dimensions
}

/// Deterministic token-hash embedder.
pub struct MockProvider {
  dimensions: usize,
  batch_size: usize,
  /// Count of embed calls, for cache-hit assertions in tests.
  calls: AtomicUsize,
}

impl MockProvider {
  pub fn new(dimensions: usize) -> Self {
    Self {
      dimensions,
      batch_size: 16,
      calls: AtomicUsize::new(0),
    }
  }

  pub fn embed_calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn embed_one(&self, text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; self.dimensions];
    for token in tokens(text) {
      vector[bucket(&token, self.dimensions)] += 1.0;
    }
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
      for v in &mut vector {
        *v /= norm;
      }
    }
    vector
  }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
  fn name(&self) -> &str {
    "mock"
  }

  fn dimensions(&self) -> usize {
    self.dimensions
  }

  fn max_batch_size(&self) -> usize {
    self.batch_size
  }

  async fn embed(&self, cancel: &CancellationToken, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if cancel.is_cancelled() {
      return Err(EmbeddingError::Cancelled);
    }
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(texts.iter().map(|t| self.embed_one(t)).collect())
  }

  async fn warmup(&self, _cancel: &CancellationToken) -> Result<()> {
    Ok(())
  }

  async fn available(&self, _cancel: &CancellationToken) -> bool {
    true
  }

  async fn close(&self) {}
}

/// Reranker scoring by token overlap with the query.
pub struct MockReranker {
  max_documents: usize,
}

impl MockReranker {
  pub fn new() -> Self {
    Self { max_documents: 64 }
  }
}

impl Default for MockReranker {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Reranker for MockReranker {
  fn name(&self) -> &str {
    "mock-reranker"
  }

  fn max_documents(&self) -> usize {
    self.max_documents
  }

  async fn rerank(&self, cancel: &CancellationToken, query: &str, docs: &[String]) -> Result<Vec<RerankResult>> {
    if cancel.is_cancelled() {
      return Err(EmbeddingError::Cancelled);
    }
    let query_tokens = tokens(query);
    Ok(
      docs
        .iter()
        .enumerate()
        .map(|(index, doc)| {
          let doc_tokens = tokens(doc);
          let overlap = query_tokens.iter().filter(|t| doc_tokens.contains(t)).count();
          RerankResult {
            index,
            score: overlap as f32 / query_tokens.len().max(1) as f32,
          }
        })
        .collect(),
    )
  }

  async fn warmup(&self, _cancel: &CancellationToken) -> Result<()> {
    Ok(())
  }

  async fn close(&self) {}
}
