//! Hybrid retrieval: dense-vector and BM25 legs fused by min-max
//! normalization, an optional rerank stage, and context attachment.

use std::collections::HashMap;

use db::{ScoredChunk, SearchFilters};
use scout_core::{Chunk, EngineError, ErrorKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
  Vector,
  Bm25,
  #[default]
  Hybrid,
}

/// A search request. Weights and candidate counts default from the engine
/// configuration when unset.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchRequest {
  pub query: String,
  /// Pre-computed query vector; when absent the engine embeds `query`.
  pub query_vector: Option<Vec<f32>>,
  pub limit: Option<usize>,
  pub languages: Vec<String>,
  pub chunk_types: Vec<String>,
  pub file_paths: Vec<String>,
  pub mode: SearchMode,
  pub vector_weight: Option<f32>,
  pub bm25_weight: Option<f32>,
  pub use_reranker: bool,
  pub rerank_candidates: Option<usize>,
  pub include_context: bool,
  pub context_lines: Option<u32>,
}

/// One search hit. `score` is final (post-fusion, post-rerank); the
/// component scores are raw leg outputs. Context fields are present only
/// when requested and the on-disk file still matches the indexed content.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
  pub chunk: Chunk,
  pub score: f32,
  pub vector_score: Option<f32>,
  pub bm25_score: Option<f32>,
  pub rerank_score: Option<f32>,
  pub context_before: Option<String>,
  pub context_after: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
  pub results: Vec<SearchResult>,
  /// Set when one retrieval leg failed and the search degraded to the
  /// other.
  pub warning: Option<String>,
}

struct Candidate {
  chunk: Chunk,
  vector_score: Option<f32>,
  bm25_score: Option<f32>,
  fused: f32,
  rerank_score: Option<f32>,
}

impl Engine {
  /// Execute a search request with a fresh cancellation token.
  pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, EngineError> {
    self.search_cancellable(request, &CancellationToken::new()).await
  }

  /// Execute a search request. Results arrive fully sorted; callers sort
  /// nothing further. Cancelling the token aborts in-flight provider calls.
  pub async fn search_cancellable(
    &self,
    request: &SearchRequest,
    cancel: &CancellationToken,
  ) -> Result<SearchResponse, EngineError> {
    if request.query.trim().is_empty() && request.query_vector.is_none() {
      return Err(EngineError::invalid_request("query"));
    }

    let limit = request.limit.unwrap_or(10).max(1);
    let pool_size = request
      .rerank_candidates
      .unwrap_or(self.config().search.rerank_candidates)
      .max(limit);
    let filters = SearchFilters {
      languages: request.languages.clone(),
      chunk_kinds: request.chunk_types.clone(),
      file_paths: request.file_paths.clone(),
    };

    let (candidates, warning) = self.gather_candidates(request, pool_size, &filters, cancel).await?;
    let mut candidates = fuse(candidates, request, self.config());

    // Optional rerank over the fused top candidates.
    if request.use_reranker
      && let Some(reranker) = self.reranker()
    {
      let top = pool_size.min(candidates.len()).min(reranker.max_documents());
      let docs: Vec<String> = candidates[..top].iter().map(|c| c.chunk.content.clone()).collect();
      match reranker.rerank(cancel, &request.query, &docs).await {
        Ok(scores) => {
          for entry in scores {
            if let Some(candidate) = candidates.get_mut(entry.index) {
              candidate.rerank_score = Some(entry.score);
              candidate.fused = entry.score;
            }
          }
        }
        Err(e) => {
          warn!(error = %e, "Reranker failed, keeping fused order");
        }
      }
    }

    sort_candidates(&mut candidates);
    candidates.truncate(limit);

    let context_lines = request.context_lines.unwrap_or(self.config().search.context_lines);
    let results = candidates
      .into_iter()
      .map(|c| {
        let (context_before, context_after) = if request.include_context {
          self.attach_context(&c.chunk, context_lines)
        } else {
          (None, None)
        };
        SearchResult {
          score: c.fused,
          vector_score: c.vector_score,
          bm25_score: c.bm25_score,
          rerank_score: c.rerank_score,
          context_before,
          context_after,
          chunk: c.chunk,
        }
      })
      .collect();

    Ok(SearchResponse { results, warning })
  }

  /// Run the retrieval legs the mode asks for, degrading to the surviving
  /// leg (with a warning) when only one fails.
  async fn gather_candidates(
    &self,
    request: &SearchRequest,
    pool_size: usize,
    filters: &SearchFilters,
    cancel: &CancellationToken,
  ) -> Result<(Vec<Candidate>, Option<String>), EngineError> {
    let mut warning = None;

    let vector_hits: Option<Vec<ScoredChunk>> = match request.mode {
      SearchMode::Bm25 => None,
      SearchMode::Vector | SearchMode::Hybrid => match self.query_vector(request, cancel).await {
        Ok(vector) => match self.store().vector_search(&vector, pool_size, filters) {
          Ok(hits) => Some(hits),
          Err(e) if request.mode == SearchMode::Hybrid => {
            warn!(error = %e, "Vector leg failed, degrading to BM25");
            warning = Some(format!("vector search failed: {e}"));
            None
          }
          Err(e) => return Err(EngineError::new(ErrorKind::SearchFailed, e.to_string())),
        },
        Err(e) if request.mode == SearchMode::Hybrid => {
          warn!(error = %e, "Query embedding failed, degrading to BM25");
          warning = Some(format!("query embedding failed: {e}"));
          None
        }
        Err(e) => return Err(e),
      },
    };

    let bm25_hits: Option<Vec<ScoredChunk>> = match request.mode {
      SearchMode::Vector => None,
      SearchMode::Bm25 | SearchMode::Hybrid => match self.store().bm25_search(&request.query, pool_size, filters) {
        Ok(hits) => Some(hits),
        Err(e) if request.mode == SearchMode::Hybrid && vector_hits.is_some() => {
          warn!(error = %e, "BM25 leg failed, degrading to vector-only");
          warning = Some(format!("keyword search failed: {e}"));
          None
        }
        Err(e) => return Err(EngineError::new(ErrorKind::SearchFailed, e.to_string())),
      },
    };

    if vector_hits.is_none() && bm25_hits.is_none() {
      return Err(EngineError::new(ErrorKind::SearchFailed, "both retrieval legs failed"));
    }

    // Union the pools; a chunk found by only one leg keeps the other
    // component absent (contributing zero after normalization).
    let mut by_id: HashMap<String, Candidate> = HashMap::new();
    for hit in vector_hits.into_iter().flatten() {
      by_id.insert(
        hit.chunk.id.clone(),
        Candidate {
          chunk: hit.chunk,
          vector_score: Some(hit.score),
          bm25_score: None,
          fused: 0.0,
          rerank_score: None,
        },
      );
    }
    for hit in bm25_hits.into_iter().flatten() {
      match by_id.get_mut(&hit.chunk.id) {
        Some(candidate) => candidate.bm25_score = Some(hit.score),
        None => {
          by_id.insert(
            hit.chunk.id.clone(),
            Candidate {
              chunk: hit.chunk,
              vector_score: None,
              bm25_score: Some(hit.score),
              fused: 0.0,
              rerank_score: None,
            },
          );
        }
      }
    }

    debug!(candidates = by_id.len(), "Candidate pool assembled");
    Ok((by_id.into_values().collect(), warning))
  }

  async fn query_vector(&self, request: &SearchRequest, cancel: &CancellationToken) -> Result<Vec<f32>, EngineError> {
    if let Some(vector) = &request.query_vector {
      return Ok(vector.clone());
    }
    let mut vectors = self
      .provider()
      .embed(cancel, std::slice::from_ref(&request.query))
      .await
      .map_err(|e| match e {
        embedding::EmbeddingError::Cancelled => EngineError::new(ErrorKind::Cancelled, "search cancelled"),
        embedding::EmbeddingError::Timeout => EngineError::new(ErrorKind::Timeout, e.to_string()),
        other => EngineError::new(ErrorKind::EmbeddingFailed, other.to_string()),
      })?;
    vectors
      .pop()
      .ok_or_else(|| EngineError::new(ErrorKind::EmbeddingFailed, "provider returned no query vector"))
  }

  /// Context lines around a chunk from the on-disk file, omitted when the
  /// file changed since indexing (never misaligned text).
  fn attach_context(&self, chunk: &Chunk, context_lines: u32) -> (Option<String>, Option<String>) {
    let Ok(bytes) = std::fs::read(self.root().join(&chunk.file_path)) else {
      return (None, None);
    };

    let indexed_hash = match self.store().get_file_hash(&chunk.file_path) {
      Ok(Some((content_hash, _))) => content_hash,
      _ => return (None, None),
    };
    if scout_core::content_hash(&bytes) != indexed_hash {
      return (None, None);
    }

    let Ok(content) = String::from_utf8(bytes) else {
      return (None, None);
    };
    let lines: Vec<&str> = content.lines().collect();

    let before_start = chunk.start_line.saturating_sub(context_lines + 1) as usize;
    let before_end = (chunk.start_line - 1) as usize;
    let before = if before_start < before_end {
      Some(lines[before_start..before_end].join("\n"))
    } else {
      None
    };

    let after_start = chunk.end_line as usize;
    let after_end = (chunk.end_line + context_lines).min(lines.len() as u32) as usize;
    let after = if after_start < after_end {
      Some(lines[after_start..after_end].join("\n"))
    } else {
      None
    };

    (before, after)
  }
}

/// Fuse the candidate pool: min-max normalize each component over the
/// union, then weight. Components a chunk is missing contribute zero.
fn fuse(mut candidates: Vec<Candidate>, request: &SearchRequest, config: &scout_core::EngineConfig) -> Vec<Candidate> {
  match request.mode {
    SearchMode::Vector => {
      for c in &mut candidates {
        c.fused = c.vector_score.unwrap_or(0.0);
      }
    }
    SearchMode::Bm25 => {
      for c in &mut candidates {
        c.fused = c.bm25_score.unwrap_or(0.0);
      }
    }
    SearchMode::Hybrid => {
      let vector_weight = request.vector_weight.unwrap_or(config.search.vector_weight);
      let bm25_weight = request.bm25_weight.unwrap_or(config.search.bm25_weight);
      let vector_range = min_max(candidates.iter().filter_map(|c| c.vector_score));
      let bm25_range = min_max(candidates.iter().filter_map(|c| c.bm25_score));

      for c in &mut candidates {
        let nv = c.vector_score.map(|s| normalize(s, vector_range)).unwrap_or(0.0);
        let nb = c.bm25_score.map(|s| normalize(s, bm25_range)).unwrap_or(0.0);
        c.fused = vector_weight * nv + bm25_weight * nb;
      }
    }
  }

  sort_candidates(&mut candidates);
  candidates
}

fn min_max(scores: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
  let mut range: Option<(f32, f32)> = None;
  for score in scores {
    range = Some(match range {
      None => (score, score),
      Some((min, max)) => (min.min(score), max.max(score)),
    });
  }
  range
}

fn normalize(score: f32, range: Option<(f32, f32)>) -> f32 {
  match range {
    Some((min, max)) if max > min => (score - min) / (max - min),
    // A degenerate pool (all equal) normalizes present scores to 1.
    Some(_) => 1.0,
    None => 0.0,
  }
}

/// Final ordering: score desc, then higher vector score, then path, then
/// start line.
fn sort_candidates(candidates: &mut [Candidate]) {
  candidates.sort_by(|a, b| {
    b.fused
      .partial_cmp(&a.fused)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| {
        b.vector_score
          .unwrap_or(0.0)
          .partial_cmp(&a.vector_score.unwrap_or(0.0))
          .unwrap_or(std::cmp::Ordering::Equal)
      })
      .then_with(|| a.chunk.file_path.cmp(&b.chunk.file_path))
      .then_with(|| a.chunk.start_line.cmp(&b.chunk.start_line))
  });
}

#[cfg(test)]
mod tests {
  use scout_core::{ChunkKind, Language};

  use super::*;

  fn candidate(id: &str, vector: Option<f32>, bm25: Option<f32>) -> Candidate {
    Candidate {
      chunk: Chunk::new(
        id,
        Language::Go,
        ChunkKind::Function,
        None,
        None,
        1,
        1,
        format!("func {id}() {{}}"),
      ),
      vector_score: vector,
      bm25_score: bm25,
      fused: 0.0,
      rerank_score: None,
    }
  }

  fn hybrid_request() -> SearchRequest {
    SearchRequest {
      query: "q".to_string(),
      mode: SearchMode::Hybrid,
      ..Default::default()
    }
  }

  #[test]
  fn test_fuse_min_max_weights() {
    let candidates = vec![
      candidate("a", Some(0.9), Some(5.0)),
      candidate("b", Some(0.5), Some(1.0)),
      candidate("c", Some(0.1), None),
    ];
    let config = scout_core::EngineConfig::default();
    let fused = fuse(candidates, &hybrid_request(), &config);

    // a: nv=1.0, nb=1.0 -> 0.7 + 0.3 = 1.0
    let a = fused.iter().find(|c| c.chunk.file_path == "a").unwrap();
    assert!((a.fused - 1.0).abs() < 1e-6, "a fused {}", a.fused);

    // b: nv=0.5, nb=0.0 -> 0.35
    let b = fused.iter().find(|c| c.chunk.file_path == "b").unwrap();
    assert!((b.fused - 0.35).abs() < 1e-6, "b fused {}", b.fused);

    // c: nv=0.0, missing bm25 contributes zero
    let c = fused.iter().find(|c| c.chunk.file_path == "c").unwrap();
    assert!(c.fused.abs() < 1e-6, "c fused {}", c.fused);

    // sorted descending
    assert!(fused[0].fused >= fused[1].fused && fused[1].fused >= fused[2].fused);
  }

  #[test]
  fn test_fuse_vector_mode_uses_raw_score() {
    let candidates = vec![candidate("a", Some(0.42), None)];
    let request = SearchRequest {
      query: "q".to_string(),
      mode: SearchMode::Vector,
      ..Default::default()
    };
    let fused = fuse(candidates, &request, &scout_core::EngineConfig::default());
    assert!((fused[0].fused - 0.42).abs() < 1e-6);
  }

  #[test]
  fn test_normalize_degenerate_pool() {
    assert_eq!(normalize(3.0, Some((3.0, 3.0))), 1.0);
    assert_eq!(normalize(3.0, None), 0.0);
  }

  #[test]
  fn test_sort_tie_breaks_by_vector_then_path() {
    let mut candidates = vec![candidate("b.go", Some(0.2), None), candidate("a.go", Some(0.2), None)];
    candidates[0].fused = 0.5;
    candidates[1].fused = 0.5;
    sort_candidates(&mut candidates);
    assert_eq!(candidates[0].chunk.file_path, "a.go");
  }

  #[test]
  fn test_custom_weights_respected() {
    let candidates = vec![candidate("a", Some(1.0), Some(0.0)), candidate("b", Some(0.0), Some(10.0))];
    let request = SearchRequest {
      query: "q".to_string(),
      mode: SearchMode::Hybrid,
      vector_weight: Some(0.0),
      bm25_weight: Some(1.0),
      ..Default::default()
    };
    let fused = fuse(candidates, &request, &scout_core::EngineConfig::default());
    assert_eq!(fused[0].chunk.file_path, "b", "bm25-only weights put b first");
  }
}
