use serde::{Deserialize, Serialize};

use crate::hash::short_hash16;

/// Rough character-per-token estimate used for size caps and truncation.
pub const CHARS_PER_TOKEN: usize = 4;

/// Engine configuration.
///
/// Loadable from TOML; every section has usable defaults so an empty config
/// file works. Only the fields covered by [`EngineConfig::config_hash`]
/// invalidate the file cache when changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub embedding: EmbeddingSettings,
  pub chunking: ChunkingConfig,
  pub indexing: IndexingConfig,
  pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
  /// Registry name of the provider, e.g. "ollama" or "mock".
  pub provider: String,
  pub model: String,
  pub base_url: String,
  /// Hint only; the actual dimension is frozen from the first embedding.
  pub dimensions: usize,
  /// Model context window in tokens; texts are truncated to
  /// `context_length * CHARS_PER_TOKEN` characters before submission.
  pub context_length: usize,
  /// Override for the provider-computed batch size.
  pub max_batch_size: Option<usize>,
  pub request_timeout_secs: u64,
  pub availability_timeout_secs: u64,
  /// Optional reranker registry name.
  pub reranker: Option<String>,
}

impl Default for EmbeddingSettings {
  fn default() -> Self {
    Self {
      provider: "ollama".to_string(),
      model: "nomic-embed-text".to_string(),
      base_url: "http://localhost:11434".to_string(),
      dimensions: 768,
      context_length: 8192,
      max_batch_size: None,
      request_timeout_secs: 60,
      availability_timeout_secs: 5,
      reranker: None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
  /// "ast" (with line-based fallback) or "lines".
  pub strategy: String,
  pub max_chunk_tokens: usize,
  pub min_chunk_chars: usize,
}

impl ChunkingConfig {
  pub fn max_chunk_chars(&self) -> usize {
    self.max_chunk_tokens * CHARS_PER_TOKEN
  }
}

impl Default for ChunkingConfig {
  fn default() -> Self {
    Self {
      strategy: "ast".to_string(),
      max_chunk_tokens: 512,
      min_chunk_chars: 100,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
  /// Worker pool size; defaults to the CPU count when None.
  pub workers: Option<usize>,
  /// Extra glob patterns to ignore, in addition to the built-in list.
  pub ignore_globs: Vec<String>,
  pub use_gitignore: bool,
  /// Files larger than this are skipped.
  pub max_file_bytes: u64,
}

impl Default for IndexingConfig {
  fn default() -> Self {
    Self {
      workers: None,
      ignore_globs: Vec::new(),
      use_gitignore: true,
      max_file_bytes: 2 * 1024 * 1024,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub vector_weight: f32,
  pub bm25_weight: f32,
  pub rerank_candidates: usize,
  pub context_lines: u32,
  /// Substrings that mark a symbol as an externally invoked handler for
  /// dead-code root detection.
  pub entry_point_patterns: Vec<String>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      vector_weight: 0.7,
      bm25_weight: 0.3,
      rerank_candidates: 100,
      context_lines: 3,
      entry_point_patterns: vec!["Handler".to_string(), "handle_".to_string()],
    }
  }
}

impl EngineConfig {
  pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(text)
  }

  /// Digest of the configuration fields that affect chunk or vector content.
  ///
  /// A change to any of these invalidates every file-cache entry and forces
  /// a full reindex.
  pub fn config_hash(&self) -> String {
    let payload = format!(
      "{}|{}|{}|{}|{}",
      self.embedding.provider,
      self.embedding.model,
      self.chunking.strategy,
      self.chunking.max_chunk_tokens,
      self.chunking.min_chunk_chars,
    );
    short_hash16(payload.as_bytes())
  }
}
