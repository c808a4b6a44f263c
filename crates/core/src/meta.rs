use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current storage schema version. Bump on incompatible schema changes.
pub const SCHEMA_VERSION: i32 = 1;

/// Aggregate counts, refreshed on every successful indexing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
  pub files: u64,
  pub chunks: u64,
  pub symbols: u64,
  pub references: u64,
}

/// The single metadata row of an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
  pub schema_version: i32,
  pub created_at: DateTime<Utc>,
  pub last_updated: DateTime<Utc>,
  pub embedding_provider: String,
  pub embedding_model: String,
  /// Vector width, frozen from the first embedding produced. Zero until then.
  pub dimensions: usize,
  pub chunking_strategy: String,
  pub reranker: Option<String>,
  pub config_hash: String,
  pub stats: IndexStats,
}

impl IndexMetadata {
  pub fn new(provider: &str, model: &str, chunking_strategy: &str, config_hash: &str) -> Self {
    let now = Utc::now();
    Self {
      schema_version: SCHEMA_VERSION,
      created_at: now,
      last_updated: now,
      embedding_provider: provider.to_string(),
      embedding_model: model.to_string(),
      dimensions: 0,
      chunking_strategy: chunking_strategy.to_string(),
      reranker: None,
      config_hash: config_hash.to_string(),
      stats: IndexStats::default(),
    }
  }
}
