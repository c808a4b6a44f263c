//! The retrieval and analysis engine.
//!
//! Ties the store, the embedding provider and the indexer together behind a
//! typed request/response surface: hybrid search, caller/callee lookups,
//! dead-code candidates, entry points, complexity and file summaries.

pub mod api;
mod complexity;
mod graph;
mod search;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use db::Store;
use embedding::{EmbeddingProvider, ProviderRegistry, Reranker};
use index::{IndexError, IndexOptions, IndexProgress, Indexer};
use scout_core::{EngineConfig, EngineError, ErrorKind, IndexStats};
use tokio::sync::mpsc;

pub use crate::{
  complexity::{ComplexityReport, FileSummary, FunctionComplexity},
  graph::{CallEdge, DeadCodeReport},
  search::{SearchMode, SearchRequest, SearchResponse, SearchResult},
};

pub struct Engine {
  store: Arc<Store>,
  provider: Arc<dyn EmbeddingProvider>,
  reranker: Option<Arc<dyn Reranker>>,
  config: Arc<EngineConfig>,
  root: PathBuf,
}

impl Engine {
  /// Open (or create) the index at `store_path` and wire up providers from
  /// the registry.
  pub fn open(root: &Path, store_path: &Path, config: EngineConfig, registry: &ProviderRegistry) -> Result<Self, EngineError> {
    let store = Store::open(store_path).map_err(store_error)?;
    let provider = registry
      .create_provider(&config.embedding)
      .map_err(|e| EngineError::new(ErrorKind::InvalidConfig, e.to_string()))?;
    let reranker = registry
      .create_reranker(&config.embedding)
      .map_err(|e| EngineError::new(ErrorKind::InvalidConfig, e.to_string()))?;

    Ok(Self {
      store: Arc::new(store),
      provider,
      reranker,
      config: Arc::new(config),
      root: root.to_path_buf(),
    })
  }

  /// Wire an engine from already-constructed parts (used by tests and
  /// embedders that manage their own providers).
  pub fn new(
    root: &Path,
    store: Arc<Store>,
    provider: Arc<dyn EmbeddingProvider>,
    reranker: Option<Arc<dyn Reranker>>,
    config: EngineConfig,
  ) -> Self {
    Self {
      store,
      provider,
      reranker,
      config: Arc::new(config),
      root: root.to_path_buf(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub(crate) fn store(&self) -> &Store {
    &self.store
  }

  pub(crate) fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub(crate) fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
    &self.provider
  }

  pub(crate) fn reranker(&self) -> Option<&Arc<dyn Reranker>> {
    self.reranker.as_ref()
  }

  /// Run an indexing pass over the engine's root.
  pub async fn index(
    &self,
    options: &IndexOptions,
    progress: Option<mpsc::Sender<IndexProgress>>,
  ) -> Result<IndexStats, EngineError> {
    let indexer = Indexer::new(Arc::clone(&self.store), Arc::clone(&self.provider), Arc::clone(&self.config));
    indexer.index(&self.root, options, progress).await.map_err(index_error)
  }

  pub fn stats(&self) -> Result<db::StoreStats, EngineError> {
    self.store.get_stats().map_err(store_error)
  }

  pub fn metadata(&self) -> Result<Option<scout_core::IndexMetadata>, EngineError> {
    self.store.get_metadata().map_err(store_error)
  }
}

pub(crate) fn store_error(e: db::DbError) -> EngineError {
  let kind = match &e {
    db::DbError::NotFound(_) => ErrorKind::NotFound,
    db::DbError::SchemaIncompatible { .. } => ErrorKind::SchemaIncompatible,
    db::DbError::InvalidInput(_) => ErrorKind::InvalidRequest,
    _ => ErrorKind::StoreFailed,
  };
  EngineError::new(kind, e.to_string())
}

pub(crate) fn index_error(e: IndexError) -> EngineError {
  let kind = match &e {
    IndexError::Cancelled => ErrorKind::Cancelled,
    IndexError::ProviderNotAvailable(_) => ErrorKind::ProviderNotAvailable,
    IndexError::Embedding(embedding::EmbeddingError::Timeout) => ErrorKind::Timeout,
    IndexError::Embedding(_) => ErrorKind::EmbeddingFailed,
    IndexError::Db(db::DbError::SchemaIncompatible { .. }) => ErrorKind::SchemaIncompatible,
    IndexError::Db(_) => ErrorKind::StoreFailed,
    _ => ErrorKind::StoreFailed,
  };
  EngineError::new(kind, e.to_string())
}
