//! Indexing orchestrator.
//!
//! Drives discovery -> hash filter -> chunk+extract -> embed -> commit ->
//! cleanup -> finalize. Per-file CPU work runs across a worker pool; store
//! writes are serialized; every file commits in its own transaction so
//! cancellation or a crash never leaves a file half-indexed.

use std::{
  collections::{HashMap, HashSet},
  path::Path,
  sync::Arc,
};

use db::Store;
use embedding::EmbeddingProvider;
use futures::StreamExt;
use parser::SourceParser;
use scout_core::{Chunk, EngineConfig, IndexMetadata, IndexStats, Reference, Symbol};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  chunker::Chunker,
  extract::extract_file,
  progress::{IndexPhase, IndexProgress},
  scanner::{ScannedFile, SourceFile, scan},
};

#[derive(Error, Debug)]
pub enum IndexError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Db(#[from] db::DbError),
  #[error(transparent)]
  Embedding(#[from] embedding::EmbeddingError),
  #[error("Embedding provider '{0}' is not available")]
  ProviderNotAvailable(String),
  #[error("Indexing cancelled")]
  Cancelled,
  #[error("Worker task failed: {0}")]
  Worker(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Options for one indexing pass.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
  /// Bypass the file-cache filter and re-ingest every discovered file.
  pub force: bool,
  pub cancel: CancellationToken,
}

/// One file's fully prepared ingest unit, waiting for vectors and commit.
struct PreparedFile {
  relative: String,
  content_hash: String,
  chunks: Vec<Chunk>,
  symbols: Vec<Symbol>,
  references: Vec<Reference>,
}

pub struct Indexer {
  store: Arc<Store>,
  provider: Arc<dyn EmbeddingProvider>,
  config: Arc<EngineConfig>,
}

impl Indexer {
  pub fn new(store: Arc<Store>, provider: Arc<dyn EmbeddingProvider>, config: Arc<EngineConfig>) -> Self {
    Self { store, provider, config }
  }

  /// Run one indexing pass over `root`.
  ///
  /// Progress records are delivered through `progress` (best effort; a slow
  /// or absent consumer never stalls the pass). Returns the refreshed index
  /// stats on success.
  pub async fn index(
    &self,
    root: &Path,
    options: &IndexOptions,
    progress: Option<mpsc::Sender<IndexProgress>>,
  ) -> Result<IndexStats> {
    let cancel = options.cancel.clone();
    let progress = ProgressSink(progress);

    // --- Scan ---
    progress.send(IndexProgress::phase(IndexPhase::Scan, 0));
    let scanned = {
      let root = root.to_path_buf();
      let config = self.config.indexing.clone();
      tokio::task::spawn_blocking(move || scan(&root, &config))
        .await
        .map_err(|e| IndexError::Worker(e.to_string()))??
    };
    self.check_cancel(&cancel)?;
    info!(files = scanned.len(), root = %root.display(), "Scan complete");

    if !self.provider.available(&cancel).await {
      return Err(IndexError::ProviderNotAvailable(self.provider.name().to_string()));
    }
    if let Err(e) = self.provider.warmup(&cancel).await {
      warn!(error = %e, "Provider warmup failed, continuing");
      progress.send(IndexProgress::phase(IndexPhase::Scan, scanned.len()).with_warning(format!("warmup failed: {e}")));
    }

    // --- Filter ---
    progress.send(IndexProgress::phase(IndexPhase::Filter, scanned.len()));
    let config_hash = self.config.config_hash();
    let mut meta = self.with_store(|store| store.get_metadata())?.unwrap_or_else(|| {
      IndexMetadata::new(
        self.provider.name(),
        &self.config.embedding.model,
        &self.config.chunking.strategy,
        &config_hash,
      )
    });
    // A config change invalidates every cache entry.
    let force = options.force || meta.config_hash != config_hash;

    let cached = self.with_store(|store| store.get_all_file_hashes())?;
    let disk_paths: HashSet<String> = scanned.iter().map(|f| f.relative.clone()).collect();

    let (changed, unchanged_count) = self.read_and_filter(&scanned, &cached, &config_hash, force, &progress).await?;
    self.check_cancel(&cancel)?;
    info!(changed = changed.len(), unchanged = unchanged_count, "Filter complete");

    // --- Chunk + extract ---
    progress.send(IndexProgress::phase(IndexPhase::Chunk, scanned.len()).with_files(unchanged_count));
    let (mut prepared, chunk_warnings) = self.chunk_and_extract(changed, &cancel, &progress).await?;
    self.check_cancel(&cancel)?;
    for warning in chunk_warnings {
      progress.send(IndexProgress::phase(IndexPhase::Chunk, scanned.len()).with_warning(warning));
    }

    // --- Resolve reference targets against the full symbol set ---
    self.resolve_references(&mut prepared)?;

    // --- Embed ---
    let total_chunks: usize = prepared.iter().map(|p| p.chunks.len()).sum();
    progress.send(IndexProgress::phase(IndexPhase::Embed, scanned.len()).with_chunks(0, total_chunks));
    let (vectors, embed_warnings) = self.embed_chunks(&prepared, &mut meta, &cancel, &progress, total_chunks).await?;
    self.check_cancel(&cancel)?;
    for warning in embed_warnings {
      progress.send(IndexProgress::phase(IndexPhase::Embed, scanned.len()).with_warning(warning));
    }

    // --- Commit ---
    progress.send(IndexProgress::phase(IndexPhase::Commit, scanned.len()).with_chunks(0, total_chunks));
    meta.config_hash = config_hash.clone();
    meta.embedding_provider = self.provider.name().to_string();
    meta.embedding_model = self.config.embedding.model.clone();
    meta.chunking_strategy = self.config.chunking.strategy.clone();
    meta.reranker = self.config.embedding.reranker.clone();
    {
      let meta = meta.clone();
      self.with_store(move |store| store.set_metadata(&meta))?;
    }

    let committed = self.commit_files(prepared, vectors, &config_hash, &cancel, &progress, scanned.len()).await?;

    // --- Cleanup ---
    progress.send(IndexProgress::phase(IndexPhase::Cleanup, scanned.len()));
    let mut removed = 0usize;
    for path in cached.keys() {
      if !disk_paths.contains(path) {
        let path = path.clone();
        self.with_store(move |store| store.delete_file(&path))?;
        removed += 1;
      }
    }
    if removed > 0 {
      debug!(removed, "Removed files no longer on disk");
    }

    // --- Finalize ---
    let store_stats = self.with_store(|store| store.get_stats())?;
    let stats = IndexStats {
      files: store_stats.files,
      chunks: store_stats.chunks,
      symbols: store_stats.symbols,
      references: store_stats.references,
    };
    meta.stats = stats;
    meta.last_updated = chrono::Utc::now();
    {
      let meta = meta.clone();
      self.with_store(move |store| store.set_metadata(&meta))?;
    }

    info!(
      files = stats.files,
      chunks = stats.chunks,
      committed,
      removed,
      "Indexing pass complete"
    );
    progress.send(
      IndexProgress::phase(IndexPhase::Done, scanned.len())
        .with_files(scanned.len())
        .with_chunks(total_chunks, total_chunks),
    );

    Ok(stats)
  }

  /// Read file contents and drop files whose cache entry still matches.
  async fn read_and_filter(
    &self,
    scanned: &[ScannedFile],
    cached: &HashMap<String, (String, String)>,
    config_hash: &str,
    force: bool,
    progress: &ProgressSink,
  ) -> Result<(Vec<SourceFile>, usize)> {
    let mut changed = Vec::new();
    let mut unchanged = 0usize;

    for (i, file) in scanned.iter().enumerate() {
      let bytes = match tokio::fs::read(&file.absolute).await {
        Ok(bytes) => bytes,
        Err(e) => {
          warn!(file = %file.relative, error = %e, "Failed to read file, skipping");
          continue;
        }
      };
      let content_hash = scout_core::content_hash(&bytes);

      if !force
        && let Some((cached_hash, cached_config)) = cached.get(&file.relative)
        && cached_hash == &content_hash
        && cached_config == config_hash
      {
        unchanged += 1;
        continue;
      }

      let Ok(content) = String::from_utf8(bytes) else {
        debug!(file = %file.relative, "Skipping non-UTF-8 file");
        continue;
      };

      let mut language = file.language;
      if language == scout_core::Language::Text
        && let Some(detected) = scout_core::Language::from_content(content.as_bytes())
      {
        language = detected;
      }

      changed.push(SourceFile {
        relative: file.relative.clone(),
        language,
        content,
        content_hash,
      });

      if i % 100 == 0 {
        progress.send(
          IndexProgress::phase(IndexPhase::Filter, scanned.len())
            .with_files(i + 1)
            .with_current_file(&file.relative),
        );
      }
    }

    Ok((changed, unchanged))
  }

  /// Chunk and extract changed files across the worker pool.
  async fn chunk_and_extract(
    &self,
    changed: Vec<SourceFile>,
    cancel: &CancellationToken,
    progress: &ProgressSink,
  ) -> Result<(Vec<PreparedFile>, Vec<String>)> {
    let workers = self.config.indexing.workers.unwrap_or_else(num_cpus::get).max(1);
    let total = changed.len();

    // Round-robin shards; each worker owns one parser and chunker.
    let mut shards: Vec<Vec<SourceFile>> = (0..workers).map(|_| Vec::new()).collect();
    for (i, file) in changed.into_iter().enumerate() {
      shards[i % workers].push(file);
    }

    let mut handles = Vec::new();
    for shard in shards {
      if shard.is_empty() {
        continue;
      }
      let cancel = cancel.clone();
      let chunking = self.config.chunking.clone();
      let progress = progress.clone();
      handles.push(tokio::task::spawn_blocking(move || {
        let mut chunker = Chunker::new(chunking);
        let mut parser = SourceParser::new();
        let mut prepared = Vec::new();
        let mut warnings = Vec::new();

        for (i, file) in shard.iter().enumerate() {
          if cancel.is_cancelled() {
            break;
          }
          let (chunks, warning) = chunker.chunk(file);
          if let Some(warning) = warning {
            warnings.push(warning);
          }
          let extraction = extract_file(&mut parser, file);
          prepared.push(PreparedFile {
            relative: file.relative.clone(),
            content_hash: file.content_hash.clone(),
            chunks,
            symbols: extraction.symbols,
            references: extraction.references,
          });

          if i % 20 == 0 {
            progress.send(
              IndexProgress::phase(IndexPhase::Chunk, total)
                .with_files(i + 1)
                .with_current_file(&file.relative),
            );
          }
        }
        (prepared, warnings)
      }));
    }

    let mut prepared = Vec::new();
    let mut warnings = Vec::new();
    for handle in handles {
      let (mut shard_prepared, mut shard_warnings) = handle.await.map_err(|e| IndexError::Worker(e.to_string()))?;
      prepared.append(&mut shard_prepared);
      warnings.append(&mut shard_warnings);
    }

    // Deterministic order regardless of worker interleaving.
    prepared.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok((prepared, warnings))
  }

  /// Point references at symbol ids where the target name is known,
  /// preferring a symbol in the same file. Unresolved targets stay as
  /// external names.
  fn resolve_references(&self, prepared: &mut [PreparedFile]) -> Result<()> {
    let changed_files: HashSet<String> = prepared.iter().map(|p| p.relative.clone()).collect();

    // Fresh symbols from this pass shadow stale store rows for changed files.
    let mut by_name: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for (name, entries) in self.with_store(|store| store.all_symbol_ids_by_name())? {
      let kept: Vec<(String, String)> = entries.into_iter().filter(|(_, file)| !changed_files.contains(file)).collect();
      if !kept.is_empty() {
        by_name.insert(name, kept);
      }
    }
    for file in prepared.iter() {
      for symbol in &file.symbols {
        by_name
          .entry(symbol.name.clone())
          .or_default()
          .push((symbol.id.clone(), symbol.file_path.clone()));
      }
    }

    for file in prepared.iter_mut() {
      for reference in file.references.iter_mut() {
        let Some(candidates) = by_name.get(&reference.to_symbol) else {
          continue;
        };
        let target = candidates
          .iter()
          .find(|(_, path)| path == &file.relative)
          .or_else(|| candidates.first());
        if let Some((id, _)) = target {
          reference.to_symbol = id.clone();
          reference.is_external = false;
        }
      }
    }

    Ok(())
  }

  /// Embed all new chunks in provider-sized batches across the worker pool.
  ///
  /// Returns vectors keyed by (file index, chunk index). A failed batch
  /// excludes only its chunks and surfaces as a warning.
  async fn embed_chunks(
    &self,
    prepared: &[PreparedFile],
    meta: &mut IndexMetadata,
    cancel: &CancellationToken,
    progress: &ProgressSink,
    total_chunks: usize,
  ) -> Result<(HashMap<(usize, usize), Vec<f32>>, Vec<String>)> {
    let batch_size = self.provider.max_batch_size().max(1);
    let workers = self.config.indexing.workers.unwrap_or_else(num_cpus::get).max(1);

    // Flatten chunks into provider-sized batches, keeping per-chunk order
    // within each batch.
    let mut slots: Vec<(usize, usize)> = Vec::with_capacity(total_chunks);
    for (file_idx, file) in prepared.iter().enumerate() {
      for chunk_idx in 0..file.chunks.len() {
        slots.push((file_idx, chunk_idx));
      }
    }
    let batches: Vec<Vec<(usize, usize)>> = slots.chunks(batch_size).map(|s| s.to_vec()).collect();

    let mut results = futures::stream::iter(batches.into_iter())
      .map(|batch| {
        let provider = Arc::clone(&self.provider);
        let cancel = cancel.clone();
        let texts: Vec<String> = batch
          .iter()
          .map(|&(f, c)| prepared[f].chunks[c].content.clone())
          .collect();
        async move {
          let result = provider.embed(&cancel, &texts).await;
          (batch, result)
        }
      })
      .buffer_unordered(workers);

    let mut vectors: HashMap<(usize, usize), Vec<f32>> = HashMap::new();
    let mut warnings = Vec::new();
    let mut embedded = 0usize;

    while let Some((batch, result)) = results.next().await {
      if cancel.is_cancelled() {
        return Err(IndexError::Cancelled);
      }
      match result {
        Ok(batch_vectors) if batch_vectors.len() == batch.len() => {
          for (slot, vector) in batch.into_iter().zip(batch_vectors) {
            // Freeze the dimension from the first embedding produced.
            if meta.dimensions == 0 {
              meta.dimensions = vector.len();
              debug!(dimensions = meta.dimensions, "Frozen embedding dimension");
            }
            if vector.len() != meta.dimensions {
              let file = &prepared[slot.0];
              warnings.push(format!(
                "{}: embedding width {} != index dimension {}, chunk excluded",
                file.relative,
                vector.len(),
                meta.dimensions
              ));
              continue;
            }
            vectors.insert(slot, vector);
            embedded += 1;
          }
        }
        Ok(batch_vectors) => {
          warnings.push(format!(
            "provider returned {} vectors for a batch of {}, batch excluded",
            batch_vectors.len(),
            batch.len()
          ));
        }
        Err(embedding::EmbeddingError::Cancelled) => return Err(IndexError::Cancelled),
        Err(e) => {
          let files: HashSet<&str> = batch.iter().map(|&(f, _)| prepared[f].relative.as_str()).collect();
          warn!(error = %e, files = ?files, "Embedding batch failed, excluding its chunks");
          warnings.push(format!("embedding failed for {} chunks: {e}", batch.len()));
        }
      }

      progress.send(IndexProgress::phase(IndexPhase::Embed, prepared.len()).with_chunks(embedded, total_chunks));
    }

    Ok((vectors, warnings))
  }

  /// Commit prepared files one transaction at a time.
  ///
  /// A file missing any vector keeps its previous index state this pass.
  async fn commit_files(
    &self,
    prepared: Vec<PreparedFile>,
    mut vectors: HashMap<(usize, usize), Vec<f32>>,
    config_hash: &str,
    cancel: &CancellationToken,
    progress: &ProgressSink,
    total_files: usize,
  ) -> Result<usize> {
    let mut committed = 0usize;
    let mut committed_chunks = 0usize;

    for (file_idx, file) in prepared.into_iter().enumerate() {
      if cancel.is_cancelled() {
        return Err(IndexError::Cancelled);
      }

      let mut chunk_batch: Vec<(Chunk, Vec<f32>)> = Vec::with_capacity(file.chunks.len());
      let mut missing = false;
      for (chunk_idx, chunk) in file.chunks.into_iter().enumerate() {
        match vectors.remove(&(file_idx, chunk_idx)) {
          Some(vector) => chunk_batch.push((chunk, vector)),
          None => {
            missing = true;
            break;
          }
        }
      }

      if missing {
        progress.send(
          IndexProgress::phase(IndexPhase::Commit, total_files)
            .with_warning(format!("{}: embeddings incomplete, keeping previous index state", file.relative)),
        );
        continue;
      }

      let chunk_count = chunk_batch.len();
      let relative = file.relative.clone();
      let config_hash = config_hash.to_string();
      let store_result = {
        let symbols = file.symbols;
        let references = file.references;
        let content_hash = file.content_hash;
        self.with_store(move |store| {
          store.replace_file(&relative, &chunk_batch, &symbols, &references, &content_hash, &config_hash)
        })
      };

      match store_result {
        Ok(()) => {
          committed += 1;
          committed_chunks += chunk_count;
        }
        Err(e) => {
          warn!(file = %file.relative, error = %e, "Per-file commit failed");
          progress.send(
            IndexProgress::phase(IndexPhase::Commit, total_files)
              .with_warning(format!("{}: commit failed: {e}", file.relative)),
          );
        }
      }

      if committed % 20 == 0 {
        progress.send(
          IndexProgress::phase(IndexPhase::Commit, total_files)
            .with_files(committed)
            .with_chunks(committed_chunks, committed_chunks)
            .with_current_file(&file.relative),
        );
      }
    }

    Ok(committed)
  }

  fn check_cancel(&self, cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() { Err(IndexError::Cancelled) } else { Ok(()) }
  }

  /// Run a store operation; callers stay on the async runtime while SQLite
  /// blocks briefly. The store serializes writers internally.
  fn with_store<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Store) -> db::Result<T>,
  {
    Ok(f(&self.store)?)
  }
}

/// Best-effort progress forwarding: a full or closed channel drops records
/// instead of stalling the pass.
#[derive(Clone)]
struct ProgressSink(Option<mpsc::Sender<IndexProgress>>);

impl ProgressSink {
  fn send(&self, record: IndexProgress) {
    if let Some(tx) = &self.0 {
      let _ = tx.try_send(record);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use embedding::mock::MockProvider;
  use tempfile::TempDir;

  use super::*;

  const GO_MAIN: &str = r#"package main

// main wires the service together.
func main() {
	cfg := LoadConfig("app.toml")
	Initialize(cfg)
}

// LoadConfig reads the engine configuration from disk.
func LoadConfig(path string) Config {
	data := readFile(path)
	return parseConfig(data)
}

// Initialize prepares logging and storage before serving.
func Initialize(cfg Config) {
	setupLogging(cfg)
	openStore(cfg)
}

func setupLogging(cfg Config) {
	fmt.Println("logging ready")
}
"#;

  struct Fixture {
    _temp: TempDir,
    root: PathBuf,
    store: Arc<Store>,
    provider: Arc<MockProvider>,
    indexer: Indexer,
  }

  fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("repo");
    std::fs::create_dir_all(&root).unwrap();

    let store = Arc::new(Store::open(&temp.path().join("index.db")).unwrap());
    let provider = Arc::new(MockProvider::new(32));
    let config = Arc::new(EngineConfig::default());
    let indexer = Indexer::new(
      Arc::clone(&store),
      Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
      config,
    );

    Fixture {
      _temp: temp,
      root,
      store,
      provider,
      indexer,
    }
  }

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  #[tokio::test]
  async fn test_index_go_file_end_to_end() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);

    let stats = f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();
    assert_eq!(stats.files, 1);
    assert!(stats.chunks >= 2, "expected >= 2 chunks, got {}", stats.chunks);
    assert!(stats.symbols >= 4);
    assert!(stats.references > 0);

    // chunk-vector pairing invariant
    let chunks = f.store.chunks_for_file("a.go").unwrap();
    let meta = f.store.get_metadata().unwrap().unwrap();
    assert_eq!(meta.dimensions, 32, "dimension frozen from first embedding");
    for chunk in &chunks {
      let vector = f.store.get_vector(&chunk.id).unwrap().unwrap();
      assert_eq!(vector.len(), meta.dimensions);
    }
  }

  #[tokio::test]
  async fn test_second_pass_skips_unchanged_files() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);

    let first = f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();
    let calls_after_first = f.provider.embed_calls();
    assert!(calls_after_first > 0);

    let second = f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();
    assert_eq!(first, second, "stats unchanged on a no-op pass");
    assert_eq!(f.provider.embed_calls(), calls_after_first, "zero embedding calls on cache hit");
  }

  #[tokio::test]
  async fn test_content_change_replaces_only_that_chunk() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);
    f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();

    let before = f.store.chunks_for_file("a.go").unwrap();
    let load_before = before.iter().find(|c| c.name.as_deref() == Some("LoadConfig")).unwrap().clone();
    let init_before = before.iter().find(|c| c.name.as_deref() == Some("Initialize")).unwrap().clone();

    // Mutate only LoadConfig's body
    let mutated = GO_MAIN.replace("data := readFile(path)", "data := readFileStrict(path)");
    write(&f.root, "a.go", &mutated);
    f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();

    let after = f.store.chunks_for_file("a.go").unwrap();
    assert!(
      !after.iter().any(|c| c.id == load_before.id),
      "old LoadConfig chunk must be gone"
    );
    let load_after = after.iter().find(|c| c.name.as_deref() == Some("LoadConfig")).unwrap();
    assert_ne!(load_after.id, load_before.id);
    assert_ne!(load_after.hash, load_before.hash);

    // Untouched function keeps identifier and hash
    let init_after = after.iter().find(|c| c.name.as_deref() == Some("Initialize")).unwrap();
    assert_eq!(init_after.id, init_before.id);
    assert_eq!(init_after.hash, init_before.hash);
  }

  #[tokio::test]
  async fn test_deleted_file_is_purged() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);
    write(&f.root, "b.go", "package main\n\nfunc Orphan() {\n\tprintln(\"soon gone from the index\")\n}\n");
    f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();
    assert!(!f.store.chunks_for_file("b.go").unwrap().is_empty());

    std::fs::remove_file(f.root.join("b.go")).unwrap();
    f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();

    assert!(f.store.chunks_for_file("b.go").unwrap().is_empty());
    assert!(f.store.symbols_for_file("b.go").unwrap().is_empty());
    assert!(f.store.references_for_file("b.go").unwrap().is_empty());
    assert!(f.store.get_file_hash("b.go").unwrap().is_none());
  }

  #[tokio::test]
  async fn test_force_reindexes_unchanged_files() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);
    f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();
    let calls = f.provider.embed_calls();

    let options = IndexOptions {
      force: true,
      ..Default::default()
    };
    f.indexer.index(&f.root, &options, None).await.unwrap();
    assert!(f.provider.embed_calls() > calls, "force must re-embed");
  }

  #[tokio::test]
  async fn test_cancelled_before_start_aborts() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);

    let options = IndexOptions::default();
    options.cancel.cancel();
    let err = f.indexer.index(&f.root, &options, None).await.unwrap_err();
    assert!(matches!(err, IndexError::Cancelled), "got {err:?}");

    // nothing committed
    assert!(f.store.chunks_for_file("a.go").unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_references_resolved_across_pass() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);
    f.indexer.index(&f.root, &IndexOptions::default(), None).await.unwrap();

    let refs = f.store.references_for_file("a.go").unwrap();
    let setup_call = refs
      .iter()
      .find(|r| r.kind == scout_core::ReferenceKind::Call && f.store.get_symbol(&r.to_symbol).unwrap().map(|s| s.name) == Some("setupLogging".to_string()));
    assert!(setup_call.is_some(), "setupLogging call should resolve to a symbol id");
    let setup_call = setup_call.unwrap();
    assert!(!setup_call.is_external);

    // unresolved callee stays an external name
    let external = refs.iter().find(|r| r.to_symbol == "readFile").unwrap();
    assert!(external.is_external);
  }

  #[tokio::test]
  async fn test_progress_records_flow() {
    let f = fixture();
    write(&f.root, "a.go", GO_MAIN);

    let (tx, mut rx) = mpsc::channel(256);
    f.indexer.index(&f.root, &IndexOptions::default(), Some(tx)).await.unwrap();

    let mut phases = Vec::new();
    while let Ok(record) = rx.try_recv() {
      phases.push(record.phase);
    }
    assert!(phases.contains(&IndexPhase::Scan));
    assert!(phases.contains(&IndexPhase::Filter));
    assert!(phases.contains(&IndexPhase::Done));
    assert_eq!(*phases.last().unwrap(), IndexPhase::Done);
  }
}
