//! Chunk, vector and full-text table operations.

use globset::{Glob, GlobSet, GlobSetBuilder};
use rusqlite::{Connection, Row, params, params_from_iter};
use scout_core::{Chunk, ChunkKind, Language, Reference, Symbol};
use tracing::{debug, warn};

use crate::{
  store::{DbError, Result, Store},
  vectors::{bytes_to_vector, cosine_similarity, vector_to_bytes},
};

/// Filters shared by both retrieval legs.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
  /// Language tags, e.g. ["go", "python"]. Empty matches all.
  pub languages: Vec<String>,
  /// Chunk kinds, e.g. ["function", "method"]. Empty matches all.
  pub chunk_kinds: Vec<String>,
  /// Glob patterns over file paths, e.g. ["src/**/*.rs"]. Empty matches all.
  pub file_paths: Vec<String>,
}

impl SearchFilters {
  pub fn is_empty(&self) -> bool {
    self.languages.is_empty() && self.chunk_kinds.is_empty() && self.file_paths.is_empty()
  }

  fn path_matcher(&self) -> Result<Option<GlobSet>> {
    if self.file_paths.is_empty() {
      return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in &self.file_paths {
      let glob = Glob::new(pattern).map_err(|e| DbError::InvalidInput(format!("bad path glob '{pattern}': {e}")))?;
      builder.add(glob);
    }
    Ok(Some(
      builder
        .build()
        .map_err(|e| DbError::InvalidInput(format!("bad path globs: {e}")))?,
    ))
  }
}

/// A chunk with a retrieval score (higher is better for both legs).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
  pub chunk: Chunk,
  pub score: f32,
}

/// Result of a full-text index health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtsHealth {
  Healthy,
  /// Rows out of sync with the chunks table; repair with `rebuild_fts`.
  Drift { missing: u64, orphaned: u64 },
}

impl Store {
  /// Upsert chunks with their vectors and FTS rows in one transaction.
  ///
  /// FTS entries for replaced chunk ids are rebuilt. Vector widths are
  /// validated against the frozen metadata dimension when one is set.
  #[tracing::instrument(level = "trace", skip(self, batch), fields(batch_size = batch.len()))]
  pub fn store_chunks(&self, batch: &[(Chunk, Vec<f32>)]) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }

    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    self.validate_dimensions(&tx, batch)?;
    insert_chunks(&tx, batch)?;
    tx.commit()?;
    Ok(())
  }

  /// Replace everything the index holds for one file, atomically.
  ///
  /// Runs the whole sequence - delete old rows, insert chunks, vectors, FTS
  /// rows, symbols and references, update the file cache - in a single
  /// transaction. A crash before commit leaves the file's previous index
  /// entries intact.
  #[tracing::instrument(
    level = "trace",
    skip(self, chunks, symbols, references),
    fields(file = %file_path, chunks = chunks.len(), symbols = symbols.len(), refs = references.len())
  )]
  pub fn replace_file(
    &self,
    file_path: &str,
    chunks: &[(Chunk, Vec<f32>)],
    symbols: &[Symbol],
    references: &[Reference],
    content_hash: &str,
    config_hash: &str,
  ) -> Result<()> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;

    self.validate_dimensions(&tx, chunks)?;
    delete_file_rows(&tx, file_path)?;
    insert_chunks(&tx, chunks)?;
    insert_symbols(&tx, symbols)?;
    insert_references(&tx, references)?;
    tx.execute(
      "INSERT OR REPLACE INTO file_cache (file_path, content_hash, config_hash) VALUES (?1, ?2, ?3)",
      params![file_path, content_hash, config_hash],
    )?;

    tx.commit()?;
    debug!(file = %file_path, chunks = chunks.len(), "Replaced file in index");
    Ok(())
  }

  /// Delete all chunks, vectors, FTS rows, symbols and references for a file
  /// in one transaction. Used before re-ingesting a changed file.
  pub fn delete_chunks_by_file(&self, file_path: &str) -> Result<()> {
    debug!(file = %file_path, "Deleting index rows for file");
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    delete_file_rows(&tx, file_path)?;
    tx.commit()?;
    Ok(())
  }

  /// Remove a file from the index entirely, including its cache row.
  /// Used by cleanup when a file disappears from disk.
  pub fn delete_file(&self, file_path: &str) -> Result<()> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    delete_file_rows(&tx, file_path)?;
    tx.execute("DELETE FROM file_cache WHERE file_path = ?1", [file_path])?;
    tx.commit()?;
    Ok(())
  }

  /// Get a chunk by id.
  pub fn get_chunk(&self, id: &str) -> Result<Option<Chunk>> {
    let conn = self.conn()?;
    let row = conn.query_row(
      "SELECT id, file_path, language, chunk_kind, name, parent_name, start_line, end_line, hash, content
       FROM chunks WHERE id = ?1",
      [id],
      chunk_from_row,
    );
    match row {
      Ok(chunk) => Ok(Some(chunk)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// All chunks for one file, ordered by start line.
  pub fn chunks_for_file(&self, file_path: &str) -> Result<Vec<Chunk>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT id, file_path, language, chunk_kind, name, parent_name, start_line, end_line, hash, content
       FROM chunks WHERE file_path = ?1 ORDER BY start_line",
    )?;
    let chunks = stmt
      .query_map([file_path], chunk_from_row)?
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(chunks)
  }

  /// Get the stored embedding for a chunk.
  pub fn get_vector(&self, chunk_id: &str) -> Result<Option<Vec<f32>>> {
    let conn = self.conn()?;
    let row = conn.query_row("SELECT embedding FROM vectors WHERE chunk_id = ?1", [chunk_id], |r| {
      r.get::<_, Vec<u8>>(0)
    });
    match row {
      Ok(bytes) => Ok(Some(bytes_to_vector(&bytes))),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// Exact k-NN by cosine similarity over the vectors table.
  ///
  /// Two-phase: score ids against embeddings first, then fetch full rows for
  /// the top k only.
  #[tracing::instrument(level = "trace", skip(self, query_vector, filters), fields(k = k))]
  pub fn vector_search(&self, query_vector: &[f32], k: usize, filters: &SearchFilters) -> Result<Vec<ScoredChunk>> {
    if k == 0 || query_vector.is_empty() {
      return Ok(Vec::new());
    }

    let path_matcher = filters.path_matcher()?;
    let conn = self.conn()?;

    let (mut sql, mut params) = (
      String::from(
        "SELECT v.chunk_id, v.embedding, c.file_path FROM vectors v JOIN chunks c ON c.id = v.chunk_id WHERE 1=1",
      ),
      Vec::<Box<dyn rusqlite::ToSql>>::new(),
    );
    push_in_filter(&mut sql, &mut params, "c.language", &filters.languages);
    push_in_filter(&mut sql, &mut params, "c.chunk_kind", &filters.chunk_kinds);

    let mut stmt = conn.prepare(&sql)?;
    let mut scored: Vec<(String, f32)> = stmt
      .query_map(params_from_iter(params.iter().map(|p| p.as_ref())), |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, Vec<u8>>(1)?,
          row.get::<_, String>(2)?,
        ))
      })?
      .filter_map(|r| match r {
        Ok(row) => Some(row),
        Err(e) => {
          warn!(error = %e, "Skipping vector row");
          None
        }
      })
      .filter(|(_, _, file_path)| {
        path_matcher
          .as_ref()
          .is_none_or(|m| m.is_match(file_path.as_str()))
      })
      .map(|(id, bytes, _)| {
        let embedding = bytes_to_vector(&bytes);
        (id, cosine_similarity(query_vector, &embedding))
      })
      .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    self.fetch_scored(&conn, scored)
  }

  /// Top-k BM25 hits from the full-text index.
  ///
  /// Scores are `-bm25(...)` so that, as with the vector leg, higher is
  /// better.
  #[tracing::instrument(level = "trace", skip(self, query, filters), fields(k = k))]
  pub fn bm25_search(&self, query: &str, k: usize, filters: &SearchFilters) -> Result<Vec<ScoredChunk>> {
    if k == 0 {
      return Ok(Vec::new());
    }
    let Some(match_query) = fts_match_query(query) else {
      return Ok(Vec::new());
    };

    let path_matcher = filters.path_matcher()?;
    // Path globs are applied after the query; oversample so post-filtering
    // still fills k.
    let fetch = if path_matcher.is_some() { k * 4 } else { k };

    let conn = self.conn()?;
    let mut sql = String::from(
      "SELECT c.id, bm25(chunks_fts) AS rank, c.file_path
       FROM chunks_fts JOIN chunks c ON c.id = chunks_fts.id
       WHERE chunks_fts MATCH ?1",
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(match_query)];
    push_in_filter(&mut sql, &mut params, "c.language", &filters.languages);
    push_in_filter(&mut sql, &mut params, "c.chunk_kind", &filters.chunk_kinds);
    sql.push_str(" ORDER BY rank LIMIT ?");
    params.push(Box::new(fetch as i64));

    let mut stmt = conn.prepare(&sql)?;
    let scored: Vec<(String, f32)> = stmt
      .query_map(params_from_iter(params.iter().map(|p| p.as_ref())), |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, f64>(1)?,
          row.get::<_, String>(2)?,
        ))
      })?
      .filter_map(|r| r.ok())
      .filter(|(_, _, file_path)| {
        path_matcher
          .as_ref()
          .is_none_or(|m| m.is_match(file_path.as_str()))
      })
      .take(k)
      .map(|(id, rank, _)| (id, -rank as f32))
      .collect();

    self.fetch_scored(&conn, scored)
  }

  /// Fetch full chunk rows for scored ids, preserving score order.
  fn fetch_scored(&self, conn: &Connection, scored: Vec<(String, f32)>) -> Result<Vec<ScoredChunk>> {
    if scored.is_empty() {
      return Ok(Vec::new());
    }

    let ids: Vec<&str> = scored.iter().map(|(id, _)| id.as_str()).collect();
    let placeholders: String = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!(
      "SELECT id, file_path, language, chunk_kind, name, parent_name, start_line, end_line, hash, content
       FROM chunks WHERE id IN ({placeholders})"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows: std::collections::HashMap<String, Chunk> = stmt
      .query_map(params_from_iter(&ids), chunk_from_row)?
      .filter_map(|r| r.ok())
      .map(|chunk| (chunk.id.clone(), chunk))
      .collect();

    let results = scored
      .into_iter()
      .filter_map(|(id, score)| rows.get(&id).map(|chunk| ScoredChunk { chunk: chunk.clone(), score }))
      .collect();
    Ok(results)
  }

  /// Rebuild the full-text index from the chunks table in one transaction.
  pub fn rebuild_fts(&self) -> Result<()> {
    debug!("Rebuilding full-text index from chunks");
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM chunks_fts", [])?;
    tx.execute("INSERT INTO chunks_fts (id, content) SELECT id, content FROM chunks", [])?;
    tx.commit()?;
    Ok(())
  }

  /// Compare the full-text index against the chunks table.
  pub fn check_fts_health(&self) -> Result<FtsHealth> {
    let conn = self.conn()?;
    let missing: u64 = conn.query_row(
      "SELECT COUNT(*) FROM chunks WHERE id NOT IN (SELECT id FROM chunks_fts)",
      [],
      |r| r.get(0),
    )?;
    let orphaned: u64 = conn.query_row(
      "SELECT COUNT(*) FROM chunks_fts WHERE id NOT IN (SELECT id FROM chunks)",
      [],
      |r| r.get(0),
    )?;

    if missing == 0 && orphaned == 0 {
      Ok(FtsHealth::Healthy)
    } else {
      warn!(missing, orphaned, "Full-text index drift detected");
      Ok(FtsHealth::Drift { missing, orphaned })
    }
  }

  /// Vector widths in a batch must agree with the frozen metadata dimension.
  fn validate_dimensions(&self, conn: &Connection, batch: &[(Chunk, Vec<f32>)]) -> Result<()> {
    let Some(expected) = self.metadata_dimensions(conn)? else {
      return Ok(());
    };
    if expected == 0 {
      return Ok(());
    }
    for (chunk, vector) in batch {
      if vector.len() != expected {
        return Err(DbError::InvalidInput(format!(
          "vector width {} for chunk {} does not match index dimension {}",
          vector.len(),
          chunk.id,
          expected
        )));
      }
    }
    Ok(())
  }
}

fn delete_file_rows(conn: &Connection, file_path: &str) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM vectors WHERE chunk_id IN (SELECT id FROM chunks WHERE file_path = ?1)",
    [file_path],
  )?;
  conn.execute(
    "DELETE FROM chunks_fts WHERE id IN (SELECT id FROM chunks WHERE file_path = ?1)",
    [file_path],
  )?;
  conn.execute("DELETE FROM chunks WHERE file_path = ?1", [file_path])?;
  conn.execute("DELETE FROM symbols WHERE file_path = ?1", [file_path])?;
  conn.execute("DELETE FROM refs WHERE file_path = ?1", [file_path])?;
  Ok(())
}

fn insert_chunks(conn: &Connection, batch: &[(Chunk, Vec<f32>)]) -> rusqlite::Result<()> {
  let mut chunk_stmt = conn.prepare_cached(
    "INSERT OR REPLACE INTO chunks
     (id, file_path, language, chunk_kind, name, parent_name, start_line, end_line, hash, content)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
  )?;
  let mut vector_stmt =
    conn.prepare_cached("INSERT OR REPLACE INTO vectors (chunk_id, embedding) VALUES (?1, ?2)")?;
  let mut fts_delete = conn.prepare_cached("DELETE FROM chunks_fts WHERE id = ?1")?;
  let mut fts_insert = conn.prepare_cached("INSERT INTO chunks_fts (id, content) VALUES (?1, ?2)")?;

  for (chunk, vector) in batch {
    chunk_stmt.execute(params![
      chunk.id,
      chunk.file_path,
      chunk.language.as_str(),
      chunk.kind.as_str(),
      chunk.name,
      chunk.parent_name,
      chunk.start_line,
      chunk.end_line,
      chunk.hash,
      chunk.content,
    ])?;
    vector_stmt.execute(params![chunk.id, vector_to_bytes(vector)])?;
    fts_delete.execute([&chunk.id])?;
    fts_insert.execute(params![chunk.id, chunk.content])?;
  }
  Ok(())
}

pub(crate) fn insert_symbols(conn: &Connection, symbols: &[Symbol]) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR REPLACE INTO symbols
     (id, name, kind, file_path, start_line, end_line, line_count, signature, visibility, doc)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
  )?;
  for symbol in symbols {
    stmt.execute(params![
      symbol.id,
      symbol.name,
      symbol.kind.as_str(),
      symbol.file_path,
      symbol.start_line,
      symbol.end_line,
      symbol.line_count(),
      symbol.signature,
      symbol.visibility.as_str(),
      symbol.doc,
    ])?;
  }
  Ok(())
}

pub(crate) fn insert_references(conn: &Connection, references: &[Reference]) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR REPLACE INTO refs (id, from_symbol, to_symbol, kind, file_path, line, is_external)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
  )?;
  for reference in references {
    stmt.execute(params![
      reference.id,
      reference.from_symbol,
      reference.to_symbol,
      reference.kind.as_str(),
      reference.file_path,
      reference.line,
      reference.is_external,
    ])?;
  }
  Ok(())
}

fn push_in_filter(sql: &mut String, params: &mut Vec<Box<dyn rusqlite::ToSql>>, column: &str, values: &[String]) {
  if values.is_empty() {
    return;
  }
  let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
  sql.push_str(&format!(" AND {} IN ({})", column, placeholders.join(",")));
  for value in values {
    params.push(Box::new(value.clone()));
  }
}

/// Turn free text into an FTS5 MATCH expression: each token quoted, OR-joined.
fn fts_match_query(text: &str) -> Option<String> {
  let tokens: Vec<String> = text
    .split(|c: char| !c.is_alphanumeric() && c != '_')
    .filter(|t| !t.is_empty())
    .map(|t| format!("\"{t}\""))
    .collect();
  if tokens.is_empty() { None } else { Some(tokens.join(" OR ")) }
}

fn chunk_from_row(row: &Row) -> rusqlite::Result<Chunk> {
  Ok(Chunk {
    id: row.get(0)?,
    file_path: row.get(1)?,
    language: Language::from_str_tag(&row.get::<_, String>(2)?),
    kind: ChunkKind::from_str_tag(&row.get::<_, String>(3)?),
    name: row.get(4)?,
    parent_name: row.get(5)?,
    start_line: row.get(6)?,
    end_line: row.get(7)?,
    hash: row.get(8)?,
    content: row.get(9)?,
  })
}

#[cfg(test)]
mod tests {
  use scout_core::{ChunkKind, Language};
  use tempfile::TempDir;

  use super::*;

  fn test_store() -> (TempDir, Store) {
    let temp = TempDir::new().unwrap();
    let store = Store::open(&temp.path().join("index.db")).unwrap();
    (temp, store)
  }

  fn test_chunk(path: &str, start_line: u32, content: &str) -> Chunk {
    Chunk::new(
      path,
      Language::Go,
      ChunkKind::Function,
      Some("fn".to_string()),
      None,
      start_line,
      start_line + content.lines().count().max(1) as u32 - 1,
      content.to_string(),
    )
  }

  #[test]
  fn test_store_and_get_chunk() {
    let (_temp, store) = test_store();
    let chunk = test_chunk("a.go", 1, "func A() { login() }");
    store.store_chunks(&[(chunk.clone(), vec![0.1, 0.2])]).unwrap();

    let loaded = store.get_chunk(&chunk.id).unwrap().unwrap();
    assert_eq!(loaded.content, chunk.content);
    assert_eq!(loaded.hash, chunk.hash);
    assert_eq!(store.get_vector(&chunk.id).unwrap().unwrap(), vec![0.1, 0.2]);
  }

  #[test]
  fn test_delete_chunks_by_file_cascades() {
    let (_temp, store) = test_store();
    let keep = test_chunk("keep.go", 1, "func Keep() {}");
    let gone = test_chunk("gone.go", 1, "func Gone() {}");
    store
      .store_chunks(&[(keep.clone(), vec![1.0]), (gone.clone(), vec![0.5])])
      .unwrap();

    store.delete_chunks_by_file("gone.go").unwrap();

    assert!(store.get_chunk(&gone.id).unwrap().is_none());
    assert!(store.get_vector(&gone.id).unwrap().is_none());
    assert!(store.get_chunk(&keep.id).unwrap().is_some());

    // FTS rows gone too
    let hits = store.bm25_search("Gone", 10, &SearchFilters::default()).unwrap();
    assert!(hits.is_empty(), "deleted file still matched: {hits:?}");
  }

  #[test]
  fn test_vector_search_orders_by_cosine() {
    let (_temp, store) = test_store();
    let close = test_chunk("close.go", 1, "func Close() {}");
    let far = test_chunk("far.go", 1, "func Far() {}");
    store
      .store_chunks(&[(close.clone(), vec![1.0, 0.0]), (far.clone(), vec![0.0, 1.0])])
      .unwrap();

    let results = store.vector_search(&[1.0, 0.1], 10, &SearchFilters::default()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.id, close.id);
    assert!(results[0].score > results[1].score);
  }

  #[test]
  fn test_vector_search_language_filter() {
    let (_temp, store) = test_store();
    let mut go_chunk = test_chunk("a.go", 1, "func A() {}");
    go_chunk.language = Language::Go;
    let mut py_chunk = test_chunk("b.py", 1, "def b(): pass");
    py_chunk.language = Language::Python;
    store
      .store_chunks(&[(go_chunk, vec![1.0, 0.0]), (py_chunk, vec![1.0, 0.0])])
      .unwrap();

    let filters = SearchFilters {
      languages: vec!["python".to_string()],
      ..Default::default()
    };
    let results = store.vector_search(&[1.0, 0.0], 10, &filters).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.language, Language::Python);
  }

  #[test]
  fn test_bm25_search_finds_terms() {
    let (_temp, store) = test_store();
    let auth = test_chunk("auth.go", 1, "func HandleLogin() { authenticate(); issueToken() }");
    let misc = test_chunk("misc.go", 1, "func Render() { drawFrame() }");
    store
      .store_chunks(&[(auth.clone(), vec![1.0]), (misc, vec![0.0])])
      .unwrap();

    let results = store.bm25_search("authenticate token", 10, &SearchFilters::default()).unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].chunk.id, auth.id);
    assert!(results[0].score > 0.0, "bm25 score should be positive: {}", results[0].score);
  }

  #[test]
  fn test_bm25_search_path_glob_filter() {
    let (_temp, store) = test_store();
    let a = test_chunk("src/auth/login.go", 1, "func Login() { verify() }");
    let b = test_chunk("vendor/lib.go", 1, "func Login() { verify() }");
    store.store_chunks(&[(a.clone(), vec![1.0]), (b, vec![1.0])]).unwrap();

    let filters = SearchFilters {
      file_paths: vec!["src/**".to_string()],
      ..Default::default()
    };
    let results = store.bm25_search("verify", 10, &filters).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.file_path, "src/auth/login.go");
  }

  #[test]
  fn test_bm25_empty_query_returns_nothing() {
    let (_temp, store) = test_store();
    let results = store.bm25_search("   ...   ", 10, &SearchFilters::default()).unwrap();
    assert!(results.is_empty());
  }

  #[test]
  fn test_replace_file_is_atomic_swap() {
    let (_temp, store) = test_store();
    let old = test_chunk("a.go", 1, "func Old() {}");
    store
      .replace_file("a.go", &[(old.clone(), vec![1.0])], &[], &[], "hash-v1", "cfg")
      .unwrap();

    let new = test_chunk("a.go", 1, "func New() {}");
    store
      .replace_file("a.go", &[(new.clone(), vec![0.5])], &[], &[], "hash-v2", "cfg")
      .unwrap();

    assert!(store.get_chunk(&old.id).unwrap().is_none(), "old chunk must be gone");
    assert!(store.get_chunk(&new.id).unwrap().is_some());
    assert_eq!(store.get_file_hash("a.go").unwrap().unwrap().0, "hash-v2");
  }

  #[test]
  fn test_fts_health_and_rebuild() {
    let (_temp, store) = test_store();
    let chunk = test_chunk("a.go", 1, "func Indexed() { query() }");
    store.store_chunks(&[(chunk.clone(), vec![1.0])]).unwrap();
    assert_eq!(store.check_fts_health().unwrap(), FtsHealth::Healthy);

    // Simulate crash drift: FTS row vanishes while the chunk stays
    {
      let conn = store.conn().unwrap();
      conn.execute("DELETE FROM chunks_fts WHERE id = ?1", [&chunk.id]).unwrap();
    }
    match store.check_fts_health().unwrap() {
      FtsHealth::Drift { missing, orphaned } => {
        assert_eq!(missing, 1);
        assert_eq!(orphaned, 0);
      }
      FtsHealth::Healthy => panic!("expected drift"),
    }

    store.rebuild_fts().unwrap();
    assert_eq!(store.check_fts_health().unwrap(), FtsHealth::Healthy);
    let hits = store.bm25_search("query", 10, &SearchFilters::default()).unwrap();
    assert_eq!(hits.len(), 1);
  }

  #[test]
  fn test_dimension_validation_rejects_mismatch() {
    let (_temp, store) = test_store();
    let mut meta = scout_core::IndexMetadata::new("mock", "m", "ast", "cfg");
    meta.dimensions = 4;
    store.set_metadata(&meta).unwrap();

    let chunk = test_chunk("a.go", 1, "func A() {}");
    let err = store.store_chunks(&[(chunk, vec![1.0, 2.0])]).unwrap_err();
    assert!(matches!(err, DbError::InvalidInput(_)), "got {err:?}");
  }

  #[test]
  fn test_fts_match_query_sanitizes() {
    assert_eq!(
      fts_match_query("user auth-flow").unwrap(),
      "\"user\" OR \"auth\" OR \"flow\""
    );
    assert!(fts_match_query("--- ***").is_none());
  }
}
