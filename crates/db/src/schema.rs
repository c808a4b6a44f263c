//! Storage schema.
//!
//! Physical layout of the logical tables: chunks, vectors, chunks_fts (FTS5,
//! BM25), symbols, refs, file_cache, metadata. Schema changes bump
//! `scout_core::SCHEMA_VERSION` and add a migration arm in `store::migrate`.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
  id TEXT PRIMARY KEY,
  file_path TEXT NOT NULL,
  language TEXT NOT NULL,
  chunk_kind TEXT NOT NULL,
  name TEXT,
  parent_name TEXT,
  start_line INTEGER NOT NULL,
  end_line INTEGER NOT NULL,
  hash TEXT NOT NULL,
  content TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chunks_file_path ON chunks(file_path);

CREATE TABLE IF NOT EXISTS vectors (
  chunk_id TEXT PRIMARY KEY,
  embedding BLOB NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
  id UNINDEXED,
  content,
  tokenize = 'unicode61'
);

CREATE TABLE IF NOT EXISTS symbols (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  kind TEXT NOT NULL,
  file_path TEXT NOT NULL,
  start_line INTEGER NOT NULL,
  end_line INTEGER NOT NULL,
  line_count INTEGER NOT NULL,
  signature TEXT NOT NULL DEFAULT '',
  visibility TEXT NOT NULL DEFAULT 'private',
  doc TEXT
);
CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_symbols_file_path ON symbols(file_path);

CREATE TABLE IF NOT EXISTS refs (
  id TEXT PRIMARY KEY,
  from_symbol TEXT NOT NULL,
  to_symbol TEXT NOT NULL,
  kind TEXT NOT NULL,
  file_path TEXT NOT NULL,
  line INTEGER NOT NULL,
  is_external INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_refs_from ON refs(from_symbol);
CREATE INDEX IF NOT EXISTS idx_refs_to ON refs(to_symbol);
CREATE INDEX IF NOT EXISTS idx_refs_file_path ON refs(file_path);

CREATE TABLE IF NOT EXISTS file_cache (
  file_path TEXT PRIMARY KEY,
  content_hash TEXT NOT NULL,
  config_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS metadata (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#;
