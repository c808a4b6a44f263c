//! Index metadata and aggregate statistics.

use std::collections::HashMap;

use rusqlite::Connection;
use scout_core::IndexMetadata;

use crate::store::{Result, Store};

const METADATA_KEY: &str = "index_metadata";

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
  pub files: u64,
  pub chunks: u64,
  pub symbols: u64,
  pub references: u64,
  pub chunks_by_language: HashMap<String, u64>,
  pub chunks_by_kind: HashMap<String, u64>,
  pub index_size_bytes: u64,
}

impl Store {
  /// The single IndexMetadata row, if one has been written.
  pub fn get_metadata(&self) -> Result<Option<IndexMetadata>> {
    let conn = self.conn()?;
    let row = conn.query_row("SELECT value FROM metadata WHERE key = ?1", [METADATA_KEY], |r| {
      r.get::<_, String>(0)
    });
    match row {
      Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  pub fn set_metadata(&self, meta: &IndexMetadata) -> Result<()> {
    let conn = self.conn()?;
    let json = serde_json::to_string(meta)?;
    conn.execute(
      "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
      [METADATA_KEY, json.as_str()],
    )?;
    Ok(())
  }

  /// Frozen vector width from metadata, when set.
  pub(crate) fn metadata_dimensions(&self, conn: &Connection) -> Result<Option<usize>> {
    let row = conn.query_row("SELECT value FROM metadata WHERE key = ?1", [METADATA_KEY], |r| {
      r.get::<_, String>(0)
    });
    match row {
      Ok(json) => {
        let meta: IndexMetadata = serde_json::from_str(&json)?;
        Ok(Some(meta.dimensions))
      }
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  pub fn get_stats(&self) -> Result<StoreStats> {
    let conn = self.conn()?;

    let chunks: u64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0))?;
    let files: u64 = conn.query_row("SELECT COUNT(DISTINCT file_path) FROM chunks", [], |r| r.get(0))?;
    let symbols: u64 = conn.query_row("SELECT COUNT(*) FROM symbols", [], |r| r.get(0))?;
    let references: u64 = conn.query_row("SELECT COUNT(*) FROM refs", [], |r| r.get(0))?;

    let mut chunks_by_language = HashMap::new();
    let mut stmt = conn.prepare("SELECT language, COUNT(*) FROM chunks GROUP BY language")?;
    for row in stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, u64>(1)?)))? {
      let (lang, count) = row?;
      chunks_by_language.insert(lang, count);
    }

    let mut chunks_by_kind = HashMap::new();
    let mut stmt = conn.prepare("SELECT chunk_kind, COUNT(*) FROM chunks GROUP BY chunk_kind")?;
    for row in stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, u64>(1)?)))? {
      let (kind, count) = row?;
      chunks_by_kind.insert(kind, count);
    }

    let index_size_bytes = std::fs::metadata(self.path()).map(|m| m.len()).unwrap_or(0);

    Ok(StoreStats {
      files,
      chunks,
      symbols,
      references,
      chunks_by_language,
      chunks_by_kind,
      index_size_bytes,
    })
  }
}
