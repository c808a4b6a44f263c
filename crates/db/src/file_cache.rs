//! File cache operations for incremental indexing.
//!
//! Each row records the content hash last committed for a file and the
//! config hash it was indexed under. A matching pair lets the next pass skip
//! the file entirely; a config change invalidates every entry.

use std::collections::HashMap;

use rusqlite::params;

use crate::store::{Result, Store};

impl Store {
  /// `(content_hash, config_hash)` last committed for a file.
  pub fn get_file_hash(&self, file_path: &str) -> Result<Option<(String, String)>> {
    let conn = self.conn()?;
    let row = conn.query_row(
      "SELECT content_hash, config_hash FROM file_cache WHERE file_path = ?1",
      [file_path],
      |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
    );
    match row {
      Ok(pair) => Ok(Some(pair)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  pub fn set_file_hash(&self, file_path: &str, content_hash: &str, config_hash: &str) -> Result<()> {
    let conn = self.conn()?;
    conn.execute(
      "INSERT OR REPLACE INTO file_cache (file_path, content_hash, config_hash) VALUES (?1, ?2, ?3)",
      params![file_path, content_hash, config_hash],
    )?;
    Ok(())
  }

  /// Every cached path with its `(content_hash, config_hash)`.
  /// Used by the cleanup phase to find files that vanished from disk.
  pub fn get_all_file_hashes(&self) -> Result<HashMap<String, (String, String)>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT file_path, content_hash, config_hash FROM file_cache")?;
    let mut map = HashMap::new();
    let rows = stmt.query_map([], |r| {
      Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?))
    })?;
    for row in rows {
      let (path, content, config) = row?;
      map.insert(path, (content, config));
    }
    Ok(map)
  }

  pub fn delete_file_cache(&self, file_path: &str) -> Result<()> {
    let conn = self.conn()?;
    conn.execute("DELETE FROM file_cache WHERE file_path = ?1", [file_path])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn test_store() -> (TempDir, Store) {
    let temp = TempDir::new().unwrap();
    let store = Store::open(&temp.path().join("index.db")).unwrap();
    (temp, store)
  }

  #[test]
  fn test_set_and_get() {
    let (_temp, store) = test_store();
    assert!(store.get_file_hash("a.go").unwrap().is_none());

    store.set_file_hash("a.go", "hash-1", "cfg-1").unwrap();
    assert_eq!(
      store.get_file_hash("a.go").unwrap(),
      Some(("hash-1".to_string(), "cfg-1".to_string()))
    );

    // replacing updates in place
    store.set_file_hash("a.go", "hash-2", "cfg-1").unwrap();
    assert_eq!(store.get_file_hash("a.go").unwrap().unwrap().0, "hash-2");
  }

  #[test]
  fn test_get_all_and_delete() {
    let (_temp, store) = test_store();
    store.set_file_hash("a.go", "h1", "c").unwrap();
    store.set_file_hash("b.go", "h2", "c").unwrap();

    let all = store.get_all_file_hashes().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["b.go"].0, "h2");

    store.delete_file_cache("a.go").unwrap();
    assert!(store.get_file_hash("a.go").unwrap().is_none());
    assert_eq!(store.get_all_file_hashes().unwrap().len(), 1);
  }
}
