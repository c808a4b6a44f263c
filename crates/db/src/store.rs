use std::path::{Path, PathBuf};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use scout_core::SCHEMA_VERSION;
use thiserror::Error;
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;

#[derive(Error, Debug)]
pub enum DbError {
  #[error("Database error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("Connection pool error: {0}")]
  Pool(#[from] r2d2::Error),
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("Not found: {0}")]
  NotFound(String),
  #[error("Invalid input: {0}")]
  InvalidInput(String),
  #[error(
    "Schema version mismatch: index is v{found}, engine expects v{expected}. Delete the index file and reindex."
  )]
  SchemaIncompatible { found: i32, expected: i32 },
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Single-file SQLite store for one index.
///
/// Uses a small r2d2 pool with WAL mode: concurrent readers, one writer at a
/// time (SQLite serializes writers; busy_timeout covers contention). All
/// methods take `&self` and are safe to call from multiple threads.
#[derive(Debug)]
pub struct Store {
  pool: Pool<SqliteConnectionManager>,
  path: PathBuf,
}

impl Store {
  /// Open or create the index at `path`.
  ///
  /// Runs the schema, then checks the stored schema version: an incompatible
  /// version fails with [`DbError::SchemaIncompatible`] advising a reindex
  /// rather than touching the data.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
      // WAL for concurrent readers alongside the single writer
      conn.pragma_update(None, "journal_mode", "WAL")?;
      // Wait up to 5s if the database is locked
      conn.pragma_update(None, "busy_timeout", 5000)?;
      // NORMAL sync is safe with WAL and faster than FULL
      conn.pragma_update(None, "synchronous", "NORMAL")?;
      conn.pragma_update(None, "foreign_keys", "ON")?;
      Ok(())
    });

    let pool = Pool::builder().max_size(4).build(manager)?;

    info!(path = %path.display(), "Opening index store");
    let store = Self {
      pool,
      path: path.to_path_buf(),
    };

    store.migrate()?;
    Ok(store)
  }

  pub(crate) fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
    Ok(self.pool.get()?)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Create tables and verify the schema version.
  fn migrate(&self) -> Result<()> {
    let conn = self.conn()?;
    conn.execute_batch(SCHEMA_SQL)?;

    let stored: Option<i32> = conn
      .query_row("SELECT value FROM metadata WHERE key = 'schema_version'", [], |r| {
        r.get::<_, String>(0)
      })
      .ok()
      .and_then(|s| s.parse().ok());

    match stored {
      None => {
        debug!(version = SCHEMA_VERSION, "Initializing schema version");
        conn.execute(
          "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
          [SCHEMA_VERSION.to_string()],
        )?;
      }
      Some(v) if v == SCHEMA_VERSION => {}
      Some(v) => {
        return Err(DbError::SchemaIncompatible {
          found: v,
          expected: SCHEMA_VERSION,
        });
      }
    }

    Ok(())
  }

  /// Release pooled handles. All durable state survives; the struct is
  /// unusable afterwards only because it is consumed.
  pub fn close(self) {
    debug!(path = %self.path.display(), "Closing index store");
    drop(self.pool);
  }
}

/// Escape `%`, `_` and the escape char for a LIKE pattern with `ESCAPE '\'`.
pub(crate) fn escape_like(s: &str) -> String {
  s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_open_creates_file_and_tables() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("index.db");
    let store = Store::open(&path).unwrap();

    let conn = store.conn().unwrap();
    let tables: Vec<String> = conn
      .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index')")
      .unwrap()
      .query_map([], |r| r.get(0))
      .unwrap()
      .filter_map(|r| r.ok())
      .collect();

    for required in ["chunks", "vectors", "symbols", "refs", "file_cache", "metadata"] {
      assert!(tables.iter().any(|t| t == required), "missing table {required}: {tables:?}");
    }
    assert!(path.exists());
  }

  #[test]
  fn test_reopen_is_compatible() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("index.db");
    Store::open(&path).unwrap().close();
    // Reopening the same file succeeds with the same schema version
    Store::open(&path).unwrap();
  }

  #[test]
  fn test_incompatible_schema_version_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("index.db");
    {
      let store = Store::open(&path).unwrap();
      let conn = store.conn().unwrap();
      conn
        .execute("UPDATE metadata SET value = '999' WHERE key = 'schema_version'", [])
        .unwrap();
    }

    let err = Store::open(&path).unwrap_err();
    match err {
      DbError::SchemaIncompatible { found, expected } => {
        assert_eq!(found, 999);
        assert_eq!(expected, SCHEMA_VERSION);
      }
      other => panic!("expected SchemaIncompatible, got {other:?}"),
    }
  }

  #[test]
  fn test_escape_like() {
    assert_eq!(escape_like("50%_done"), "50\\%\\_done");
  }
}
