//! Symbol table operations.

use rusqlite::{Row, params_from_iter};
use scout_core::{Symbol, SymbolKind, Visibility};

use crate::store::{Result, Store, escape_like};

/// How `find_symbols_advanced` orders its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolSort {
  /// Descending line count (biggest first).
  Lines,
  /// Ascending name.
  #[default]
  Name,
}

impl SymbolSort {
  pub fn from_str_tag(s: &str) -> Self {
    if s == "lines" { SymbolSort::Lines } else { SymbolSort::Name }
  }
}

/// Parameters for advanced symbol lookup.
#[derive(Debug, Clone, Default)]
pub struct SymbolQuery {
  /// Substring match on the symbol name. Empty matches all.
  pub query: String,
  pub kind: Option<SymbolKind>,
  pub min_lines: Option<u32>,
  pub sort_by: SymbolSort,
  pub limit: usize,
}

impl Store {
  /// Transactional upsert keyed by symbol id.
  #[tracing::instrument(level = "trace", skip(self, batch), fields(batch_size = batch.len()))]
  pub fn store_symbols(&self, batch: &[Symbol]) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    crate::chunks::insert_symbols(&tx, batch)?;
    tx.commit()?;
    Ok(())
  }

  pub fn get_symbol(&self, id: &str) -> Result<Option<Symbol>> {
    let conn = self.conn()?;
    let row = conn.query_row(
      "SELECT id, name, kind, file_path, start_line, end_line, signature, visibility, doc
       FROM symbols WHERE id = ?1",
      [id],
      symbol_from_row,
    );
    match row {
      Ok(symbol) => Ok(Some(symbol)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// Symbols with an exact name, optionally narrowed to one file.
  pub fn symbols_by_name(&self, name: &str, file_path: Option<&str>) -> Result<Vec<Symbol>> {
    let conn = self.conn()?;
    let mut results = Vec::new();
    match file_path {
      Some(path) => {
        let mut stmt = conn.prepare(
          "SELECT id, name, kind, file_path, start_line, end_line, signature, visibility, doc
           FROM symbols WHERE name = ?1 AND file_path = ?2 ORDER BY start_line",
        )?;
        for row in stmt.query_map([name, path], symbol_from_row)? {
          results.push(row?);
        }
      }
      None => {
        let mut stmt = conn.prepare(
          "SELECT id, name, kind, file_path, start_line, end_line, signature, visibility, doc
           FROM symbols WHERE name = ?1 ORDER BY file_path, start_line",
        )?;
        for row in stmt.query_map([name], symbol_from_row)? {
          results.push(row?);
        }
      }
    }
    Ok(results)
  }

  /// All symbols declared in one file, ordered by position.
  pub fn symbols_for_file(&self, file_path: &str) -> Result<Vec<Symbol>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT id, name, kind, file_path, start_line, end_line, signature, visibility, doc
       FROM symbols WHERE file_path = ?1 ORDER BY start_line",
    )?;
    let symbols = stmt
      .query_map([file_path], symbol_from_row)?
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(symbols)
  }

  /// Substring match on name with an optional kind filter.
  pub fn find_symbols(&self, query: &str, kind: Option<SymbolKind>, limit: usize) -> Result<Vec<Symbol>> {
    self.find_symbols_advanced(&SymbolQuery {
      query: query.to_string(),
      kind,
      min_lines: None,
      sort_by: SymbolSort::Name,
      limit,
    })
  }

  /// Substring match with kind/min-line filters and explicit ordering.
  pub fn find_symbols_advanced(&self, query: &SymbolQuery) -> Result<Vec<Symbol>> {
    let conn = self.conn()?;

    let mut sql = String::from(
      "SELECT id, name, kind, file_path, start_line, end_line, signature, visibility, doc
       FROM symbols WHERE 1=1",
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if !query.query.is_empty() {
      sql.push_str(" AND name LIKE ? ESCAPE '\\'");
      params.push(Box::new(format!("%{}%", escape_like(&query.query))));
    }
    if let Some(kind) = query.kind {
      sql.push_str(" AND kind = ?");
      params.push(Box::new(kind.as_str()));
    }
    if let Some(min_lines) = query.min_lines {
      sql.push_str(" AND line_count >= ?");
      params.push(Box::new(min_lines));
    }

    match query.sort_by {
      SymbolSort::Lines => sql.push_str(" ORDER BY line_count DESC, name"),
      SymbolSort::Name => sql.push_str(" ORDER BY name, file_path, start_line"),
    }
    sql.push_str(" LIMIT ?");
    params.push(Box::new(query.limit.max(1) as i64));

    let mut stmt = conn.prepare(&sql)?;
    let symbols = stmt
      .query_map(params_from_iter(params.iter().map(|p| p.as_ref())), symbol_from_row)?
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(symbols)
  }

  /// Map of symbol name to `(id, file_path)` pairs for every symbol in the
  /// index. Used by the indexer's reference-resolution pass.
  pub fn all_symbol_ids_by_name(&self) -> Result<std::collections::HashMap<String, Vec<(String, String)>>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT name, id, file_path FROM symbols")?;
    let mut map: std::collections::HashMap<String, Vec<(String, String)>> = std::collections::HashMap::new();
    let rows = stmt.query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
      ))
    })?;
    for row in rows {
      let (name, id, file_path) = row?;
      map.entry(name).or_default().push((id, file_path));
    }
    Ok(map)
  }
}

fn symbol_from_row(row: &Row) -> rusqlite::Result<Symbol> {
  Ok(Symbol {
    id: row.get(0)?,
    name: row.get(1)?,
    kind: SymbolKind::from_str_tag(&row.get::<_, String>(2)?).unwrap_or(SymbolKind::Function),
    file_path: row.get(3)?,
    start_line: row.get(4)?,
    end_line: row.get(5)?,
    signature: row.get(6)?,
    visibility: Visibility::from_str_tag(&row.get::<_, String>(7)?),
    doc: row.get(8)?,
  })
}

#[cfg(test)]
mod tests {
  use scout_core::symbol_id;
  use tempfile::TempDir;

  use super::*;

  fn test_store() -> (TempDir, Store) {
    let temp = TempDir::new().unwrap();
    let store = Store::open(&temp.path().join("index.db")).unwrap();
    (temp, store)
  }

  fn symbol(name: &str, path: &str, start: u32, end: u32, kind: SymbolKind) -> Symbol {
    Symbol {
      id: symbol_id(path, name, start, name),
      name: name.to_string(),
      kind,
      file_path: path.to_string(),
      start_line: start,
      end_line: end,
      signature: format!("func {name}()"),
      visibility: Visibility::Public,
      doc: None,
    }
  }

  #[test]
  fn test_store_and_find_symbols() {
    let (_temp, store) = test_store();
    store
      .store_symbols(&[
        symbol("HandleLogin", "auth.go", 1, 20, SymbolKind::Function),
        symbol("HandleLogout", "auth.go", 22, 30, SymbolKind::Function),
        symbol("Config", "config.go", 1, 5, SymbolKind::Type),
      ])
      .unwrap();

    let handles = store.find_symbols("Handle", None, 10).unwrap();
    assert_eq!(handles.len(), 2);

    let types = store.find_symbols("", Some(SymbolKind::Type), 10).unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name, "Config");
  }

  #[test]
  fn test_find_symbols_advanced_sort_by_lines() {
    let (_temp, store) = test_store();
    store
      .store_symbols(&[
        symbol("small", "a.go", 1, 2, SymbolKind::Function),
        symbol("large", "a.go", 10, 99, SymbolKind::Function),
        symbol("medium", "a.go", 100, 120, SymbolKind::Function),
      ])
      .unwrap();

    let results = store
      .find_symbols_advanced(&SymbolQuery {
        query: String::new(),
        kind: None,
        min_lines: Some(3),
        sort_by: SymbolSort::Lines,
        limit: 10,
      })
      .unwrap();

    let names: Vec<_> = results.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["large", "medium"], "sorted by descending line count, small filtered");
  }

  #[test]
  fn test_symbols_by_name_disambiguates_by_path() {
    let (_temp, store) = test_store();
    store
      .store_symbols(&[
        symbol("init", "a.go", 1, 3, SymbolKind::Function),
        symbol("init", "b.go", 1, 3, SymbolKind::Function),
      ])
      .unwrap();

    assert_eq!(store.symbols_by_name("init", None).unwrap().len(), 2);
    let only_a = store.symbols_by_name("init", Some("a.go")).unwrap();
    assert_eq!(only_a.len(), 1);
    assert_eq!(only_a[0].file_path, "a.go");
  }

  #[test]
  fn test_like_special_chars_are_literal() {
    let (_temp, store) = test_store();
    store
      .store_symbols(&[
        symbol("do_work", "a.go", 1, 3, SymbolKind::Function),
        symbol("dowork", "a.go", 5, 7, SymbolKind::Function),
      ])
      .unwrap();

    // underscore must not act as a single-char wildcard
    let results = store.find_symbols("do_", None, 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "do_work");
  }
}
