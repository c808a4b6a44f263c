//! Reference table operations.
//!
//! Caller/callee lookups and the edge loads used by dead-code reachability
//! run over indexed columns; no in-memory graph is materialized.

use rusqlite::{Row, params_from_iter};
use scout_core::{Reference, ReferenceKind};

use crate::store::{Result, Store};

impl Store {
  /// Transactional upsert keyed by reference id.
  #[tracing::instrument(level = "trace", skip(self, batch), fields(batch_size = batch.len()))]
  pub fn store_references(&self, batch: &[Reference]) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    crate::chunks::insert_references(&tx, batch)?;
    tx.commit()?;
    Ok(())
  }

  /// References whose target matches any of `targets` (symbol ids or
  /// external names). Indexed lookup on `to_symbol`.
  pub fn get_callers(&self, targets: &[String], limit: usize) -> Result<Vec<Reference>> {
    self.refs_matching("to_symbol", targets, &[ReferenceKind::Call], limit)
  }

  /// Call references originating from any of `sources` (symbol ids or
  /// `path:name:line` fallbacks). Indexed lookup on `from_symbol`.
  pub fn get_callees(&self, sources: &[String], limit: usize) -> Result<Vec<Reference>> {
    self.refs_matching("from_symbol", sources, &[ReferenceKind::Call], limit)
  }

  /// Outgoing edges of the given kinds from a frontier of symbols.
  /// Used by breadth-first reachability expansion.
  pub fn outgoing_edges(&self, sources: &[String], kinds: &[ReferenceKind]) -> Result<Vec<Reference>> {
    self.refs_matching("from_symbol", sources, kinds, usize::MAX)
  }

  /// Incoming edges of the given kinds into a set of targets.
  pub fn incoming_edges(&self, targets: &[String], kinds: &[ReferenceKind]) -> Result<Vec<Reference>> {
    self.refs_matching("to_symbol", targets, kinds, usize::MAX)
  }

  /// All references extracted from one file.
  pub fn references_for_file(&self, file_path: &str) -> Result<Vec<Reference>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT id, from_symbol, to_symbol, kind, file_path, line, is_external
       FROM refs WHERE file_path = ?1 ORDER BY line",
    )?;
    let refs = stmt
      .query_map([file_path], reference_from_row)?
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(refs)
  }

  fn refs_matching(
    &self,
    column: &str,
    values: &[String],
    kinds: &[ReferenceKind],
    limit: usize,
  ) -> Result<Vec<Reference>> {
    if values.is_empty() || kinds.is_empty() {
      return Ok(Vec::new());
    }

    let conn = self.conn()?;
    let value_marks: Vec<&str> = values.iter().map(|_| "?").collect();
    let kind_marks: Vec<&str> = kinds.iter().map(|_| "?").collect();
    let sql = format!(
      "SELECT id, from_symbol, to_symbol, kind, file_path, line, is_external
       FROM refs WHERE {} IN ({}) AND kind IN ({}) ORDER BY file_path, line LIMIT {}",
      column,
      value_marks.join(","),
      kind_marks.join(","),
      limit.min(i64::MAX as usize) as i64,
    );

    let mut params: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(values.len() + kinds.len());
    for value in values {
      params.push(value);
    }
    let kind_tags: Vec<&'static str> = kinds.iter().map(|k| k.as_str()).collect();
    for tag in &kind_tags {
      params.push(tag);
    }

    let mut stmt = conn.prepare(&sql)?;
    let refs = stmt
      .query_map(params_from_iter(params), reference_from_row)?
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(refs)
  }
}

fn reference_from_row(row: &Row) -> rusqlite::Result<Reference> {
  Ok(Reference {
    id: row.get(0)?,
    from_symbol: row.get(1)?,
    to_symbol: row.get(2)?,
    kind: ReferenceKind::from_str_tag(&row.get::<_, String>(3)?),
    file_path: row.get(4)?,
    line: row.get(5)?,
    is_external: row.get(6)?,
  })
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

  fn call(from: &str, to: &str, line: u32) -> Reference {
    Reference::new(from.to_string(), to.to_string(), ReferenceKind::Call, "a.go", line, false)
  }

  #[test]
  fn test_callers_and_callees_are_inverses() {
    let (_temp, store) = test_store();
    store
      .store_references(&[
        call("main-id", "LoadConfig-id", 3),
        call("main-id", "Initialize-id", 4),
        call("Initialize-id", "setupLogging-id", 10),
      ])
      .unwrap();

    let callers = store.get_callers(&["setupLogging-id".to_string()], 10).unwrap();
    assert_eq!(callers.len(), 1);
    assert_eq!(callers[0].from_symbol, "Initialize-id");

    let callees = store.get_callees(&["main-id".to_string()], 10).unwrap();
    let targets: Vec<_> = callees.iter().map(|r| r.to_symbol.as_str()).collect();
    assert!(targets.contains(&"LoadConfig-id"));
    assert!(targets.contains(&"Initialize-id"));

    // inverse property: s' in callees(s) <=> s in callers(s')
    for callee in &callees {
      let back = store.get_callers(&[callee.to_symbol.clone()], 10).unwrap();
      assert!(back.iter().any(|r| r.from_symbol == "main-id"));
    }

    assert!(store.get_callers(&["main-id".to_string()], 10).unwrap().is_empty());
  }

  #[test]
  fn test_edge_kind_filtering() {
    let (_temp, store) = test_store();
    store
      .store_references(&[
        call("f-id", "g-id", 1),
        Reference::new(
          "f-id".to_string(),
          "Config-id".to_string(),
          ReferenceKind::TypeUse,
          "a.go",
          2,
          false,
        ),
      ])
      .unwrap();

    let calls = store
      .outgoing_edges(&["f-id".to_string()], &[ReferenceKind::Call])
      .unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to_symbol, "g-id");

    let both = store
      .outgoing_edges(&["f-id".to_string()], &[ReferenceKind::Call, ReferenceKind::TypeUse])
      .unwrap();
    assert_eq!(both.len(), 2);
  }

  #[test]
  fn test_upsert_is_idempotent() {
    let (_temp, store) = test_store();
    let edge = call("f-id", "g-id", 1);
    store.store_references(&[edge.clone()]).unwrap();
    store.store_references(&[edge]).unwrap();

    let refs = store.references_for_file("a.go").unwrap();
    assert_eq!(refs.len(), 1, "deterministic ids deduplicate reinserts");
  }
}
