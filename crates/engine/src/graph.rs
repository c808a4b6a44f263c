//! Symbol graph services: caller/callee lookups, dead-code candidates and
//! entry-point detection.
//!
//! Reachability runs directly over the stored `refs` rows through indexed
//! lookups; no in-memory graph is materialized. Results are heuristic by
//! design: reflection, dynamic dispatch and external callers are invisible
//! to syntactic extraction, so dead-code output is always labelled
//! candidates.

use std::collections::{HashMap, HashSet};

use db::SymbolQuery;
use scout_core::{EngineError, Reference, ReferenceKind, Symbol, SymbolKind};
use tracing::debug;

use crate::{Engine, store_error};

/// One edge of a caller/callee answer, with the symbol on the far side
/// resolved where possible.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CallEdge {
  /// Name of the symbol on the answering side (the caller for
  /// `callers`, the callee for `callees`).
  pub name: String,
  /// Resolved symbol, absent for external or file-level parties.
  pub symbol: Option<Symbol>,
  pub kind: ReferenceKind,
  pub file_path: String,
  pub line: u32,
  pub is_external: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeadCodeReport {
  /// Function/method symbols unreachable from any root. Candidates only.
  pub candidates: Vec<Symbol>,
  pub roots: usize,
  pub reachable: usize,
}

const SYMBOL_SCAN_LIMIT: usize = 1_000_000;

impl Engine {
  /// Who calls `symbol`? Accepts a symbol id or a name; a file path
  /// disambiguates same-named symbols.
  pub fn callers(&self, symbol: &str, file_path: Option<&str>, limit: usize) -> Result<Vec<CallEdge>, EngineError> {
    let targets = self.resolve_targets(symbol, file_path)?;
    let references = self.store().get_callers(&targets, limit).map_err(store_error)?;
    self.to_edges(references, EdgeSide::From)
  }

  /// What does `symbol` call?
  pub fn callees(&self, symbol: &str, file_path: Option<&str>, limit: usize) -> Result<Vec<CallEdge>, EngineError> {
    let sources = self.resolve_sources(symbol, file_path)?;
    let references = self.store().get_callees(&sources, limit).map_err(store_error)?;
    self.to_edges(references, EdgeSide::To)
  }

  /// Candidate dead code: function/method symbols not reachable over
  /// `call` and `implement` edges from any entry-point, exported-handler
  /// or test-named root.
  pub fn dead_code(&self) -> Result<DeadCodeReport, EngineError> {
    let all = self
      .store()
      .find_symbols("", None, SYMBOL_SCAN_LIMIT)
      .map_err(store_error)?;

    let roots: Vec<&Symbol> = all.iter().filter(|s| self.is_entry_root(s)).collect();
    let mut reached: HashSet<String> = roots.iter().map(|s| s.id.clone()).collect();
    let mut frontier: Vec<String> = reached.iter().cloned().collect();

    // Breadth-first expansion over stored edges, loading only the
    // frontier's outgoing rows each round.
    while !frontier.is_empty() {
      let edges = self
        .store()
        .outgoing_edges(&frontier, &[ReferenceKind::Call, ReferenceKind::Implement])
        .map_err(store_error)?;
      frontier = edges
        .into_iter()
        .filter(|e| !e.is_external)
        .map(|e| e.to_symbol)
        .filter(|id| reached.insert(id.clone()))
        .collect();
    }

    debug!(roots = roots.len(), reachable = reached.len(), "Dead-code reachability complete");

    let candidates: Vec<Symbol> = all
      .iter()
      .filter(|s| matches!(s.kind, SymbolKind::Function | SymbolKind::Method))
      .filter(|s| !reached.contains(&s.id))
      .cloned()
      .collect();

    Ok(DeadCodeReport {
      roots: roots.len(),
      reachable: reached.len(),
      candidates,
    })
  }

  /// Symbols considered roots of the reachability graph.
  pub fn entry_points(&self) -> Result<Vec<Symbol>, EngineError> {
    let all = self
      .store()
      .find_symbols("", None, SYMBOL_SCAN_LIMIT)
      .map_err(store_error)?;
    Ok(all.into_iter().filter(|s| self.is_entry_root(s)).collect())
  }

  /// Root heuristics: language entry points, test conventions and the
  /// configured handler-name patterns.
  fn is_entry_root(&self, symbol: &Symbol) -> bool {
    let name = symbol.name.as_str();
    if name == "main" || name == "Main" || name == "init" {
      return true;
    }
    if is_test_name(name) {
      return true;
    }
    self
      .config()
      .search
      .entry_point_patterns
      .iter()
      .any(|pattern| name.contains(pattern.as_str()))
  }

  /// Map a name-or-id to the reference targets it may appear as: resolved
  /// symbol ids plus the raw name (for edges that stayed external).
  fn resolve_targets(&self, symbol: &str, file_path: Option<&str>) -> Result<Vec<String>, EngineError> {
    let mut targets = Vec::new();
    if self.store().get_symbol(symbol).map_err(store_error)?.is_some() {
      targets.push(symbol.to_string());
      return Ok(targets);
    }

    for matched in self.store().symbols_by_name(symbol, file_path).map_err(store_error)? {
      targets.push(matched.id);
    }
    targets.push(symbol.to_string());
    Ok(targets)
  }

  fn resolve_sources(&self, symbol: &str, file_path: Option<&str>) -> Result<Vec<String>, EngineError> {
    if self.store().get_symbol(symbol).map_err(store_error)?.is_some() {
      return Ok(vec![symbol.to_string()]);
    }
    let matched = self.store().symbols_by_name(symbol, file_path).map_err(store_error)?;
    if matched.is_empty() {
      return Err(
        EngineError::new(scout_core::ErrorKind::NotFound, format!("symbol '{symbol}' not found"))
          .with_context(symbol.to_string()),
      );
    }
    Ok(matched.into_iter().map(|s| s.id).collect())
  }

  fn to_edges(&self, references: Vec<Reference>, side: EdgeSide) -> Result<Vec<CallEdge>, EngineError> {
    let ids: Vec<String> = references
      .iter()
      .map(|r| match side {
        EdgeSide::From => r.from_symbol.clone(),
        EdgeSide::To => r.to_symbol.clone(),
      })
      .collect();

    // One lookup per distinct id
    let mut symbols: HashMap<String, Symbol> = HashMap::new();
    for id in ids.iter().collect::<HashSet<_>>() {
      if let Some(symbol) = self.store().get_symbol(id).map_err(store_error)? {
        symbols.insert(id.clone(), symbol);
      }
    }

    Ok(
      references
        .into_iter()
        .map(|r| {
          let id = match side {
            EdgeSide::From => &r.from_symbol,
            EdgeSide::To => &r.to_symbol,
          };
          let symbol = symbols.get(id).cloned();
          let name = symbol
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| approx_name(id));
          CallEdge {
            name,
            symbol,
            kind: r.kind,
            file_path: r.file_path,
            line: r.line,
            is_external: r.is_external,
          }
        })
        .collect(),
    )
  }
}

enum EdgeSide {
  From,
  To,
}

/// Test-convention names that root the reachability graph.
///
/// Go-style prefixes require the next character to be non-lowercase
/// (`TestFoo` is a test, `Tester` is not), matching the toolchain's rule.
fn is_test_name(name: &str) -> bool {
  if name.starts_with("test_") {
    return true;
  }
  for prefix in ["Test", "Benchmark", "Example", "Fuzz"] {
    if let Some(rest) = name.strip_prefix(prefix)
      && !rest.chars().next().is_some_and(|c| c.is_lowercase())
    {
      return true;
    }
  }
  false
}

/// Best-effort display name for an unresolved party: the middle of a
/// `path:name:line` fallback id, or the raw string.
fn approx_name(id: &str) -> String {
  let mut parts = id.rsplitn(3, ':');
  let last = parts.next();
  let middle = parts.next();
  match (middle, parts.next()) {
    (Some(name), Some(_)) if last.is_some_and(|l| l.parse::<u32>().is_ok() || l.len() == 8) => name.to_string(),
    _ => id.to_string(),
  }
}

/// Symbol lookup passthrough used by the protocol surface.
impl Engine {
  pub fn find_symbols(&self, query: &SymbolQuery) -> Result<Vec<Symbol>, EngineError> {
    self.store().find_symbols_advanced(query).map_err(store_error)
  }
}
