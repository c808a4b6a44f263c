//! Typed request/response surface.
//!
//! Every request is validated before it touches the store (missing required
//! fields answer `invalid_request` with the field name); every response is
//! either a typed result or an [`EngineError`] record. The surface is
//! stateless across requests apart from the long-lived store handle.

use scout_core::{EngineError, IndexStats, Symbol, SymbolKind};
use serde::{Deserialize, Serialize};

use crate::{
  ComplexityReport, DeadCodeReport, Engine, FileSummary, SearchRequest, SearchResponse,
  graph::CallEdge,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
  Index(IndexRequest),
  Search(SearchRequest),
  Callers(SymbolEdgeRequest),
  Callees(SymbolEdgeRequest),
  FindSymbols(FindSymbolsRequest),
  DeadCode,
  EntryPoints,
  Complexity(FileRequest),
  FileSummary(FileRequest),
  Stats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRequest {
  pub force: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolEdgeRequest {
  pub symbol: String,
  pub file_path: Option<String>,
  pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FindSymbolsRequest {
  pub query: String,
  pub kind: Option<String>,
  pub min_lines: Option<u32>,
  /// "lines" (descending line count) or "name" (ascending).
  pub sort_by: Option<String>,
  pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRequest {
  pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", content = "data", rename_all = "snake_case")]
pub enum Response {
  Indexed(IndexStats),
  Search(SearchResponse),
  Edges(Vec<CallEdge>),
  Symbols(Vec<Symbol>),
  DeadCode(DeadCodeReport),
  Complexity(ComplexityReport),
  FileSummary(FileSummary),
  Stats(StatsResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
  pub files: u64,
  pub chunks: u64,
  pub symbols: u64,
  pub references: u64,
  pub index_size_bytes: u64,
  pub dimensions: usize,
  pub embedding_model: String,
}

const DEFAULT_EDGE_LIMIT: usize = 50;
const DEFAULT_SYMBOL_LIMIT: usize = 50;

impl Engine {
  /// Dispatch one typed request.
  pub async fn handle(&self, request: Request) -> Result<Response, EngineError> {
    match request {
      Request::Index(req) => {
        let options = index::IndexOptions {
          force: req.force,
          ..Default::default()
        };
        let stats = self.index(&options, None).await?;
        Ok(Response::Indexed(stats))
      }
      Request::Search(req) => Ok(Response::Search(self.search(&req).await?)),
      Request::Callers(req) => {
        let symbol = required(&req.symbol, "symbol")?;
        let edges = self.callers(symbol, req.file_path.as_deref(), req.limit.unwrap_or(DEFAULT_EDGE_LIMIT))?;
        Ok(Response::Edges(edges))
      }
      Request::Callees(req) => {
        let symbol = required(&req.symbol, "symbol")?;
        let edges = self.callees(symbol, req.file_path.as_deref(), req.limit.unwrap_or(DEFAULT_EDGE_LIMIT))?;
        Ok(Response::Edges(edges))
      }
      Request::FindSymbols(req) => {
        let kind = match req.kind.as_deref() {
          None | Some("") => None,
          Some(tag) => Some(SymbolKind::from_str_tag(tag).ok_or_else(|| {
            EngineError::new(
              scout_core::ErrorKind::InvalidRequest,
              format!("unknown symbol kind '{tag}'"),
            )
            .with_context("kind")
          })?),
        };
        let symbols = self.find_symbols(&db::SymbolQuery {
          query: req.query.clone(),
          kind,
          min_lines: req.min_lines,
          sort_by: db::SymbolSort::from_str_tag(req.sort_by.as_deref().unwrap_or("name")),
          limit: req.limit.unwrap_or(DEFAULT_SYMBOL_LIMIT),
        })?;
        Ok(Response::Symbols(symbols))
      }
      Request::DeadCode => Ok(Response::DeadCode(self.dead_code()?)),
      Request::EntryPoints => Ok(Response::Symbols(self.entry_points()?)),
      Request::Complexity(req) => {
        let file_path = required(&req.file_path, "file_path")?;
        Ok(Response::Complexity(self.complexity(file_path)?))
      }
      Request::FileSummary(req) => {
        let file_path = required(&req.file_path, "file_path")?;
        Ok(Response::FileSummary(self.file_summary(file_path)?))
      }
      Request::Stats => {
        let stats = self.stats()?;
        let meta = self.metadata()?;
        Ok(Response::Stats(StatsResponse {
          files: stats.files,
          chunks: stats.chunks,
          symbols: stats.symbols,
          references: stats.references,
          index_size_bytes: stats.index_size_bytes,
          dimensions: meta.as_ref().map(|m| m.dimensions).unwrap_or(0),
          embedding_model: meta.map(|m| m.embedding_model).unwrap_or_default(),
        }))
      }
    }
  }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, EngineError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(EngineError::invalid_request(field));
  }
  Ok(trimmed)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_required_field_validation() {
    assert!(required("main", "symbol").is_ok());
    let err = required("  ", "symbol").unwrap_err();
    assert_eq!(err.kind, scout_core::ErrorKind::InvalidRequest);
    assert_eq!(err.context.as_deref(), Some("symbol"));
  }

  #[test]
  fn test_request_wire_shape() {
    let json = r#"{"op":"callers","symbol":"setupLogging","limit":5}"#;
    let request: Request = serde_json::from_str(json).unwrap();
    match request {
      Request::Callers(req) => {
        assert_eq!(req.symbol, "setupLogging");
        assert_eq!(req.limit, Some(5));
        assert!(req.file_path.is_none());
      }
      other => panic!("unexpected request: {other:?}"),
    }
  }

  #[test]
  fn test_unit_requests_parse() {
    let request: Request = serde_json::from_str(r#"{"op":"dead_code"}"#).unwrap();
    assert!(matches!(request, Request::DeadCode));
    let request: Request = serde_json::from_str(r#"{"op":"stats"}"#).unwrap();
    assert!(matches!(request, Request::Stats));
  }
}
