use serde::{Deserialize, Serialize};

use crate::hash::short_hash;

/// A named declaration extracted from one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
  /// `{path}:{name}:{start_line}:{hex8(region)}`. Stable across re-indexing
  /// as long as path, name, start line and the enclosing region content
  /// agree; a modified file mints new identifiers.
  pub id: String,
  pub name: String,
  pub kind: SymbolKind,
  pub file_path: String,
  pub start_line: u32,
  pub end_line: u32,
  /// Declaration line as written, e.g. `pub fn run(cfg: &Config) -> Result<()>`.
  pub signature: String,
  pub visibility: Visibility,
  pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
  Function,
  Method,
  Type,
  Interface,
  Variable,
  Constant,
}

impl SymbolKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SymbolKind::Function => "function",
      SymbolKind::Method => "method",
      SymbolKind::Type => "type",
      SymbolKind::Interface => "interface",
      SymbolKind::Variable => "variable",
      SymbolKind::Constant => "constant",
    }
  }

  pub fn from_str_tag(s: &str) -> Option<Self> {
    match s {
      "function" => Some(SymbolKind::Function),
      "method" => Some(SymbolKind::Method),
      "type" => Some(SymbolKind::Type),
      "interface" => Some(SymbolKind::Interface),
      "variable" => Some(SymbolKind::Variable),
      "constant" => Some(SymbolKind::Constant),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  Public,
  Private,
}

impl Visibility {
  pub fn as_str(&self) -> &'static str {
    match self {
      Visibility::Public => "public",
      Visibility::Private => "private",
    }
  }

  pub fn from_str_tag(s: &str) -> Self {
    if s == "public" { Visibility::Public } else { Visibility::Private }
  }
}

impl Symbol {
  pub fn line_count(&self) -> u32 {
    self.end_line - self.start_line + 1
  }
}

/// Mint a symbol identifier from its location and enclosing region content.
pub fn symbol_id(file_path: &str, name: &str, start_line: u32, region: &str) -> String {
  format!("{}:{}:{}:{}", file_path, name, start_line, short_hash(region.as_bytes()))
}
