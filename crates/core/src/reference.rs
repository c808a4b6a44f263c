use serde::{Deserialize, Serialize};

use crate::hash::short_hash16;

/// A directed edge between symbols.
///
/// Extraction is syntactic and best-effort: when the target cannot be
/// resolved to a symbol in this index, the edge carries the raw name and
/// `is_external` is set. Consumers must treat the graph as incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
  pub id: String,
  /// Symbol id of the caller, or `{path}:{name}:{line}` when no enclosing
  /// symbol is known.
  pub from_symbol: String,
  /// Symbol id, or an external name string.
  pub to_symbol: String,
  pub kind: ReferenceKind,
  pub file_path: String,
  pub line: u32,
  pub is_external: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
  Call,
  TypeUse,
  Import,
  Implement,
}

impl ReferenceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReferenceKind::Call => "call",
      ReferenceKind::TypeUse => "type_use",
      ReferenceKind::Import => "import",
      ReferenceKind::Implement => "implement",
    }
  }

  pub fn from_str_tag(s: &str) -> Self {
    match s {
      "type_use" => ReferenceKind::TypeUse,
      "import" => ReferenceKind::Import,
      "implement" => ReferenceKind::Implement,
      _ => ReferenceKind::Call,
    }
  }
}

impl Reference {
  pub fn new(
    from_symbol: String,
    to_symbol: String,
    kind: ReferenceKind,
    file_path: &str,
    line: u32,
    is_external: bool,
  ) -> Self {
    Self {
      id: reference_id(&from_symbol, &to_symbol, kind, file_path, line),
      from_symbol,
      to_symbol,
      kind,
      file_path: file_path.to_string(),
      line,
      is_external,
    }
  }
}

/// Deterministic reference identifier.
///
/// Digesting the full edge tuple keeps two indexing passes over an unchanged
/// repository byte-identical.
pub fn reference_id(from: &str, to: &str, kind: ReferenceKind, file_path: &str, line: u32) -> String {
  let payload = format!("{}|{}|{}|{}|{}", from, to, kind.as_str(), file_path, line);
  short_hash16(payload.as_bytes())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reference_id_deterministic() {
    let a = reference_id("a.go:main:1:ab", "LoadConfig", ReferenceKind::Call, "a.go", 3);
    let b = reference_id("a.go:main:1:ab", "LoadConfig", ReferenceKind::Call, "a.go", 3);
    assert_eq!(a, b);
    assert_eq!(a.len(), 16);
  }

  #[test]
  fn test_reference_id_varies_by_kind_and_line() {
    let call = reference_id("f", "g", ReferenceKind::Call, "a.go", 3);
    let ty = reference_id("f", "g", ReferenceKind::TypeUse, "a.go", 3);
    let other_line = reference_id("f", "g", ReferenceKind::Call, "a.go", 4);
    assert_ne!(call, ty);
    assert_ne!(call, other_line);
  }

  #[test]
  fn test_kind_round_trip() {
    for kind in [
      ReferenceKind::Call,
      ReferenceKind::TypeUse,
      ReferenceKind::Import,
      ReferenceKind::Implement,
    ] {
      assert_eq!(ReferenceKind::from_str_tag(kind.as_str()), kind);
    }
  }
}
