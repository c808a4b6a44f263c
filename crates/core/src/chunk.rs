use serde::{Deserialize, Serialize};

use crate::{hash::short_hash, language::Language};

/// A contiguous region of one file: the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
  /// `{path}:{start_line}:{hex8}` where hex8 is the first 8 hex chars of
  /// sha256(content). Unique within one index.
  pub id: String,
  pub file_path: String,
  pub language: Language,
  pub kind: ChunkKind,
  /// Innermost enclosing declaration name, when known.
  pub name: Option<String>,
  /// Outer enclosing declaration name (e.g. the class of a method).
  pub parent_name: Option<String>,
  /// 1-based, inclusive.
  pub start_line: u32,
  /// 1-based, inclusive. Always >= start_line.
  pub end_line: u32,
  /// Full sha256 hex of `content`.
  pub hash: String,
  pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
  Function,
  Class,
  Method,
  Block,
  File,
}

impl ChunkKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChunkKind::Function => "function",
      ChunkKind::Class => "class",
      ChunkKind::Method => "method",
      ChunkKind::Block => "block",
      ChunkKind::File => "file",
    }
  }

  pub fn from_str_tag(s: &str) -> Self {
    match s {
      "function" => ChunkKind::Function,
      "class" => ChunkKind::Class,
      "method" => ChunkKind::Method,
      "file" => ChunkKind::File,
      _ => ChunkKind::Block,
    }
  }
}

impl Chunk {
  /// Build a chunk, minting its identifier and content hash.
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    file_path: &str,
    language: Language,
    kind: ChunkKind,
    name: Option<String>,
    parent_name: Option<String>,
    start_line: u32,
    end_line: u32,
    content: String,
  ) -> Self {
    Self {
      id: chunk_id(file_path, start_line, &content),
      hash: crate::hash::content_hash(content.as_bytes()),
      file_path: file_path.to_string(),
      language,
      kind,
      name,
      parent_name,
      start_line,
      end_line,
      content,
    }
  }

  pub fn line_count(&self) -> u32 {
    self.end_line - self.start_line + 1
  }
}

/// Mint a chunk identifier: `{path}:{start_line}:{hex8(sha256(content))}`.
pub fn chunk_id(file_path: &str, start_line: u32, content: &str) -> String {
  format!("{}:{}:{}", file_path, start_line, short_hash(content.as_bytes()))
}

/// Parse a chunk identifier back into `(path, start_line, hex8)`.
///
/// The path may itself contain colons, so the id is split from the right.
pub fn parse_chunk_id(id: &str) -> Option<(&str, u32, &str)> {
  let (rest, hex8) = id.rsplit_once(':')?;
  let (path, line) = rest.rsplit_once(':')?;
  if hex8.len() != 8 || !hex8.bytes().all(|b| b.is_ascii_hexdigit()) {
    return None;
  }
  let start_line: u32 = line.parse().ok()?;
  Some((path, start_line, hex8))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_chunk_id_format() {
    let id = chunk_id("src/main.rs", 10, "fn main() {}");
    let (path, line, hex8) = parse_chunk_id(&id).unwrap();
    assert_eq!(path, "src/main.rs");
    assert_eq!(line, 10);
    assert_eq!(hex8, &crate::hash::short_hash(b"fn main() {}"));
  }

  #[test]
  fn test_parse_chunk_id_with_colons_in_path() {
    let id = chunk_id("C:/repo/src/a.go", 3, "func A() {}");
    let (path, line, _) = parse_chunk_id(&id).unwrap();
    assert_eq!(path, "C:/repo/src/a.go");
    assert_eq!(line, 3);
  }

  #[test]
  fn test_parse_chunk_id_rejects_garbage() {
    assert!(parse_chunk_id("not an id").is_none());
    assert!(parse_chunk_id("path:notaline:deadbeef").is_none());
    assert!(parse_chunk_id("path:1:nothex!z").is_none());
  }

  #[test]
  fn test_new_sets_hash_consistent_with_content() {
    let chunk = Chunk::new(
      "a.rs",
      Language::Rust,
      ChunkKind::Function,
      Some("main".to_string()),
      None,
      1,
      3,
      "fn main() {\n    run();\n}".to_string(),
    );
    assert_eq!(chunk.hash, crate::hash::content_hash(chunk.content.as_bytes()));
    assert!(chunk.id.ends_with(&chunk.hash[..8]));
    assert_eq!(chunk.line_count(), 3);
  }

  #[test]
  fn test_same_content_same_line_same_id() {
    let a = chunk_id("x.py", 5, "def f():\n    pass");
    let b = chunk_id("x.py", 5, "def f():\n    pass");
    assert_eq!(a, b);
    let c = chunk_id("x.py", 5, "def f():\n    return 1");
    assert_ne!(a, c);
  }
}
