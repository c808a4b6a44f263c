use serde::{Deserialize, Serialize};

/// Canonical language tag for a source file.
///
/// Detection is a pure function of the file path (lowercase extension plus a
/// few basename overrides). Unknown files map to [`Language::Text`] and are
/// chunked line-by-line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  TypeScript,
  JavaScript,
  Tsx,
  Jsx,
  Rust,
  Python,
  Go,
  Java,
  Kotlin,
  Scala,
  CSharp,
  Cpp,
  C,
  Swift,
  Ruby,
  Php,
  Lua,
  Zig,
  Html,
  Css,
  Json,
  Yaml,
  Toml,
  Markdown,
  Shell,
  Sql,
  Dockerfile,
  Makefile,
  Proto,
  Text,
}

impl Language {
  pub fn from_extension(ext: &str) -> Option<Self> {
    match ext.to_lowercase().as_str() {
      "ts" | "mts" | "cts" => Some(Language::TypeScript),
      "js" | "mjs" | "cjs" => Some(Language::JavaScript),
      "tsx" => Some(Language::Tsx),
      "jsx" => Some(Language::Jsx),
      "rs" => Some(Language::Rust),
      "py" | "pyi" | "pyw" => Some(Language::Python),
      "go" => Some(Language::Go),
      "java" => Some(Language::Java),
      "kt" | "kts" => Some(Language::Kotlin),
      "scala" | "sc" => Some(Language::Scala),
      "cs" => Some(Language::CSharp),
      "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Some(Language::Cpp),
      "c" | "h" => Some(Language::C),
      "swift" => Some(Language::Swift),
      "rb" | "rake" => Some(Language::Ruby),
      "php" => Some(Language::Php),
      "lua" => Some(Language::Lua),
      "zig" => Some(Language::Zig),
      "html" | "htm" => Some(Language::Html),
      "css" | "scss" | "sass" | "less" => Some(Language::Css),
      "json" | "jsonc" => Some(Language::Json),
      "yaml" | "yml" => Some(Language::Yaml),
      "toml" => Some(Language::Toml),
      "md" | "markdown" => Some(Language::Markdown),
      "sh" | "bash" | "zsh" | "fish" => Some(Language::Shell),
      "sql" => Some(Language::Sql),
      "proto" => Some(Language::Proto),
      _ => None,
    }
  }

  /// Detect the language from a file path.
  ///
  /// Checks basename overrides first (`Dockerfile`, `Makefile`), then the
  /// lowercase extension. Unknown paths return [`Language::Text`].
  pub fn from_path(path: &str) -> Self {
    let basename = path.rsplit(['/', '\\']).next().unwrap_or(path).to_lowercase();
    match basename.as_str() {
      "dockerfile" | "containerfile" => return Language::Dockerfile,
      "makefile" | "gnumakefile" => return Language::Makefile,
      _ => {}
    }

    basename
      .rsplit_once('.')
      .and_then(|(_, ext)| Self::from_extension(ext))
      .unwrap_or(Language::Text)
  }

  /// Best-effort detection from content for extension-less files.
  ///
  /// Only looks at the shebang line. Returns `None` when nothing matches;
  /// callers treat the file as [`Language::Text`].
  pub fn from_content(bytes: &[u8]) -> Option<Self> {
    let first_line = bytes.split(|&b| b == b'\n').next()?;
    let line = std::str::from_utf8(first_line).ok()?;
    if !line.starts_with("#!") {
      return None;
    }

    let interpreter = line
      .trim_start_matches("#!")
      .split_whitespace()
      .flat_map(|w| w.rsplit('/').next())
      .find(|w| *w != "env")?;

    match interpreter {
      i if i.starts_with("python") => Some(Language::Python),
      i if i.starts_with("node") => Some(Language::JavaScript),
      i if i.starts_with("ruby") => Some(Language::Ruby),
      "sh" | "bash" | "zsh" | "fish" | "dash" => Some(Language::Shell),
      _ => None,
    }
  }

  /// The lowercase name of this language as stored in the DB.
  pub fn as_str(&self) -> &'static str {
    match self {
      Language::TypeScript => "typescript",
      Language::JavaScript => "javascript",
      Language::Tsx => "tsx",
      Language::Jsx => "jsx",
      Language::Rust => "rust",
      Language::Python => "python",
      Language::Go => "go",
      Language::Java => "java",
      Language::Kotlin => "kotlin",
      Language::Scala => "scala",
      Language::CSharp => "csharp",
      Language::Cpp => "cpp",
      Language::C => "c",
      Language::Swift => "swift",
      Language::Ruby => "ruby",
      Language::Php => "php",
      Language::Lua => "lua",
      Language::Zig => "zig",
      Language::Html => "html",
      Language::Css => "css",
      Language::Json => "json",
      Language::Yaml => "yaml",
      Language::Toml => "toml",
      Language::Markdown => "markdown",
      Language::Shell => "shell",
      Language::Sql => "sql",
      Language::Dockerfile => "dockerfile",
      Language::Makefile => "makefile",
      Language::Proto => "proto",
      Language::Text => "text",
    }
  }

  pub fn from_str_tag(s: &str) -> Self {
    match s {
      "typescript" => Language::TypeScript,
      "javascript" => Language::JavaScript,
      "tsx" => Language::Tsx,
      "jsx" => Language::Jsx,
      "rust" => Language::Rust,
      "python" => Language::Python,
      "go" => Language::Go,
      "java" => Language::Java,
      "kotlin" => Language::Kotlin,
      "scala" => Language::Scala,
      "csharp" => Language::CSharp,
      "cpp" => Language::Cpp,
      "c" => Language::C,
      "swift" => Language::Swift,
      "ruby" => Language::Ruby,
      "php" => Language::Php,
      "lua" => Language::Lua,
      "zig" => Language::Zig,
      "html" => Language::Html,
      "css" => Language::Css,
      "json" => Language::Json,
      "yaml" => Language::Yaml,
      "toml" => Language::Toml,
      "markdown" => Language::Markdown,
      "shell" => Language::Shell,
      "sql" => Language::Sql,
      "dockerfile" => Language::Dockerfile,
      "makefile" => Language::Makefile,
      "proto" => Language::Proto,
      _ => Language::Text,
    }
  }

  /// Whether a tree-sitter grammar is compiled in for this language.
  pub fn supports_ast(&self) -> bool {
    matches!(
      self,
      Language::Rust
        | Language::Python
        | Language::JavaScript
        | Language::Jsx
        | Language::TypeScript
        | Language::Tsx
        | Language::Go
        | Language::Java
        | Language::C
        | Language::Cpp
    )
  }

  /// Line prefixes that start a new declaration, used by the line-based
  /// chunker to cut at sensible boundaries.
  pub fn definition_prefixes(&self) -> &'static [&'static str] {
    match self {
      Language::Rust => &["fn ", "pub fn ", "struct ", "pub struct ", "enum ", "pub enum ", "impl ", "trait ", "pub trait ", "mod ", "pub mod "],
      Language::Python => &["def ", "async def ", "class "],
      Language::Go => &["func ", "type "],
      Language::TypeScript | Language::JavaScript | Language::Tsx | Language::Jsx => {
        &["function ", "async function ", "export function ", "export async function ", "class ", "export class ", "interface ", "export interface "]
      }
      Language::Java | Language::CSharp | Language::Kotlin | Language::Scala => {
        &["public ", "private ", "protected ", "class ", "interface ", "enum "]
      }
      Language::Ruby => &["def ", "class ", "module "],
      Language::Php => &["function ", "class ", "interface ", "trait "],
      Language::C | Language::Cpp => &["static ", "void ", "int ", "struct ", "class ", "namespace "],
      Language::Shell => &["function "],
      _ => &[],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_path_extension() {
    assert_eq!(Language::from_path("src/main.rs"), Language::Rust);
    assert_eq!(Language::from_path("a/b/handler.go"), Language::Go);
    assert_eq!(Language::from_path("App.TSX"), Language::Tsx);
    assert_eq!(Language::from_path("script.py"), Language::Python);
  }

  #[test]
  fn test_from_path_basename_overrides() {
    assert_eq!(Language::from_path("deploy/Dockerfile"), Language::Dockerfile);
    assert_eq!(Language::from_path("Makefile"), Language::Makefile);
  }

  #[test]
  fn test_from_path_unknown_is_text() {
    assert_eq!(Language::from_path("README"), Language::Text);
    assert_eq!(Language::from_path("data.xyz123"), Language::Text);
  }

  #[test]
  fn test_from_content_shebang() {
    assert_eq!(
      Language::from_content(b"#!/usr/bin/env python3\nprint('hi')"),
      Some(Language::Python)
    );
    assert_eq!(Language::from_content(b"#!/bin/bash\necho hi"), Some(Language::Shell));
    assert_eq!(Language::from_content(b"no shebang here"), None);
  }

  #[test]
  fn test_tag_round_trip() {
    for lang in [Language::Rust, Language::Go, Language::Tsx, Language::Text, Language::Dockerfile] {
      assert_eq!(Language::from_str_tag(lang.as_str()), lang);
    }
  }

  #[test]
  fn test_supports_ast_tiers() {
    assert!(Language::Go.supports_ast());
    assert!(Language::Python.supports_ast());
    assert!(!Language::Markdown.supports_ast());
    assert!(!Language::Text.supports_ast());
  }
}
