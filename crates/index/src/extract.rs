//! Symbol and reference extraction.
//!
//! Converts parser output into stored [`Symbol`]s and [`Reference`]s.
//! Reference targets are left as raw names here; the indexer resolves them
//! against the full symbol set before commit and flags what it cannot
//! resolve as external. Extraction is syntactic and best-effort.

use parser::{Definition, DefinitionKind, SourceParser};
use scout_core::{Language, Reference, ReferenceKind, Symbol, SymbolKind, Visibility, symbol_id};

use crate::scanner::SourceFile;

/// Extraction result for one file. Reference `to_symbol` fields hold raw
/// names until the indexer's resolution pass.
#[derive(Debug, Default)]
pub struct Extraction {
  pub symbols: Vec<Symbol>,
  pub references: Vec<Reference>,
}

/// Extract symbols and raw references from one file.
pub fn extract_file(parser: &mut SourceParser, file: &SourceFile) -> Extraction {
  if !file.language.supports_ast() {
    return Extraction::default();
  }

  let lines: Vec<&str> = file.content.lines().collect();
  let definitions = parser.extract_definitions(&file.content, file.language);

  let symbols: Vec<Symbol> = definitions.iter().map(|def| build_symbol(file, &lines, def)).collect();

  let mut references = Vec::new();

  for call in parser.extract_calls(&file.content, file.language) {
    let from = enclosing_symbol(&definitions, &symbols, file, call.line);
    // A declaration's own name shows up as a call site in some grammars
    // (e.g. decorated defs); skip self edges.
    if let Some(def) = innermost(&definitions, call.line)
      && def.name == call.name
      && def.start_line == call.line
    {
      continue;
    }
    references.push(Reference::new(
      from,
      call.name,
      ReferenceKind::Call,
      &file.relative,
      call.line,
      true,
    ));
  }

  for type_use in parser.extract_type_uses(&file.content, file.language) {
    let from = enclosing_symbol(&definitions, &symbols, file, type_use.line);
    references.push(Reference::new(
      from,
      type_use.name,
      ReferenceKind::TypeUse,
      &file.relative,
      type_use.line,
      true,
    ));
  }

  for import in parser.extract_imports(&file.content, file.language) {
    let from = enclosing_symbol(&definitions, &symbols, file, import.line);
    references.push(Reference::new(
      from,
      import.target,
      ReferenceKind::Import,
      &file.relative,
      import.line,
      true,
    ));
  }

  for implement in parser.extract_implements(&file.content, file.language) {
    // The implementing type is the source of the edge.
    let from = symbols
      .iter()
      .find(|s| s.name == implement.type_name)
      .map(|s| s.id.clone())
      .unwrap_or_else(|| fallback_caller(file, &implement.type_name, implement.line));
    references.push(Reference::new(
      from,
      implement.trait_name,
      ReferenceKind::Implement,
      &file.relative,
      implement.line,
      true,
    ));
  }

  // Same (from, to, kind, line) extracted twice collapses to one edge.
  references.sort_by(|a, b| a.id.cmp(&b.id));
  references.dedup_by(|a, b| a.id == b.id);
  references.sort_by_key(|r| r.line);

  Extraction { symbols, references }
}

fn build_symbol(file: &SourceFile, lines: &[&str], def: &Definition) -> Symbol {
  let end = def.end_line.min(lines.len() as u32).max(def.start_line);
  let region = lines[(def.start_line - 1) as usize..end as usize].join("\n");
  let signature = lines
    .get((def.start_line - 1) as usize)
    .map(|l| l.trim().to_string())
    .unwrap_or_default();
  let doc = doc_comment(lines, def.start_line, file.language);

  Symbol {
    id: symbol_id(&file.relative, &def.name, def.start_line, &region),
    name: def.name.clone(),
    kind: symbol_kind_for(def.kind),
    file_path: file.relative.clone(),
    start_line: def.start_line,
    end_line: end,
    signature,
    visibility: visibility_of(&def.name, lines, def.start_line, file.language),
    doc,
  }
}

fn symbol_kind_for(kind: DefinitionKind) -> SymbolKind {
  match kind {
    DefinitionKind::Function => SymbolKind::Function,
    DefinitionKind::Method => SymbolKind::Method,
    DefinitionKind::Interface | DefinitionKind::Trait => SymbolKind::Interface,
    DefinitionKind::Const => SymbolKind::Constant,
    DefinitionKind::Class | DefinitionKind::Struct | DefinitionKind::Enum | DefinitionKind::Type | DefinitionKind::Module => {
      SymbolKind::Type
    }
  }
}

/// Visibility per the language's convention.
///
/// Explicit keywords win; Go uses leading case; a leading underscore
/// inverts to private in languages that follow that convention.
fn visibility_of(name: &str, lines: &[&str], start_line: u32, language: Language) -> Visibility {
  let signature = lines.get((start_line - 1) as usize).map(|l| l.trim()).unwrap_or("");

  match language {
    Language::Go => {
      if name.chars().next().is_some_and(|c| c.is_uppercase()) {
        Visibility::Public
      } else {
        Visibility::Private
      }
    }
    Language::Python => {
      if name.starts_with('_') {
        Visibility::Private
      } else {
        Visibility::Public
      }
    }
    Language::Rust => {
      if signature.starts_with("pub") {
        Visibility::Public
      } else {
        Visibility::Private
      }
    }
    Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => {
      if signature.contains("private ") || name.starts_with('_') {
        Visibility::Private
      } else {
        Visibility::Public
      }
    }
    Language::Java | Language::CSharp | Language::Kotlin | Language::Scala => {
      if signature.contains("private ") || signature.contains("protected ") {
        Visibility::Private
      } else {
        Visibility::Public
      }
    }
    _ => {
      if name.starts_with('_') {
        Visibility::Private
      } else {
        Visibility::Public
      }
    }
  }
}

/// Comment block directly above a declaration, when present.
fn doc_comment(lines: &[&str], start_line: u32, language: Language) -> Option<String> {
  if start_line <= 1 {
    return None;
  }

  let mut doc_lines: Vec<&str> = Vec::new();
  let mut i = (start_line - 2) as usize;

  loop {
    let line = lines.get(i)?.trim();
    let is_doc = match language {
      Language::Rust => line.starts_with("///") || line.starts_with("//!"),
      Language::Python => line.starts_with('#'),
      Language::Go | Language::C | Language::Cpp => line.starts_with("//"),
      Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx | Language::Java => {
        line.starts_with("/**") || line.starts_with('*') || line.starts_with("//")
      }
      _ => line.starts_with("//") || line.starts_with('#'),
    };

    if is_doc {
      doc_lines.push(lines[i]);
    } else {
      break;
    }
    if i == 0 {
      break;
    }
    i -= 1;
  }

  if doc_lines.is_empty() {
    return None;
  }
  doc_lines.reverse();
  Some(doc_lines.join("\n").trim().to_string())
}

/// The innermost definition whose range contains `line`.
fn innermost<'a>(definitions: &'a [Definition], line: u32) -> Option<&'a Definition> {
  definitions
    .iter()
    .filter(|d| d.start_line <= line && line <= d.end_line)
    .min_by_key(|d| d.end_line - d.start_line)
}

/// Symbol id of the innermost enclosing declaration, or the
/// `path:name:line` fallback when the site is at file level.
fn enclosing_symbol(definitions: &[Definition], symbols: &[Symbol], file: &SourceFile, line: u32) -> String {
  if let Some(def) = innermost(definitions, line)
    && let Some(symbol) = symbols.iter().find(|s| s.name == def.name && s.start_line == def.start_line)
  {
    return symbol.id.clone();
  }
  let stem = file
    .relative
    .rsplit('/')
    .next()
    .and_then(|basename| basename.split('.').next())
    .unwrap_or("file");
  fallback_caller(file, stem, line)
}

fn fallback_caller(file: &SourceFile, name: &str, line: u32) -> String {
  format!("{}:{}:{}", file.relative, name, line)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn go_file() -> SourceFile {
    let content = r#"package main

import "fmt"

// LoadConfig reads the engine configuration from disk.
func LoadConfig(path string) Config {
	data := readFile(path)
	return parseConfig(data)
}

func helper() {
	fmt.Println("internal")
}
"#;
    SourceFile {
      relative: "cfg/config.go".to_string(),
      language: Language::Go,
      content: content.to_string(),
      content_hash: scout_core::content_hash(content.as_bytes()),
    }
  }

  #[test]
  fn test_symbols_with_visibility_and_doc() {
    let mut parser = SourceParser::new();
    let extraction = extract_file(&mut parser, &go_file());

    let load = extraction.symbols.iter().find(|s| s.name == "LoadConfig").unwrap();
    assert_eq!(load.kind, SymbolKind::Function);
    assert_eq!(load.visibility, Visibility::Public);
    assert!(load.doc.as_deref().unwrap_or("").contains("reads the engine configuration"));
    assert!(load.signature.starts_with("func LoadConfig"));
    assert!(load.line_count() >= 3);

    let helper = extraction.symbols.iter().find(|s| s.name == "helper").unwrap();
    assert_eq!(helper.visibility, Visibility::Private);
    assert!(helper.doc.is_none());
  }

  #[test]
  fn test_call_references_attach_enclosing_symbol() {
    let mut parser = SourceParser::new();
    let extraction = extract_file(&mut parser, &go_file());

    let load_id = extraction.symbols.iter().find(|s| s.name == "LoadConfig").unwrap().id.clone();

    let read_call = extraction
      .references
      .iter()
      .find(|r| r.kind == ReferenceKind::Call && r.to_symbol == "readFile")
      .unwrap();
    assert_eq!(read_call.from_symbol, load_id);
    assert!(read_call.is_external, "unresolved until the indexer's resolution pass");

    let println_call = extraction
      .references
      .iter()
      .find(|r| r.kind == ReferenceKind::Call && r.to_symbol == "Println")
      .unwrap();
    let helper_id = &extraction.symbols.iter().find(|s| s.name == "helper").unwrap().id;
    assert_eq!(&println_call.from_symbol, helper_id);
  }

  #[test]
  fn test_file_level_reference_uses_fallback_caller() {
    let mut parser = SourceParser::new();
    let extraction = extract_file(&mut parser, &go_file());

    let import_ref = extraction
      .references
      .iter()
      .find(|r| r.kind == ReferenceKind::Import)
      .unwrap();
    assert_eq!(import_ref.to_symbol, "fmt");
    assert!(
      import_ref.from_symbol.starts_with("cfg/config.go:config:"),
      "fallback caller format: {}",
      import_ref.from_symbol
    );
  }

  #[test]
  fn test_python_underscore_is_private() {
    let content = "def _internal():\n    pass\n\ndef public_api():\n    _internal()\n";
    let file = SourceFile {
      relative: "mod.py".to_string(),
      language: Language::Python,
      content: content.to_string(),
      content_hash: scout_core::content_hash(content.as_bytes()),
    };
    let mut parser = SourceParser::new();
    let extraction = extract_file(&mut parser, &file);

    let internal = extraction.symbols.iter().find(|s| s.name == "_internal").unwrap();
    assert_eq!(internal.visibility, Visibility::Private);
    let public = extraction.symbols.iter().find(|s| s.name == "public_api").unwrap();
    assert_eq!(public.visibility, Visibility::Public);

    // python call edges are required
    assert!(
      extraction
        .references
        .iter()
        .any(|r| r.kind == ReferenceKind::Call && r.to_symbol == "_internal")
    );
  }

  #[test]
  fn test_unsupported_language_extracts_nothing() {
    let file = SourceFile {
      relative: "notes.md".to_string(),
      language: Language::Markdown,
      content: "# notes\ncall_me()\n".to_string(),
      content_hash: scout_core::content_hash(b"x"),
    };
    let mut parser = SourceParser::new();
    let extraction = extract_file(&mut parser, &file);
    assert!(extraction.symbols.is_empty());
    assert!(extraction.references.is_empty());
  }
}
