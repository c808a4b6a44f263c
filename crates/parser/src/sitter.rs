//! SourceParser implementation

use std::collections::{HashMap, HashSet};

use scout_core::Language;
use tree_sitter::{Language as TsLanguage, Parser, Query, QueryCursor, StreamingIterator, Tree};

use crate::languages;

/// Holds the compiled queries for a specific language.
///
/// Any query may be absent: either the language has no patterns for that
/// extraction, or compilation failed (logged, non-fatal).
pub struct LanguageQueries {
  pub imports: Option<Query>,
  pub calls: Option<Query>,
  pub definitions: Option<Query>,
  pub types: Option<Query>,
  pub implements: Option<Query>,
}

/// Cached parse tree for a file
struct CachedTree {
  content_hash: u64,
  tree: Tree,
}

/// A definition extracted from code
#[derive(Debug, Clone)]
pub struct Definition {
  pub name: String,
  pub kind: DefinitionKind,
  /// Enclosing declaration name: the class of a method, or the receiver
  /// type of a Go method.
  pub parent: Option<String>,
  pub start_line: u32,
  pub end_line: u32,
}

/// The kind of definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
  Function,
  Method,
  Class,
  Struct,
  Interface,
  Trait,
  Enum,
  Const,
  Type,
  Module,
}

/// A call site: callee name plus the 1-based line it occurs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
  pub name: String,
  pub line: u32,
}

/// A type mention: type name plus the 1-based line it occurs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeUseSite {
  pub name: String,
  pub line: u32,
}

/// An import statement target plus the 1-based line it occurs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
  pub target: String,
  pub line: u32,
}

/// An interface/trait implementation marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementSite {
  pub type_name: String,
  pub trait_name: String,
  pub line: u32,
}

/// Tree-sitter based code parser.
///
/// Lazily loads parsers and queries for each language as needed. Caches the
/// last parsed tree per language so multiple extractions over the same file
/// parse once. Reuses a single QueryCursor to avoid allocation overhead.
pub struct SourceParser {
  parsers: HashMap<Language, Parser>,
  queries: HashMap<Language, LanguageQueries>,
  tree_cache: HashMap<Language, CachedTree>,
  query_cursor: QueryCursor,
}

impl SourceParser {
  pub fn new() -> Self {
    Self {
      parsers: HashMap::new(),
      queries: HashMap::new(),
      tree_cache: HashMap::new(),
      query_cursor: QueryCursor::new(),
    }
  }

  /// Simple hash for content (for cache invalidation)
  fn hash_content(content: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
  }

  /// Parse and cache a file's tree for subsequent queries.
  /// Returns true if parsing was successful.
  pub fn parse_file(&mut self, content: &str, lang: Language) -> bool {
    self.ensure_loaded(lang);

    let content_hash = Self::hash_content(content);

    if let Some(cached) = self.tree_cache.get(&lang)
      && cached.content_hash == content_hash
    {
      return true;
    }

    let Some(parser) = self.parsers.get_mut(&lang) else {
      return false;
    };

    if let Some(tree) = parser.parse(content, None) {
      self.tree_cache.insert(lang, CachedTree { content_hash, tree });
      true
    } else {
      false
    }
  }

  /// Clear the tree cache (call when switching to a different file)
  pub fn clear_cache(&mut self) {
    self.tree_cache.clear();
  }

  /// Check if a language is supported for parsing
  pub fn supports_language(&self, lang: Language) -> bool {
    self.get_grammar(lang).is_some()
  }

  /// Extract symbol definitions from code.
  pub fn extract_definitions(&mut self, content: &str, lang: Language) -> Vec<Definition> {
    if !self.parse_file(content, lang) {
      return Vec::new();
    }

    let Some(cached) = self.tree_cache.get(&lang) else {
      return Vec::new();
    };
    let Some(query) = self.queries.get(&lang).and_then(|q| q.definitions.as_ref()) else {
      return Vec::new();
    };

    let mut definitions: Vec<Definition> = Vec::new();
    let mut seen: HashMap<(String, u32), usize> = HashMap::new();

    let mut matches = self
      .query_cursor
      .matches(query, cached.tree.root_node(), content.as_bytes());

    while let Some(match_) = matches.next() {
      let mut name: Option<String> = None;
      let mut parent: Option<String> = None;
      let mut start_line: Option<u32> = None;
      let mut end_line: Option<u32> = None;
      let mut kind = DefinitionKind::Function;

      for cap in match_.captures {
        let cap_name = &query.capture_names()[cap.index as usize];
        let node = cap.node;

        match *cap_name {
          "name" => {
            if let Ok(text) = node.utf8_text(content.as_bytes()) {
              name = Some(text.to_string());
            }
          }
          "parent" => {
            if let Ok(text) = node.utf8_text(content.as_bytes()) {
              parent = Some(text.to_string());
            }
          }
          other => {
            if let Some(k) = Self::definition_kind_for_capture(other) {
              kind = k;
              start_line = Some(node.start_position().row as u32 + 1);
              end_line = Some(node.end_position().row as u32 + 1);
            }
          }
        }
      }

      if let (Some(n), Some(sl), Some(el)) = (name, start_line, end_line) {
        let definition = Definition {
          name: n.clone(),
          kind,
          parent,
          start_line: sl,
          end_line: el,
        };
        match seen.get(&(n.clone(), sl)) {
          // A method can also match the plain-function pattern; keep the
          // match that knows its parent.
          Some(&idx) => {
            if definitions[idx].parent.is_none() && definition.parent.is_some() {
              definitions[idx] = definition;
            }
          }
          None => {
            seen.insert((n, sl), definitions.len());
            definitions.push(definition);
          }
        }
      }
    }

    definitions.sort_by_key(|d| d.start_line);
    definitions
  }

  fn definition_kind_for_capture(capture: &str) -> Option<DefinitionKind> {
    match capture {
      "definition.function" => Some(DefinitionKind::Function),
      "definition.method" => Some(DefinitionKind::Method),
      "definition.class" => Some(DefinitionKind::Class),
      "definition.struct" => Some(DefinitionKind::Struct),
      "definition.interface" => Some(DefinitionKind::Interface),
      "definition.trait" => Some(DefinitionKind::Trait),
      "definition.enum" => Some(DefinitionKind::Enum),
      "definition.module" => Some(DefinitionKind::Module),
      "definition.const" => Some(DefinitionKind::Const),
      "definition.type" => Some(DefinitionKind::Type),
      _ => None,
    }
  }

  /// Extract call sites with line numbers.
  pub fn extract_calls(&mut self, content: &str, lang: Language) -> Vec<CallSite> {
    self
      .run_sited_query(content, lang, |q| &q.calls)
      .into_iter()
      .map(|(name, line)| CallSite { name, line })
      .collect()
  }

  /// Extract import statements with line numbers.
  pub fn extract_imports(&mut self, content: &str, lang: Language) -> Vec<ImportSite> {
    self
      .run_sited_query(content, lang, |q| &q.imports)
      .into_iter()
      .map(|(target, line)| ImportSite { target, line })
      .collect()
  }

  /// Extract type mentions with line numbers.
  pub fn extract_type_uses(&mut self, content: &str, lang: Language) -> Vec<TypeUseSite> {
    self
      .run_sited_query(content, lang, |q| &q.types)
      .into_iter()
      .map(|(name, line)| TypeUseSite { name, line })
      .collect()
  }

  /// Extract interface/trait implementation markers.
  pub fn extract_implements(&mut self, content: &str, lang: Language) -> Vec<ImplementSite> {
    if !self.parse_file(content, lang) {
      return Vec::new();
    }

    let Some(cached) = self.tree_cache.get(&lang) else {
      return Vec::new();
    };
    let Some(query) = self.queries.get(&lang).and_then(|q| q.implements.as_ref()) else {
      return Vec::new();
    };

    let mut results = Vec::new();
    let mut matches = self
      .query_cursor
      .matches(query, cached.tree.root_node(), content.as_bytes());

    while let Some(match_) = matches.next() {
      let mut type_name: Option<String> = None;
      let mut trait_name: Option<String> = None;
      let mut line: Option<u32> = None;

      for cap in match_.captures {
        let cap_name = &query.capture_names()[cap.index as usize];
        let node = cap.node;
        match *cap_name {
          "type" => {
            if let Ok(text) = node.utf8_text(content.as_bytes()) {
              type_name = Some(text.to_string());
              line.get_or_insert(node.start_position().row as u32 + 1);
            }
          }
          "trait" => {
            if let Ok(text) = node.utf8_text(content.as_bytes()) {
              trait_name = Some(text.to_string());
            }
          }
          _ => {}
        }
      }

      if let (Some(t), Some(tr), Some(l)) = (type_name, trait_name, line) {
        results.push(ImplementSite {
          type_name: t,
          trait_name: tr,
          line: l,
        });
      }
    }

    results
  }

  /// Run a capture query and return `(text, 1-based line)` pairs,
  /// deduplicated while preserving order.
  fn run_sited_query<F>(&mut self, content: &str, lang: Language, get_query: F) -> Vec<(String, u32)>
  where
    F: Fn(&LanguageQueries) -> &Option<Query>,
  {
    if !self.parse_file(content, lang) {
      return Vec::new();
    }

    let Some(cached) = self.tree_cache.get(&lang) else {
      return Vec::new();
    };
    let Some(queries) = self.queries.get(&lang) else {
      return Vec::new();
    };
    let Some(query) = get_query(queries) else {
      return Vec::new();
    };

    let mut results: Vec<(String, u32)> = Vec::new();
    let root = cached.tree.root_node();

    let mut matches = self.query_cursor.matches(query, root, content.as_bytes());

    while let Some(match_) = matches.next() {
      for cap in match_.captures {
        let cap_name = &query.capture_names()[cap.index as usize];
        // Skip helper captures like @_require
        if cap_name.starts_with('_') {
          continue;
        }
        if let Ok(text) = cap.node.utf8_text(content.as_bytes()) {
          // Clean up the string (remove quotes and angle brackets for imports, etc.)
          let cleaned = text.trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '<' || c == '>');
          if !cleaned.is_empty() {
            results.push((cleaned.to_string(), cap.node.start_position().row as u32 + 1));
          }
        }
      }
    }

    // Deduplicate (name, line) pairs while preserving order
    let mut seen: HashSet<(String, u32)> = HashSet::new();
    results.retain(|entry| seen.insert(entry.clone()));

    results
  }

  fn ensure_loaded(&mut self, lang: Language) {
    if self.parsers.contains_key(&lang) {
      return;
    }

    if let Some(grammar) = self.get_grammar(lang) {
      let mut parser = Parser::new();
      if parser.set_language(&grammar).is_ok() {
        self.parsers.insert(lang, parser);
        self.queries.insert(lang, languages::load_queries(lang, &grammar));
      }
    }
  }

  fn get_grammar(&self, lang: Language) -> Option<TsLanguage> {
    match lang {
      Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
      Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
      Language::JavaScript | Language::Jsx => Some(tree_sitter_javascript::LANGUAGE.into()),
      Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
      Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
      Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
      Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
      Language::C => Some(tree_sitter_c::LANGUAGE.into()),
      Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
      _ => None,
    }
  }
}

impl Default for SourceParser {
  fn default() -> Self {
    Self::new()
  }
}
