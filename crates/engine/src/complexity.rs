//! Per-function complexity metrics and file summaries.
//!
//! Cyclomatic complexity is `1 + count(decision tokens)` over the
//! function's line range, counted by a simple tokenizer; nesting depth is
//! estimated from brace and indent deltas. Figures are estimates, not a
//! type-aware analysis.

use std::collections::BTreeMap;

use scout_core::{EngineError, ErrorKind, ReferenceKind, Symbol, SymbolKind, Visibility};

use crate::{Engine, store_error};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FunctionComplexity {
  pub name: String,
  pub start_line: u32,
  pub end_line: u32,
  pub complexity: u32,
  pub max_nesting: u32,
  pub parameter_count: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComplexityReport {
  pub file_path: String,
  pub max_complexity: u32,
  pub average_complexity: f32,
  pub functions: Vec<FunctionComplexity>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FileSummary {
  pub file_path: String,
  pub language: String,
  pub imports: Vec<String>,
  pub exported_symbols: Vec<String>,
  pub functions: Vec<String>,
  pub types: Vec<String>,
  pub complexity: ComplexityReport,
}

impl Engine {
  /// Complexity metrics for every function and method in one file.
  pub fn complexity(&self, file_path: &str) -> Result<ComplexityReport, EngineError> {
    let symbols = self.store().symbols_for_file(file_path).map_err(store_error)?;
    if symbols.is_empty() {
      return Err(
        EngineError::new(ErrorKind::NotFound, format!("no symbols indexed for '{file_path}'"))
          .with_context(file_path.to_string()),
      );
    }

    let lines = self.file_lines_from_chunks(file_path)?;

    let functions: Vec<FunctionComplexity> = symbols
      .iter()
      .filter(|s| matches!(s.kind, SymbolKind::Function | SymbolKind::Method))
      .map(|s| function_complexity(s, &lines))
      .collect();

    let max_complexity = functions.iter().map(|f| f.complexity).max().unwrap_or(0);
    let average_complexity = if functions.is_empty() {
      0.0
    } else {
      functions.iter().map(|f| f.complexity as f32).sum::<f32>() / functions.len() as f32
    };

    Ok(ComplexityReport {
      file_path: file_path.to_string(),
      max_complexity,
      average_complexity,
      functions,
    })
  }

  /// Aggregate view of one file: imports, exported symbols, functions,
  /// types, and the complexity metrics above.
  pub fn file_summary(&self, file_path: &str) -> Result<FileSummary, EngineError> {
    let complexity = self.complexity(file_path)?;
    let symbols = self.store().symbols_for_file(file_path).map_err(store_error)?;
    let references = self.store().references_for_file(file_path).map_err(store_error)?;
    let chunks = self.store().chunks_for_file(file_path).map_err(store_error)?;

    let language = chunks
      .first()
      .map(|c| c.language.as_str().to_string())
      .unwrap_or_else(|| "text".to_string());

    let mut imports: Vec<String> = references
      .iter()
      .filter(|r| r.kind == ReferenceKind::Import)
      .map(|r| r.to_symbol.clone())
      .collect();
    imports.dedup();

    let exported_symbols = symbols
      .iter()
      .filter(|s| s.visibility == Visibility::Public)
      .map(|s| s.name.clone())
      .collect();
    let functions = symbols
      .iter()
      .filter(|s| matches!(s.kind, SymbolKind::Function | SymbolKind::Method))
      .map(|s| s.name.clone())
      .collect();
    let types = symbols
      .iter()
      .filter(|s| matches!(s.kind, SymbolKind::Type | SymbolKind::Interface))
      .map(|s| s.name.clone())
      .collect();

    Ok(FileSummary {
      file_path: file_path.to_string(),
      language,
      imports,
      exported_symbols,
      functions,
      types,
      complexity,
    })
  }

  /// Reconstruct the line texts of a file from its stored chunks.
  fn file_lines_from_chunks(&self, file_path: &str) -> Result<BTreeMap<u32, String>, EngineError> {
    let chunks = self.store().chunks_for_file(file_path).map_err(store_error)?;
    let mut lines = BTreeMap::new();
    for chunk in chunks {
      for (offset, line) in chunk.content.lines().enumerate() {
        lines.insert(chunk.start_line + offset as u32, line.to_string());
      }
    }
    Ok(lines)
  }
}

fn function_complexity(symbol: &Symbol, lines: &BTreeMap<u32, String>) -> FunctionComplexity {
  let mut complexity = 1u32;
  let mut depth = 0i32;
  let mut max_depth = 0i32;
  let base_indent = lines.get(&symbol.start_line).map(|l| indent_of(l)).unwrap_or(0);
  let mut max_indent = 0usize;

  for line_no in symbol.start_line..=symbol.end_line {
    let Some(line) = lines.get(&line_no) else {
      continue;
    };
    complexity += decision_tokens(line);

    for c in line.chars() {
      match c {
        '{' => {
          depth += 1;
          max_depth = max_depth.max(depth);
        }
        '}' => depth -= 1,
        _ => {}
      }
    }

    if line_no > symbol.start_line && !line.trim().is_empty() {
      max_indent = max_indent.max(indent_of(line).saturating_sub(base_indent));
    }
  }

  // Brace depth where braces exist, indent steps (4-wide estimate) where
  // they do not (Python).
  let max_nesting = if max_depth > 0 {
    max_depth.max(0) as u32
  } else {
    (max_indent / 4) as u32
  };

  FunctionComplexity {
    name: symbol.name.clone(),
    start_line: symbol.start_line,
    end_line: symbol.end_line,
    complexity,
    max_nesting,
    parameter_count: parameter_count(&symbol.signature),
  }
}

/// Count decision tokens on one line: branch/loop keywords, boolean
/// operators and the ternary operator.
fn decision_tokens(line: &str) -> u32 {
  let mut count = 0u32;

  for keyword in ["if", "elif", "for", "while", "case", "catch", "except", "when"] {
    count += count_word(line, keyword);
  }
  // `else if`/`elif` already counted through their `if`/`elif` token.

  count += line.matches("&&").count() as u32;
  count += line.matches("||").count() as u32;
  // Ternary: a spaced `?` that is not part of `??` or `?.`
  count += line
    .char_indices()
    .filter(|&(i, c)| {
      c == '?'
        && line[..i].ends_with(' ')
        && !matches!(line[i + 1..].chars().next(), Some('?') | Some('.'))
    })
    .count() as u32;

  count
}

/// Occurrences of `word` bounded by non-identifier characters.
fn count_word(line: &str, word: &str) -> u32 {
  let mut count = 0u32;
  let bytes = line.as_bytes();
  let mut search_from = 0usize;

  while let Some(pos) = line[search_from..].find(word) {
    let start = search_from + pos;
    let end = start + word.len();
    let before_ok = start == 0 || !(bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_');
    let after_ok = end >= bytes.len() || !(bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_');
    if before_ok && after_ok {
      count += 1;
    }
    search_from = end;
  }

  count
}

fn indent_of(line: &str) -> usize {
  line.chars().take_while(|c| *c == ' ' || *c == '\t').map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// Parameters in the first parenthesized group of a signature.
fn parameter_count(signature: &str) -> u32 {
  let Some(open) = signature.find('(') else {
    return 0;
  };
  let mut depth = 0i32;
  let mut args = String::new();
  for c in signature[open..].chars() {
    match c {
      '(' => {
        depth += 1;
        if depth == 1 {
          continue;
        }
      }
      ')' => {
        depth -= 1;
        if depth == 0 {
          break;
        }
      }
      _ => {}
    }
    args.push(c);
  }

  let trimmed = args.trim();
  if trimmed.is_empty() {
    return 0;
  }

  // Count top-level commas only (generics and nested parens stay inside).
  let mut count = 1u32;
  let mut nesting = 0i32;
  for c in trimmed.chars() {
    match c {
      '(' | '[' | '<' | '{' => nesting += 1,
      ')' | ']' | '>' | '}' => nesting -= 1,
      ',' if nesting == 0 => count += 1,
      _ => {}
    }
  }
  count
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_decision_tokens() {
    assert_eq!(decision_tokens("if err != nil {"), 1);
    assert_eq!(decision_tokens("} else if ok && ready {"), 2); // if + &&
    assert_eq!(decision_tokens("for i := 0; i < n; i++ {"), 1);
    assert_eq!(decision_tokens("while (a || b)"), 2);
    assert_eq!(decision_tokens("let v = cond ? a : b;"), 1);
    assert_eq!(decision_tokens("notify() // modifier"), 0);
    assert_eq!(decision_tokens("endif_marker = 1"), 0); // no word boundary
  }

  #[test]
  fn test_count_word_boundaries() {
    assert_eq!(count_word("if iffy if", "if"), 2);
    assert_eq!(count_word("verify()", "if"), 0);
  }

  #[test]
  fn test_parameter_count() {
    assert_eq!(parameter_count("func f()"), 0);
    assert_eq!(parameter_count("func f(a int)"), 1);
    assert_eq!(parameter_count("func f(a int, b string) error"), 2);
    assert_eq!(parameter_count("fn g(map: HashMap<String, u32>, n: usize)"), 2);
    assert_eq!(parameter_count("no parens here"), 0);
  }

  #[test]
  fn test_function_complexity_counts() {
    let mut lines = BTreeMap::new();
    let source = [
      "func Busy(a int, b int) int {",
      "    if a > 0 {",
      "        for i := 0; i < b; i++ {",
      "            if i%2 == 0 && a > i {",
      "                a--",
      "            }",
      "        }",
      "    }",
      "    return a",
      "}",
    ];
    for (i, line) in source.iter().enumerate() {
      lines.insert(i as u32 + 1, line.to_string());
    }
    let symbol = Symbol {
      id: "f.go:Busy:1:abcd0000".to_string(),
      name: "Busy".to_string(),
      kind: SymbolKind::Function,
      file_path: "f.go".to_string(),
      start_line: 1,
      end_line: 10,
      signature: "func Busy(a int, b int) int {".to_string(),
      visibility: Visibility::Public,
      doc: None,
    };

    let result = function_complexity(&symbol, &lines);
    // 1 + if + for + if + && = 5
    assert_eq!(result.complexity, 5);
    assert_eq!(result.parameter_count, 2);
    assert_eq!(result.max_nesting, 4, "fn + if + for + if braces");
  }
}
