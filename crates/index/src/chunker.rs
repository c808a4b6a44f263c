//! Splits source files into chunks along syntactic boundaries.
//!
//! The AST strategy emits one chunk per top-level declaration, merges small
//! neighbours and splits over-large nodes at inner declaration boundaries,
//! then on lines. Files in languages without a grammar, and files whose
//! parse fails, fall back to line-based chunking (a non-fatal warning).

use parser::{Definition, DefinitionKind, SourceParser};
use scout_core::{Chunk, ChunkKind, ChunkingConfig};
use tracing::debug;

use crate::scanner::SourceFile;

/// A candidate chunk before content is materialized.
#[derive(Debug, Clone)]
struct Pending {
  start: u32,
  end: u32,
  kind: ChunkKind,
  name: Option<String>,
  parent: Option<String>,
}

pub struct Chunker {
  config: ChunkingConfig,
  parser: SourceParser,
}

impl Chunker {
  pub fn new(config: ChunkingConfig) -> Self {
    Self {
      config,
      parser: SourceParser::new(),
    }
  }

  /// Chunk one file. Deterministic for the same (content, config).
  ///
  /// Returns the chunks and an optional non-fatal warning (AST parse
  /// failure that forced the line-based fallback).
  pub fn chunk(&mut self, file: &SourceFile) -> (Vec<Chunk>, Option<String>) {
    self.parser.clear_cache();

    if file.content.trim().is_empty() {
      return (Vec::new(), None);
    }

    let lines: Vec<&str> = file.content.lines().collect();

    // Whole file under the minimum: one chunk of kind `file`.
    if file.content.len() < self.config.min_chunk_chars {
      let chunk = Chunk::new(
        &file.relative,
        file.language,
        ChunkKind::File,
        None,
        None,
        1,
        lines.len().max(1) as u32,
        file.content.trim_end_matches('\n').to_string(),
      );
      return (vec![chunk], None);
    }

    if self.config.strategy == "ast" && file.language.supports_ast() {
      if !self.parser.parse_file(&file.content, file.language) {
        let warning = format!("{}: parse failed, falling back to line-based chunking", file.relative);
        return (self.chunk_by_lines(file, &lines), Some(warning));
      }

      let definitions = self.parser.extract_definitions(&file.content, file.language);
      if !definitions.is_empty() {
        let chunks = self.chunk_by_definitions(file, &lines, definitions);
        if !chunks.is_empty() {
          return (chunks, None);
        }
      }
      debug!(file = %file.relative, "No definitions found, using line-based chunking");
    }

    (self.chunk_by_lines(file, &lines), None)
  }

  // === AST strategy ===

  fn chunk_by_definitions(&self, file: &SourceFile, lines: &[&str], definitions: Vec<Definition>) -> Vec<Chunk> {
    let total_lines = lines.len() as u32;
    let top = top_level(&definitions);

    // A declaration's chunk starts at its doc comment, not the keyword.
    let mut starts: Vec<u32> = Vec::with_capacity(top.len());
    let mut previous_end = 0u32;
    for def in &top {
      starts.push(doc_extended_start(lines, def.start_line, previous_end + 1));
      previous_end = def.end_line.min(total_lines).max(previous_end);
    }

    // Lay out the file as alternating gap / declaration segments.
    let mut pending: Vec<Pending> = Vec::new();
    let mut cursor = 1u32;
    for (def, &start) in top.iter().zip(&starts) {
      if start > cursor {
        push_gap(&mut pending, lines, cursor, start - 1);
      }
      let end = def.end_line.min(total_lines);
      self.push_definition(&mut pending, lines, &definitions, def, start, end);
      cursor = end + 1;
    }
    if cursor <= total_lines {
      push_gap(&mut pending, lines, cursor, total_lines);
    }

    let merged = self.merge_small(pending, lines);

    merged
      .into_iter()
      .map(|p| {
        let content = lines[(p.start - 1) as usize..p.end as usize].join("\n");
        Chunk::new(
          &file.relative,
          file.language,
          p.kind,
          p.name,
          p.parent,
          p.start,
          p.end,
          content,
        )
      })
      .collect()
  }

  /// Emit one declaration as a chunk, splitting over-large nodes at inner
  /// declaration boundaries and then on lines.
  fn push_definition(
    &self,
    pending: &mut Vec<Pending>,
    lines: &[&str],
    all: &[Definition],
    def: &Definition,
    start: u32,
    end: u32,
  ) {
    let max = self.config.max_chunk_chars();
    let size = region_size(lines, start, end);

    if size <= max {
      pending.push(Pending {
        start,
        end,
        kind: chunk_kind_for(def.kind),
        name: Some(def.name.clone()),
        parent: def.parent.clone(),
      });
      return;
    }

    // Oversized: split at direct inner declarations (e.g. the methods of a
    // class), attributing interstitial lines to the enclosing declaration.
    let children = direct_children(all, def, end);
    if children.is_empty() {
      self.push_line_split(pending, lines, start, end, Some(def));
      return;
    }

    let mut cursor = start;
    for child in &children {
      if child.start_line > cursor {
        self.push_line_split_region_as_block(pending, lines, cursor, child.start_line - 1, def);
      }
      let child_end = child.end_line.min(end);
      let child_size = region_size(lines, child.start_line, child_end);
      if child_size <= max {
        pending.push(Pending {
          start: child.start_line,
          end: child_end,
          kind: chunk_kind_for(child.kind),
          name: Some(child.name.clone()),
          parent: Some(def.name.clone()),
        });
      } else {
        self.push_line_split(pending, lines, child.start_line, child_end, Some(child));
      }
      cursor = child_end + 1;
    }
    if cursor <= end {
      self.push_line_split_region_as_block(pending, lines, cursor, end, def);
    }
  }

  fn push_line_split_region_as_block(
    &self,
    pending: &mut Vec<Pending>,
    lines: &[&str],
    start: u32,
    end: u32,
    enclosing: &Definition,
  ) {
    if region_is_blank(lines, start, end) {
      // Blank gaps inside a declaration attach to the preceding piece.
      if let Some(last) = pending.last_mut() {
        last.end = end;
        return;
      }
    }
    let max = self.config.max_chunk_chars();
    if region_size(lines, start, end) <= max {
      pending.push(Pending {
        start,
        end,
        kind: ChunkKind::Block,
        name: Some(enclosing.name.clone()),
        parent: enclosing.parent.clone(),
      });
    } else {
      self.push_line_split(pending, lines, start, end, Some(enclosing));
    }
  }

  /// Last resort: cut a region into windows of whole lines under the cap.
  fn push_line_split(
    &self,
    pending: &mut Vec<Pending>,
    lines: &[&str],
    start: u32,
    end: u32,
    enclosing: Option<&Definition>,
  ) {
    let max = self.config.max_chunk_chars();
    let mut window_start = start;
    let mut window_size = 0usize;

    for line_no in start..=end {
      let line_size = lines[(line_no - 1) as usize].len() + 1;
      if window_size > 0 && window_size + line_size > max {
        pending.push(Pending {
          start: window_start,
          end: line_no - 1,
          kind: ChunkKind::Block,
          name: enclosing.map(|d| d.name.clone()),
          parent: enclosing.and_then(|d| d.parent.clone()),
        });
        window_start = line_no;
        window_size = 0;
      }
      window_size += line_size;
    }
    if window_start <= end {
      pending.push(Pending {
        start: window_start,
        end,
        kind: ChunkKind::Block,
        name: enclosing.map(|d| d.name.clone()),
        parent: enclosing.and_then(|d| d.parent.clone()),
      });
    }
  }

  /// Merge runs of small neighbouring segments until the next one would
  /// cross the cap. A segment at or above `min_chunk_chars` stands alone.
  fn merge_small(&self, pending: Vec<Pending>, lines: &[&str]) -> Vec<Pending> {
    let min = self.config.min_chunk_chars;
    let max = self.config.max_chunk_chars();
    let mut merged: Vec<Pending> = Vec::new();

    for p in pending {
      if let Some(last) = merged.last_mut() {
        let last_size = region_size(lines, last.start, last.end);
        let p_size = region_size(lines, p.start, p.end);
        if last_size < min && last_size + p_size <= max {
          // Absorb into the previous small segment.
          let combined_name = match (last.name.is_some(), p.name.is_some()) {
            (false, true) => (p.kind, p.name.clone(), p.parent.clone()),
            (true, false) => (last.kind, last.name.clone(), last.parent.clone()),
            _ => (ChunkKind::Block, None, None),
          };
          last.end = p.end;
          (last.kind, last.name, last.parent) = combined_name;
          continue;
        }
      }
      merged.push(p);
    }

    merged
  }

  // === Line-based fallback ===

  fn chunk_by_lines(&self, file: &SourceFile, lines: &[&str]) -> Vec<Chunk> {
    let min = self.config.min_chunk_chars;
    let max = self.config.max_chunk_chars();
    let prefixes = file.language.definition_prefixes();
    let total = lines.len() as u32;

    let mut chunks: Vec<(u32, u32)> = Vec::new();
    let mut cur_start = 1u32;
    let mut cur_size = 0usize;

    for line_no in 1..=total {
      let line = lines[(line_no - 1) as usize];
      let line_size = line.len() + 1;
      let trimmed = line.trim();
      let starts_definition = !trimmed.is_empty() && prefixes.iter().any(|p| trimmed.starts_with(p));

      // Cut before a line that would cross the cap or starts a declaration.
      if cur_size > 0 && (cur_size + line_size > max || starts_definition) {
        chunks.push((cur_start, line_no - 1));
        cur_start = line_no;
        cur_size = 0;
      }

      cur_size += line_size;

      // Cut after a blank line once the chunk has substance.
      if trimmed.is_empty() && cur_size >= min {
        chunks.push((cur_start, line_no));
        cur_start = line_no + 1;
        cur_size = 0;
      }
    }
    if cur_start <= total && cur_size > 0 {
      chunks.push((cur_start, total));
    }

    chunks
      .into_iter()
      .map(|(start, end)| {
        let content = lines[(start - 1) as usize..end as usize].join("\n");
        Chunk::new(&file.relative, file.language, ChunkKind::Block, None, None, start, end, content)
      })
      .collect()
  }
}

/// Definitions not strictly contained in another definition's line range.
fn top_level(definitions: &[Definition]) -> Vec<&Definition> {
  let mut top: Vec<&Definition> = Vec::new();
  for def in definitions {
    let contained = definitions.iter().any(|outer| {
      !std::ptr::eq(outer, def)
        && outer.start_line <= def.start_line
        && def.end_line <= outer.end_line
        && (outer.start_line < def.start_line || outer.end_line > def.end_line)
    });
    if !contained {
      // Drop same-range duplicates (e.g. a query matching twice).
      if top
        .last()
        .is_some_and(|prev| prev.start_line == def.start_line && prev.end_line == def.end_line)
      {
        continue;
      }
      top.push(def);
    }
  }
  top
}

/// Definitions contained in `def` but not in any other contained definition.
fn direct_children<'a>(all: &'a [Definition], def: &Definition, end: u32) -> Vec<&'a Definition> {
  let inside: Vec<&Definition> = all
    .iter()
    .filter(|d| {
      d.start_line >= def.start_line
        && d.end_line <= end
        && (d.start_line > def.start_line || d.end_line < end)
        && !std::ptr::eq(*d, def)
    })
    .collect();

  inside
    .iter()
    .filter(|d| {
      !inside.iter().any(|outer| {
        !std::ptr::eq(*outer, **d)
          && outer.start_line <= d.start_line
          && d.end_line <= outer.end_line
          && (outer.start_line < d.start_line || outer.end_line > d.end_line)
      })
    })
    .copied()
    .collect()
}

/// Walk back from a declaration over its contiguous comment block so the
/// doc comment lands in the same chunk as the code it documents.
fn doc_extended_start(lines: &[&str], start_line: u32, lower_bound: u32) -> u32 {
  let mut start = start_line;
  while start > lower_bound {
    let above = lines[(start - 2) as usize].trim();
    let is_comment = above.starts_with("//")
      || above.starts_with('#') && !above.starts_with("#!")
      || above.starts_with("/*")
      || above.starts_with('*')
      || above.starts_with('@');
    if !is_comment {
      break;
    }
    start -= 1;
  }
  start
}

fn push_gap(pending: &mut Vec<Pending>, lines: &[&str], start: u32, end: u32) {
  if region_is_blank(lines, start, end) {
    return;
  }
  pending.push(Pending {
    start,
    end,
    kind: ChunkKind::Block,
    name: None,
    parent: None,
  });
}

fn region_size(lines: &[&str], start: u32, end: u32) -> usize {
  lines[(start - 1) as usize..end as usize]
    .iter()
    .map(|l| l.len() + 1)
    .sum()
}

fn region_is_blank(lines: &[&str], start: u32, end: u32) -> bool {
  lines[(start - 1) as usize..end as usize]
    .iter()
    .all(|l| l.trim().is_empty())
}

fn chunk_kind_for(kind: DefinitionKind) -> ChunkKind {
  match kind {
    DefinitionKind::Function => ChunkKind::Function,
    DefinitionKind::Method => ChunkKind::Method,
    DefinitionKind::Class
    | DefinitionKind::Struct
    | DefinitionKind::Interface
    | DefinitionKind::Trait
    | DefinitionKind::Enum => ChunkKind::Class,
    DefinitionKind::Module | DefinitionKind::Const | DefinitionKind::Type => ChunkKind::Block,
  }
}
