//! File discovery.
//!
//! Walks the root with the `ignore` walker, honouring hidden-dir skipping,
//! the built-in ignore list, user globs and (when enabled and present)
//! `.gitignore`.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use scout_core::{IndexingConfig, Language};
use tracing::{debug, warn};

/// Directories never worth indexing regardless of ignore files.
const DEFAULT_IGNORED_DIRS: &[&str] = &[
  "node_modules",
  "vendor",
  "dist",
  "build",
  "target",
  "__pycache__",
  ".git",
  ".hg",
  ".svn",
];

/// A file discovered by the scanner.
#[derive(Debug, Clone)]
pub struct ScannedFile {
  pub absolute: PathBuf,
  /// Path relative to the scan root, with forward slashes. This is the path
  /// stored in the index.
  pub relative: String,
  pub language: Language,
  pub size: u64,
}

/// A file read into memory for one ingestion unit.
#[derive(Debug, Clone)]
pub struct SourceFile {
  pub relative: String,
  pub language: Language,
  pub content: String,
  /// sha256 of the raw bytes.
  pub content_hash: String,
}

/// Walk `root` and return indexable files with language tags.
pub fn scan(root: &Path, config: &IndexingConfig) -> std::io::Result<Vec<ScannedFile>> {
  let mut builder = WalkBuilder::new(root);
  builder
    .hidden(true)
    .git_ignore(config.use_gitignore)
    .git_global(false)
    .git_exclude(config.use_gitignore)
    .require_git(true)
    .follow_links(false);

  if !config.ignore_globs.is_empty() {
    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for glob in &config.ignore_globs {
      // Override globs are whitelists; a leading ! ignores instead.
      let pattern = format!("!{glob}");
      if let Err(e) = overrides.add(&pattern) {
        warn!(glob = %glob, error = %e, "Skipping invalid ignore glob");
      }
    }
    match overrides.build() {
      Ok(set) => {
        builder.overrides(set);
      }
      Err(e) => warn!(error = %e, "Skipping user ignore globs"),
    }
  }

  builder.filter_entry(|entry| {
    let name = entry.file_name().to_string_lossy();
    !(entry.file_type().is_some_and(|t| t.is_dir()) && DEFAULT_IGNORED_DIRS.contains(&name.as_ref()))
  });

  let mut files = Vec::new();
  for entry in builder.build() {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        warn!(error = %e, "Scan entry error");
        continue;
      }
    };
    if !entry.file_type().is_some_and(|t| t.is_file()) {
      continue;
    }

    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
    if size > config.max_file_bytes {
      debug!(path = %entry.path().display(), size, "Skipping oversized file");
      continue;
    }

    let absolute = entry.path().to_path_buf();
    let relative = match absolute.strip_prefix(root) {
      Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
      Err(_) => continue,
    };

    let language = Language::from_path(&relative);
    files.push(ScannedFile {
      absolute,
      relative,
      language,
      size,
    });
  }

  files.sort_by(|a, b| a.relative.cmp(&b.relative));
  debug!(total = files.len(), root = %root.display(), "Scan complete");
  Ok(files)
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn test_scan_finds_source_files() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/main.go", "package main");
    write(temp.path(), "lib/util.py", "x = 1");

    let files = scan(temp.path(), &IndexingConfig::default()).unwrap();
    let relatives: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();

    assert_eq!(relatives, vec!["lib/util.py", "src/main.go"]);
    assert_eq!(files[1].language, Language::Go);
  }

  #[test]
  fn test_scan_skips_default_dirs_and_hidden() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "keep.go", "package main");
    write(temp.path(), "node_modules/pkg/index.js", "x");
    write(temp.path(), "vendor/lib.go", "package lib");
    write(temp.path(), "target/debug/out.rs", "fn x() {}");
    write(temp.path(), ".hidden/secret.go", "package secret");

    let files = scan(temp.path(), &IndexingConfig::default()).unwrap();
    let relatives: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();
    assert_eq!(relatives, vec!["keep.go"]);
  }

  #[test]
  fn test_scan_honours_user_globs() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "src/a.go", "package a");
    write(temp.path(), "gen/b.go", "package b");

    let config = IndexingConfig {
      ignore_globs: vec!["gen/**".to_string()],
      ..Default::default()
    };
    let files = scan(temp.path(), &config).unwrap();
    let relatives: Vec<_> = files.iter().map(|f| f.relative.as_str()).collect();
    assert_eq!(relatives, vec!["src/a.go"]);
  }

  #[test]
  fn test_scan_skips_oversized_files() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "big.go", &"x".repeat(64));
    write(temp.path(), "small.go", "package s");

    let config = IndexingConfig {
      max_file_bytes: 32,
      ..Default::default()
    };
    let files = scan(temp.path(), &config).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].relative, "small.go");
  }

  #[test]
  fn test_unknown_extension_is_text() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "NOTES", "some notes");

    let files = scan(temp.path(), &IndexingConfig::default()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].language, Language::Text);
  }
}
