//! Tree-sitter based code parsing for CodeScout
//!
//! This crate provides extraction of:
//! - Symbol definitions with enclosing parents
//! - Function/method call sites with line numbers
//! - Import statements
//! - Type mentions and interface-implementation markers
//!
//! # Example
//! ```ignore
//! use parser::SourceParser;
//! use scout_core::Language;
//!
//! let mut parser = SourceParser::new();
//! let defs = parser.extract_definitions(code, Language::Go);
//! let calls = parser.extract_calls(code, Language::Go);
//! ```

mod languages;
mod sitter;

pub use sitter::{
  CallSite, Definition, DefinitionKind, ImplementSite, ImportSite, LanguageQueries, SourceParser, TypeUseSite,
};

// Re-export for convenience
pub use scout_core::Language;
