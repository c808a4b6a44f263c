//! TypeScript/JavaScript tree-sitter queries
//!
//! Handles four variants:
//! - JavaScript: tree-sitter-javascript grammar (includes JSX)
//! - JSX: same as JavaScript
//! - TypeScript: tree-sitter-typescript grammar (no JSX, uses type_identifier)
//! - TSX: tree-sitter-typescript TSX grammar (JSX + type_identifier)

use scout_core::Language;
use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for TypeScript/JavaScript (same for all variants)
const IMPORTS_QUERY: &str = r#"
; import { foo } from 'module'
(import_statement
  source: (string) @import)

; const foo = require('module')
(call_expression
  function: (identifier) @_require
  arguments: (arguments (string) @import)
  (#eq? @_require "require"))

; Dynamic imports: import('module')
(call_expression
  function: (import)
  arguments: (arguments (string) @import))

; export { foo } from 'module'
(export_statement
  source: (string) @import)
"#;

/// Base call extraction query (works for all variants)
const BASE_CALLS_QUERY: &str = r#"
; Direct function calls: foo()
(call_expression
  function: (identifier) @call)

; Method calls: obj.method()
(call_expression
  function: (member_expression
    property: (property_identifier) @call))

; Chained method calls
(call_expression
  function: (member_expression
    object: (call_expression)
    property: (property_identifier) @call))

; new Constructor()
(new_expression
  constructor: (identifier) @call)

; new module.Constructor()
(new_expression
  constructor: (member_expression
    property: (property_identifier) @call))
"#;

/// JSX-specific call patterns (only for JSX/TSX grammars)
const JSX_CALLS_QUERY: &str = r#"
; JSX self-closing element: <Component />
(jsx_self_closing_element
  name: (identifier) @call)

; JSX opening element: <Component>...</Component>
(jsx_opening_element
  name: (identifier) @call)
"#;

/// Definition extraction query for JavaScript/JSX (uses identifier for class names)
const JS_DEFINITIONS_QUERY: &str = r#"
; function declarations
(function_declaration
  name: (identifier) @name) @definition.function

; arrow functions assigned to const/let
(variable_declarator
  name: (identifier) @name
  value: (arrow_function) @definition.function)

; class declarations (JavaScript uses identifier)
(class_declaration
  name: (identifier) @name) @definition.class

; method definitions inside class - capture class name as parent
(class_declaration
  name: (identifier) @parent
  body: (class_body
    (method_definition
      name: (property_identifier) @name) @definition.method))
"#;

/// Definition extraction query for TypeScript (uses type_identifier for class names)
const TS_DEFINITIONS_QUERY: &str = r#"
; function declarations
(function_declaration
  name: (identifier) @name) @definition.function

; arrow functions assigned to const/let
(variable_declarator
  name: (identifier) @name
  value: (arrow_function) @definition.function)

; class declarations (TypeScript uses type_identifier)
(class_declaration
  name: (type_identifier) @name) @definition.class

; interface declarations (TypeScript)
(interface_declaration
  name: (type_identifier) @name) @definition.interface

; type alias declarations (TypeScript)
(type_alias_declaration
  name: (type_identifier) @name) @definition.type

; enum declarations (TypeScript)
(enum_declaration
  name: (identifier) @name) @definition.enum

; method definitions inside class - capture class name as parent
(class_declaration
  name: (type_identifier) @parent
  body: (class_body
    (method_definition
      name: (property_identifier) @name) @definition.method))
"#;

/// Type mention query for TypeScript (annotations)
const TS_TYPES_QUERY: &str = r#"
; Type annotations: const x: Foo, function f(a: Foo): Bar
(type_annotation
  (type_identifier) @type)

; Generic type arguments: Array<Foo>
(type_arguments
  (type_identifier) @type)
"#;

/// Implementation markers for TypeScript: class Foo implements Bar
const TS_IMPLEMENTS_QUERY: &str = r#"
(class_declaration
  name: (type_identifier) @type
  (class_heritage
    (implements_clause
      (type_identifier) @trait)))
"#;

/// Load queries for a specific JS/TS variant
pub fn queries_for_variant(lang: Language, grammar: &TsLanguage) -> LanguageQueries {
  match lang {
    Language::JavaScript | Language::Jsx => {
      // JavaScript grammar includes JSX support
      let calls_query = format!("{}\n{}", BASE_CALLS_QUERY, JSX_CALLS_QUERY);
      LanguageQueries {
        imports: compile_query(grammar, IMPORTS_QUERY),
        calls: compile_query(grammar, &calls_query),
        definitions: compile_query(grammar, JS_DEFINITIONS_QUERY),
        types: None,
        implements: None,
      }
    }
    Language::TypeScript => {
      // TypeScript grammar does NOT include JSX
      LanguageQueries {
        imports: compile_query(grammar, IMPORTS_QUERY),
        calls: compile_query(grammar, BASE_CALLS_QUERY),
        definitions: compile_query(grammar, TS_DEFINITIONS_QUERY),
        types: compile_query(grammar, TS_TYPES_QUERY),
        implements: compile_query(grammar, TS_IMPLEMENTS_QUERY),
      }
    }
    Language::Tsx => {
      // TSX grammar includes JSX support
      let calls_query = format!("{}\n{}", BASE_CALLS_QUERY, JSX_CALLS_QUERY);
      LanguageQueries {
        imports: compile_query(grammar, IMPORTS_QUERY),
        calls: compile_query(grammar, &calls_query),
        definitions: compile_query(grammar, TS_DEFINITIONS_QUERY),
        types: compile_query(grammar, TS_TYPES_QUERY),
        implements: compile_query(grammar, TS_IMPLEMENTS_QUERY),
      }
    }
    _ => LanguageQueries {
      imports: None,
      calls: None,
      definitions: None,
      types: None,
      implements: None,
    },
  }
}
