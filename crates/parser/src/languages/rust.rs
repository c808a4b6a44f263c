//! Rust tree-sitter queries

use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for Rust
const IMPORTS_QUERY: &str = r#"
; Simple use statements: use foo;
(use_declaration
  argument: (identifier) @import)

; Scoped use: use foo::bar;
(use_declaration
  argument: (scoped_identifier) @import)

; Use list: use foo::{bar, baz}; - capture each item in the list
(use_declaration
  argument: (use_list
    (identifier) @import))
(use_declaration
  argument: (use_list
    (scoped_identifier) @import))

; Scoped use list: use foo::bar::{baz, qux}; - capture items inside the list
(scoped_use_list
  list: (use_list
    (identifier) @import))
(scoped_use_list
  list: (use_list
    (scoped_identifier) @import))

; Aliased items in use lists: use foo::{bar as b, baz};
(scoped_use_list
  list: (use_list
    (use_as_clause
      path: (identifier) @import)))

; Use wildcard: use foo::*;
(use_declaration
  argument: (use_wildcard) @import)

; Aliased use: use foo as bar;
(use_declaration
  argument: (use_as_clause
    path: (identifier) @import))
(use_declaration
  argument: (use_as_clause
    path: (scoped_identifier) @import))
"#;

/// Call extraction query for Rust
const CALLS_QUERY: &str = r#"
; Direct function calls: foo()
(call_expression
  function: (identifier) @call)

; Method calls: obj.method()
(call_expression
  function: (field_expression
    field: (field_identifier) @call))

; Scoped calls: Module::function()
(call_expression
  function: (scoped_identifier
    name: (identifier) @call))

; Generic/turbofish function calls: parse::<Type>(data)
(call_expression
  function: (generic_function
    function: (identifier) @call))

; Generic scoped calls: Vec::<u8>::with_capacity(100)
(call_expression
  function: (generic_function
    function: (scoped_identifier
      name: (identifier) @call)))

; Macro invocations: println!()
(macro_invocation
  macro: (identifier) @call)

; Scoped macro invocations: std::println!()
(macro_invocation
  macro: (scoped_identifier
    name: (identifier) @call))
"#;

/// Definition extraction query for Rust
const DEFINITIONS_QUERY: &str = r#"
; Functions
(function_item
  name: (identifier) @name) @definition.function

; Methods (inside impl blocks) - capture the impl type as parent
(impl_item
  type: (type_identifier) @parent
  body: (declaration_list
    (function_item
      name: (identifier) @name) @definition.method))

; Structs
(struct_item
  name: (type_identifier) @name) @definition.struct

; Enums
(enum_item
  name: (type_identifier) @name) @definition.enum

; Traits
(trait_item
  name: (type_identifier) @name) @definition.trait

; Type aliases
(type_item
  name: (type_identifier) @name) @definition.type

; Modules
(mod_item
  name: (identifier) @name) @definition.module

; Constants and statics
(const_item
  name: (identifier) @name) @definition.const
(static_item
  name: (identifier) @name) @definition.const
"#;

/// Type mention query for Rust
const TYPES_QUERY: &str = r#"
; Let bindings: let x: Foo = ...
(let_declaration
  type: (type_identifier) @type)

; Parameters: fn f(x: Foo)
(parameter
  type: (type_identifier) @type)

; Return types: fn f() -> Foo
(function_item
  return_type: (type_identifier) @type)

; Struct fields
(field_declaration
  type: (type_identifier) @type)

; Struct literals: Foo { .. }
(struct_expression
  name: (type_identifier) @type)
"#;

/// Implementation query for Rust: impl Trait for Type
const IMPLEMENTS_QUERY: &str = r#"
(impl_item
  trait: (type_identifier) @trait
  type: (type_identifier) @type)
"#;

pub fn queries(grammar: &TsLanguage) -> LanguageQueries {
  LanguageQueries {
    imports: compile_query(grammar, IMPORTS_QUERY),
    calls: compile_query(grammar, CALLS_QUERY),
    definitions: compile_query(grammar, DEFINITIONS_QUERY),
    types: compile_query(grammar, TYPES_QUERY),
    implements: compile_query(grammar, IMPLEMENTS_QUERY),
  }
}

#[cfg(test)]
mod tests {
  use crate::{Language, SourceParser};

  #[test]
  fn test_rust_imports() {
    let content = r#"
use std::collections::HashMap;
use crate::db::{Store, Chunk};
use super::utils;
use serde::{Deserialize, Serialize};
"#;
    let mut parser = SourceParser::new();
    let imports = parser.extract_imports(content, Language::Rust);
    let targets: Vec<_> = imports.iter().map(|i| i.target.as_str()).collect();

    assert!(targets.contains(&"std::collections::HashMap"), "imports: {:?}", targets);
    assert!(targets.contains(&"Store"), "imports: {:?}", targets);
    assert!(targets.contains(&"Chunk"), "imports: {:?}", targets);
    assert!(targets.contains(&"super::utils"), "imports: {:?}", targets);
    assert!(targets.contains(&"Deserialize"), "imports: {:?}", targets);
  }

  #[test]
  fn test_rust_calls() {
    let content = r#"
fn example() {
    let x = helper_fn();
    self.method_call();
    Module::associated_fn();
    obj.chain().calls();
    println!("macro");
    vec![];
}
"#;
    let mut parser = SourceParser::new();
    let calls = parser.extract_calls(content, Language::Rust);
    let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();

    assert!(names.contains(&"helper_fn"), "calls: {:?}", names);
    assert!(names.contains(&"method_call"), "calls: {:?}", names);
    assert!(names.contains(&"associated_fn"), "calls: {:?}", names);
    assert!(names.contains(&"chain"), "calls: {:?}", names);
    assert!(names.contains(&"calls"), "calls: {:?}", names);
    assert!(names.contains(&"println"), "calls: {:?}", names);
    assert!(names.contains(&"vec"), "calls: {:?}", names);
  }

  #[test]
  fn test_rust_definitions() {
    let content = r#"
pub fn my_function() {}

struct MyStruct {
    field: i32,
}

impl MyStruct {
    fn method(&self) {}
}

enum MyEnum {
    A,
    B,
}

trait MyTrait {
    fn trait_method(&self);
}

mod my_module {}

const MY_CONST: i32 = 42;
"#;
    let mut parser = SourceParser::new();
    let defs = parser.extract_definitions(content, Language::Rust);

    let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"my_function"), "defs: {:?}", names);
    assert!(names.contains(&"MyStruct"), "defs: {:?}", names);
    assert!(names.contains(&"method"), "defs: {:?}", names);
    assert!(names.contains(&"MyEnum"), "defs: {:?}", names);
    assert!(names.contains(&"MyTrait"), "defs: {:?}", names);
    assert!(names.contains(&"my_module"), "defs: {:?}", names);
    assert!(names.contains(&"MY_CONST"), "defs: {:?}", names);
  }

  #[test]
  fn test_rust_method_parent_is_impl_type() {
    let content = r#"
struct Store;

impl Store {
    fn open(&self) {}
}
"#;
    let mut parser = SourceParser::new();
    let defs = parser.extract_definitions(content, Language::Rust);
    let open = defs.iter().find(|d| d.name == "open").unwrap();
    assert_eq!(open.parent.as_deref(), Some("Store"));
  }

  #[test]
  fn test_rust_implements() {
    let content = r#"
struct Store;

impl Display for Store {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result { Ok(()) }
}
"#;
    let mut parser = SourceParser::new();
    let impls = parser.extract_implements(content, Language::Rust);

    assert_eq!(impls.len(), 1, "impls: {:?}", impls);
    assert_eq!(impls[0].type_name, "Store");
    assert_eq!(impls[0].trait_name, "Display");
  }

  #[test]
  fn test_rust_type_uses() {
    let content = r#"
fn build(cfg: Config) -> Engine {
    let store: Store = Store { path: cfg.path };
    Engine { store }
}
"#;
    let mut parser = SourceParser::new();
    let types = parser.extract_type_uses(content, Language::Rust);
    let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();

    assert!(names.contains(&"Config"), "types: {:?}", names);
    assert!(names.contains(&"Engine"), "types: {:?}", names);
    assert!(names.contains(&"Store"), "types: {:?}", names);
  }
}
