//! C++ tree-sitter queries

use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for C++
const IMPORTS_QUERY: &str = r#"
; #include <iostream>
(preproc_include
  path: (system_lib_string) @import)

; #include "myheader.hpp"
(preproc_include
  path: (string_literal) @import)

; using std::cout;
(using_declaration
  (qualified_identifier) @import)
"#;

/// Call extraction query for C++
const CALLS_QUERY: &str = r#"
; Direct function calls: foo()
(call_expression
  function: (identifier) @call)

; Method calls: obj.method(), ptr->method()
(call_expression
  function: (field_expression
    field: (field_identifier) @call))

; Namespaced calls: std::sort()
(call_expression
  function: (qualified_identifier
    name: (identifier) @call))

; Template function calls: make_shared<T>()
(call_expression
  function: (template_function
    name: (identifier) @call))
"#;

/// Definition extraction query for C++
const DEFINITIONS_QUERY: &str = r#"
; Function definitions
(function_definition
  declarator: (function_declarator
    declarator: (identifier) @name)) @definition.function

; Method definitions outside class (MyClass::method) - extract class name as parent
(function_definition
  declarator: (function_declarator
    declarator: (qualified_identifier
      scope: (namespace_identifier) @parent
      name: (identifier) @name))) @definition.method

; Class definitions
(class_specifier
  name: (type_identifier) @name) @definition.class

; Struct definitions
(struct_specifier
  name: (type_identifier) @name) @definition.struct

; Enum definitions
(enum_specifier
  name: (type_identifier) @name) @definition.enum

; Namespace definitions (C++ uses namespace_identifier)
(namespace_definition
  name: (namespace_identifier) @name) @definition.module
"#;

/// Type mention query for C++
const TYPES_QUERY: &str = r#"
; Declarations: Foo x;
(declaration
  type: (type_identifier) @type)

; Parameters: void f(Foo x)
(parameter_declaration
  type: (type_identifier) @type)

; Fields
(field_declaration
  type: (type_identifier) @type)
"#;

/// Base class markers: class Foo : public Bar
const IMPLEMENTS_QUERY: &str = r#"
(class_specifier
  name: (type_identifier) @type
  (base_class_clause
    (type_identifier) @trait))
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
  fn test_cpp_imports() {
    let content = r#"
#include <iostream>
#include <vector>
#include "myheader.hpp"
"#;
    let mut parser = SourceParser::new();
    let imports = parser.extract_imports(content, Language::Cpp);
    let targets: Vec<_> = imports.iter().map(|i| i.target.as_str()).collect();

    assert!(targets.contains(&"iostream"), "imports: {:?}", targets);
    assert!(targets.contains(&"myheader.hpp"), "imports: {:?}", targets);
  }

  #[test]
  fn test_cpp_calls() {
    let content = r#"
#include <memory>

void example() {
    auto ptr = std::make_shared<MyClass>(args);
    std::sort(vec.begin(), vec.end());
    obj.process();
}
"#;
    let mut parser = SourceParser::new();
    let calls = parser.extract_calls(content, Language::Cpp);
    let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();

    assert!(names.contains(&"sort"), "calls: {:?}", names);
    assert!(names.contains(&"begin"), "calls: {:?}", names);
    assert!(names.contains(&"process"), "calls: {:?}", names);
  }

  #[test]
  fn test_cpp_definitions() {
    let content = r#"
class Engine {
public:
    void run();
};

void Engine::run() {
    step();
}

struct Config {
    int port;
};
"#;
    let mut parser = SourceParser::new();
    let defs = parser.extract_definitions(content, Language::Cpp);

    let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"Engine"), "defs: {:?}", names);
    assert!(names.contains(&"run"), "defs: {:?}", names);
    assert!(names.contains(&"Config"), "defs: {:?}", names);

    let run = defs.iter().find(|d| d.name == "run").unwrap();
    assert_eq!(run.parent.as_deref(), Some("Engine"));
  }
}
