//! C tree-sitter queries

use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for C
const IMPORTS_QUERY: &str = r#"
; #include <stdio.h>
(preproc_include
  path: (system_lib_string) @import)

; #include "myheader.h"
(preproc_include
  path: (string_literal) @import)
"#;

/// Call extraction query for C
const CALLS_QUERY: &str = r#"
; Direct function calls: foo()
(call_expression
  function: (identifier) @call)

; Function pointer calls via field: obj->func()
(call_expression
  function: (field_expression
    field: (field_identifier) @call))
"#;

/// Definition extraction query for C
const DEFINITIONS_QUERY: &str = r#"
; Function definitions
(function_definition
  declarator: (function_declarator
    declarator: (identifier) @name)) @definition.function

; Function definitions with pointer return type
(function_definition
  declarator: (pointer_declarator
    declarator: (function_declarator
      declarator: (identifier) @name))) @definition.function

; Struct definitions
(struct_specifier
  name: (type_identifier) @name) @definition.struct

; Enum definitions
(enum_specifier
  name: (type_identifier) @name) @definition.enum

; Typedef
(type_definition
  declarator: (type_identifier) @name) @definition.type
"#;

/// Type mention query for C
const TYPES_QUERY: &str = r#"
; Declarations: Foo x;
(declaration
  type: (type_identifier) @type)

; Parameters: void f(Foo x)
(parameter_declaration
  type: (type_identifier) @type)

; Struct fields
(field_declaration
  type: (type_identifier) @type)
"#;

pub fn queries(grammar: &TsLanguage) -> LanguageQueries {
  LanguageQueries {
    imports: compile_query(grammar, IMPORTS_QUERY),
    calls: compile_query(grammar, CALLS_QUERY),
    definitions: compile_query(grammar, DEFINITIONS_QUERY),
    types: compile_query(grammar, TYPES_QUERY),
    implements: None,
  }
}

#[cfg(test)]
mod tests {
  use crate::{Language, SourceParser};

  #[test]
  fn test_c_imports() {
    let content = r#"
#include <stdio.h>
#include <stdlib.h>
#include "myheader.h"
"#;
    let mut parser = SourceParser::new();
    let imports = parser.extract_imports(content, Language::C);
    let targets: Vec<_> = imports.iter().map(|i| i.target.as_str()).collect();

    assert!(targets.contains(&"stdio.h"), "imports: {:?}", targets);
    assert!(targets.contains(&"myheader.h"), "imports: {:?}", targets);
  }

  #[test]
  fn test_c_calls() {
    let content = r#"
#include <assert.h>

int main() {
    assert(condition);
    printf("result: %d\n", x);
    handle->close(handle);
}
"#;
    let mut parser = SourceParser::new();
    let calls = parser.extract_calls(content, Language::C);
    let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();

    assert!(names.contains(&"assert"), "calls: {:?}", names);
    assert!(names.contains(&"printf"), "calls: {:?}", names);
    assert!(names.contains(&"close"), "calls: {:?}", names);
  }

  #[test]
  fn test_c_definitions() {
    let content = r#"
struct Config {
    int port;
};

typedef struct Config ConfigT;

int parse_config(const char *path) {
    return 0;
}
"#;
    let mut parser = SourceParser::new();
    let defs = parser.extract_definitions(content, Language::C);

    let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"Config"), "defs: {:?}", names);
    assert!(names.contains(&"parse_config"), "defs: {:?}", names);
  }
}
