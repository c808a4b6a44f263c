//! Go tree-sitter queries

use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for Go
const IMPORTS_QUERY: &str = r#"
; Single import: import "fmt"
(import_declaration
  (import_spec
    path: (interpreted_string_literal) @import))

; Import block: import ( "fmt" "os" )
(import_declaration
  (import_spec_list
    (import_spec
      path: (interpreted_string_literal) @import)))
"#;

/// Call extraction query for Go
const CALLS_QUERY: &str = r#"
; Direct function calls: foo()
(call_expression
  function: (identifier) @call)

; Package function and method calls: fmt.Println(), obj.Method()
(call_expression
  function: (selector_expression
    field: (field_identifier) @call))

; Chained calls: obj.Foo().Bar()
(call_expression
  function: (selector_expression
    operand: (call_expression)
    field: (field_identifier) @call))
"#;

/// Definition extraction query for Go
const DEFINITIONS_QUERY: &str = r#"
; Function declarations
(function_declaration
  name: (identifier) @name) @definition.function

; Method declarations - capture receiver type as parent
; e.g., func (r *Receiver) Method() - parent is "Receiver"
(method_declaration
  receiver: (parameter_list
    (parameter_declaration
      type: (pointer_type
        (type_identifier) @parent)))
  name: (field_identifier) @name) @definition.method

; Method declarations with value receiver
(method_declaration
  receiver: (parameter_list
    (parameter_declaration
      type: (type_identifier) @parent))
  name: (field_identifier) @name) @definition.method

; Type declarations (struct)
(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (struct_type))) @definition.struct

; Type declarations (interface)
(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (interface_type))) @definition.interface

; Type alias
(type_declaration
  (type_spec
    name: (type_identifier) @name)) @definition.type

; Const declarations
(const_declaration
  (const_spec
    name: (identifier) @name)) @definition.const

; Package-level var declarations
(source_file
  (var_declaration
    (var_spec
      name: (identifier) @name)) @definition.const)
"#;

/// Type mention query for Go
const TYPES_QUERY: &str = r#"
; Variable declarations: var x Foo
(var_declaration
  (var_spec
    type: (type_identifier) @type))

; Parameters: func f(x Foo)
(parameter_declaration
  type: (type_identifier) @type)

; Pointer parameters: func f(x *Foo)
(parameter_declaration
  type: (pointer_type
    (type_identifier) @type))

; Struct fields
(field_declaration
  type: (type_identifier) @type)

; Composite literals: Foo{...}
(composite_literal
  type: (type_identifier) @type)
"#;

pub fn queries(grammar: &TsLanguage) -> LanguageQueries {
  LanguageQueries {
    imports: compile_query(grammar, IMPORTS_QUERY),
    calls: compile_query(grammar, CALLS_QUERY),
    definitions: compile_query(grammar, DEFINITIONS_QUERY),
    types: compile_query(grammar, TYPES_QUERY),
    // Go interface satisfaction is implicit; no implement edges
    implements: None,
  }
}
