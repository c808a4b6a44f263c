//! Java tree-sitter queries

use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for Java
const IMPORTS_QUERY: &str = r#"
; import java.util.List;
(import_declaration
  (scoped_identifier) @import)
"#;

/// Call extraction query for Java
const CALLS_QUERY: &str = r#"
; Method calls: foo(), obj.method(), Class.method()
(method_invocation
  name: (identifier) @call)

; Constructor calls: new MyClass()
(object_creation_expression
  type: (type_identifier) @call)
"#;

/// Definition extraction query for Java
const DEFINITIONS_QUERY: &str = r#"
; Class declarations
(class_declaration
  name: (identifier) @name) @definition.class

; Interface declarations
(interface_declaration
  name: (identifier) @name) @definition.interface

; Enum declarations
(enum_declaration
  name: (identifier) @name) @definition.enum

; Method declarations inside class - capture class name as parent
(class_declaration
  name: (identifier) @parent
  body: (class_body
    (method_declaration
      name: (identifier) @name) @definition.method))

; Constructor declarations inside class - capture class name as parent
(class_declaration
  name: (identifier) @parent
  body: (class_body
    (constructor_declaration
      name: (identifier) @name) @definition.method))

; Field declarations (constants)
(field_declaration
  declarator: (variable_declarator
    name: (identifier) @name)) @definition.const
"#;

/// Type mention query for Java
const TYPES_QUERY: &str = r#"
; Local variables: Foo x = ...
(local_variable_declaration
  type: (type_identifier) @type)

; Parameters: void f(Foo x)
(formal_parameter
  type: (type_identifier) @type)

; Fields
(field_declaration
  type: (type_identifier) @type)
"#;

/// Implementation markers for Java: class Foo implements Bar
const IMPLEMENTS_QUERY: &str = r#"
(class_declaration
  name: (identifier) @type
  interfaces: (super_interfaces
    (type_list
      (type_identifier) @trait)))
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
