//! Python tree-sitter queries

use tree_sitter::Language as TsLanguage;

use super::{LanguageQueries, compile_query};

/// Import extraction query for Python
const IMPORTS_QUERY: &str = r#"
; import foo
(import_statement
  name: (dotted_name) @import)

; import foo as f
(import_statement
  name: (aliased_import
    name: (dotted_name) @import))

; from foo import bar
(import_from_statement
  module_name: (dotted_name) @import)

; from . import foo (relative imports)
(import_from_statement
  module_name: (relative_import) @import)
"#;

/// Call extraction query for Python
const CALLS_QUERY: &str = r#"
; Direct function calls: foo()
(call
  function: (identifier) @call)

; Method/attribute calls: obj.method()
(call
  function: (attribute
    attribute: (identifier) @call))

; Chained calls: obj.foo().bar()
(call
  function: (attribute
    object: (call)
    attribute: (identifier) @call))

; Decorators are effectively calls: @decorator, @property
(decorator
  (identifier) @call)

; Decorator with call: @decorator(arg)
(decorator
  (call
    function: (identifier) @call))

; Decorator with attribute: @module.decorator
(decorator
  (attribute
    attribute: (identifier) @call))
"#;

/// Definition extraction query for Python
const DEFINITIONS_QUERY: &str = r#"
; Functions
(function_definition
  name: (identifier) @name) @definition.function

; Classes
(class_definition
  name: (identifier) @name) @definition.class

; Methods inside class - capture class name as parent
(class_definition
  name: (identifier) @parent
  body: (block
    (function_definition
      name: (identifier) @name) @definition.method))
"#;

/// Type mention query for Python (annotations)
const TYPES_QUERY: &str = r#"
; Parameter annotations: def f(x: Foo)
(typed_parameter
  type: (type
    (identifier) @type))

; Return annotations: def f() -> Foo
(function_definition
  return_type: (type
    (identifier) @type))
"#;

/// Class inheritance markers: class Foo(Base)
const IMPLEMENTS_QUERY: &str = r#"
(class_definition
  name: (identifier) @type
  superclasses: (argument_list
    (identifier) @trait))
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
  fn test_python_imports() {
    let content = r#"
import os
import sys
from pathlib import Path
from typing import Optional, List
from . import sibling
"#;
    let mut parser = SourceParser::new();
    let imports = parser.extract_imports(content, Language::Python);
    let targets: Vec<_> = imports.iter().map(|i| i.target.as_str()).collect();

    assert!(targets.contains(&"os"), "imports: {:?}", targets);
    assert!(targets.contains(&"sys"), "imports: {:?}", targets);
    assert!(targets.contains(&"pathlib"), "imports: {:?}", targets);
    assert!(targets.contains(&"typing"), "imports: {:?}", targets);
  }

  #[test]
  fn test_python_calls() {
    let content = r#"
def example():
    result = helper_fn()
    obj.method_call()
    data = json.loads(text)
    chain.foo().bar()
    print("hello")
"#;
    let mut parser = SourceParser::new();
    let calls = parser.extract_calls(content, Language::Python);
    let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();

    assert!(names.contains(&"helper_fn"), "calls: {:?}", names);
    assert!(names.contains(&"method_call"), "calls: {:?}", names);
    assert!(names.contains(&"loads"), "calls: {:?}", names);
    assert!(names.contains(&"foo"), "calls: {:?}", names);
    assert!(names.contains(&"bar"), "calls: {:?}", names);
    assert!(names.contains(&"print"), "calls: {:?}", names);
  }

  #[test]
  fn test_python_definitions() {
    let content = r#"
def my_function():
    pass

async def async_function():
    pass

class MyClass:
    def method(self):
        pass
"#;
    let mut parser = SourceParser::new();
    let defs = parser.extract_definitions(content, Language::Python);

    let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
    assert!(names.contains(&"my_function"), "defs: {:?}", names);
    assert!(names.contains(&"async_function"), "defs: {:?}", names);
    assert!(names.contains(&"MyClass"), "defs: {:?}", names);
    assert!(names.contains(&"method"), "defs: {:?}", names);
  }

  #[test]
  fn test_python_method_parent_detection() {
    let content = r#"
class UserService:
    def __init__(self, db):
        self.db = db

    def save_user(self, user):
        return self.db.insert(user)

def standalone_function():
    pass
"#;
    let mut parser = SourceParser::new();
    let defs = parser.extract_definitions(content, Language::Python);

    let save_method = defs.iter().find(|d| d.name == "save_user");
    assert!(save_method.is_some(), "should find save_user method, defs: {:?}", defs);
    assert_eq!(
      save_method.unwrap().parent.as_deref(),
      Some("UserService"),
      "save_user should have UserService as parent"
    );

    let standalone = defs.iter().find(|d| d.name == "standalone_function");
    assert!(standalone.is_some(), "should find standalone_function");
    assert_eq!(standalone.unwrap().parent, None, "standalone function should have no parent");
  }

  #[test]
  fn test_python_inheritance_as_implements() {
    let content = r#"
class JsonStore(BaseStore):
    def save(self):
        pass
"#;
    let mut parser = SourceParser::new();
    let impls = parser.extract_implements(content, Language::Python);

    assert_eq!(impls.len(), 1, "impls: {:?}", impls);
    assert_eq!(impls[0].type_name, "JsonStore");
    assert_eq!(impls[0].trait_name, "BaseStore");
  }
}
