//! Pre-compiled tree-sitter queries for import and declaration discovery.
//!
//! Queries are compiled once per dialect and cached for the lifetime of the
//! process. Capture names, not indices, identify captures, so patterns can be
//! reordered freely.

use std::sync::OnceLock;

use tree_sitter::{Language, Query};

use crate::error::ParseError;
use crate::parser::Dialect;

/// Tree-sitter query for top-level import statements.
///
/// # Capture Names
///
/// - `import.statement` - The full `import_statement` node
/// - `import.source` - The module specifier string literal
pub const IMPORT_QUERY: &str = r"
(program
  (import_statement
    source: (string) @import.source) @import.statement)
";

/// Tree-sitter query for schema, handler and call-site candidates.
///
/// # Capture Names
///
/// - `schema.declarator` - A program-level `variable_declarator`
/// - `schema.name` - Its bound identifier
/// - `schema.value` - Its initializer call
/// - `handler.function` - An arrow function with a block body
/// - `call.expression` - A call of the form `obj.method(arg)`
/// - `call.object` - The receiver identifier
/// - `call.argument` - The sole argument identifier
pub const LOCATOR_QUERY: &str = r"
; Program-level bindings: const fooSchema = z.object(...)
(program
  (lexical_declaration
    (variable_declarator
      name: (identifier) @schema.name
      value: (call_expression) @schema.value) @schema.declarator))

; Exported bindings: export const fooSchema = z.object(...)
(program
  (export_statement
    declaration: (lexical_declaration
      (variable_declarator
        name: (identifier) @schema.name
        value: (call_expression) @schema.value) @schema.declarator)))

; Arrow functions with a block body (async is checked in code)
(arrow_function
  body: (statement_block)) @handler.function

; Single-argument method calls: client.getBoards(params)
(call_expression
  function: (member_expression
    object: (identifier) @call.object)
  arguments: (arguments
    .
    (identifier) @call.argument
    .)) @call.expression
";

static IMPORT_QUERY_TS: OnceLock<Query> = OnceLock::new();
static IMPORT_QUERY_TSX: OnceLock<Query> = OnceLock::new();
static LOCATOR_QUERY_TS: OnceLock<Query> = OnceLock::new();
static LOCATOR_QUERY_TSX: OnceLock<Query> = OnceLock::new();

/// Returns the compiled import query for `dialect`.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn import_query(dialect: Dialect) -> Result<&'static Query, ParseError> {
    let cache = match dialect {
        Dialect::TypeScript => &IMPORT_QUERY_TS,
        Dialect::Tsx => &IMPORT_QUERY_TSX,
    };
    cached(cache, dialect, IMPORT_QUERY)
}

/// Returns the compiled locator query for `dialect`.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn locator_query(dialect: Dialect) -> Result<&'static Query, ParseError> {
    let cache = match dialect {
        Dialect::TypeScript => &LOCATOR_QUERY_TS,
        Dialect::Tsx => &LOCATOR_QUERY_TSX,
    };
    cached(cache, dialect, LOCATOR_QUERY)
}

fn cached(
    cache: &'static OnceLock<Query>,
    dialect: Dialect,
    source: &str,
) -> Result<&'static Query, ParseError> {
    if let Some(query) = cache.get() {
        return Ok(query);
    }

    let query = compile_query(&dialect.language(), source)?;
    Ok(cache.get_or_init(|| query))
}

/// Compiles a query for the given language.
fn compile_query(language: &Language, source: &str) -> Result<Query, ParseError> {
    Query::new(language, source).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        kind: e,
    })
}

/// Returns the capture name for a given capture index.
#[inline]
pub fn capture_name(query: &Query, index: u32) -> Option<&str> {
    query.capture_names().get(index as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_compile_for_both_dialects() {
        for dialect in [Dialect::TypeScript, Dialect::Tsx] {
            assert!(
                import_query(dialect).is_ok(),
                "import query for {dialect:?}"
            );
            assert!(
                locator_query(dialect).is_ok(),
                "locator query for {dialect:?}"
            );
        }
    }

    #[test]
    fn test_locator_capture_names() {
        let query = locator_query(Dialect::TypeScript).expect("Query should compile");
        let names = query.capture_names();
        for expected in [
            "schema.declarator",
            "schema.name",
            "schema.value",
            "handler.function",
            "call.expression",
            "call.object",
            "call.argument",
        ] {
            assert!(names.contains(&expected), "missing capture {expected}");
        }
    }

    #[test]
    fn test_query_pattern_count() {
        let query = locator_query(Dialect::TypeScript).expect("Query should compile");
        assert_eq!(query.pattern_count(), 4);

        let query = import_query(Dialect::Tsx).expect("Query should compile");
        assert_eq!(query.pattern_count(), 1);
    }

    #[test]
    fn test_capture_name_out_of_range() {
        let query = import_query(Dialect::TypeScript).expect("Query should compile");
        assert_eq!(capture_name(query, 99), None);
    }
}
