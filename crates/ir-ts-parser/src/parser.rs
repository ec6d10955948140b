//! TypeScript parser management using tree-sitter.
//!
//! This module provides [`TsParser`], which parses a file, rejects malformed
//! input and hands the tree to the locator.

use bumpalo::Bump;
use ir_core::RoutingConfig;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{LocateError, ParseError};
use crate::locator::{LocatedFile, locate};
use crate::node_to_location;

/// The grammar a file is parsed with.
///
/// ```
/// use ir_ts_parser::Dialect;
///
/// assert_eq!(Dialect::from_extension("tsx"), Dialect::Tsx);
/// assert_eq!(Dialect::from_extension("ts"), Dialect::TypeScript);
/// assert_eq!(Dialect::from_extension("mts"), Dialect::TypeScript);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`).
    #[default]
    TypeScript,
    /// TypeScript with JSX (`.tsx`).
    Tsx,
}

impl Dialect {
    /// Picks the dialect for a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("tsx") {
            Self::Tsx
        } else {
            Self::TypeScript
        }
    }

    /// Returns the tree-sitter language for this dialect.
    #[must_use]
    pub fn language(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// TypeScript parser for locating injectable declarations.
///
/// Wraps a tree-sitter parser. The parser can be reused for many files and
/// switches grammar when a file's dialect differs from the previous one.
///
/// # Thread Safety
///
/// `TsParser` is `Send` but not `Sync`. For parallel runs with rayon, create
/// one parser per worker (for example with `map_init`). The compiled queries
/// are shared across all parsers.
///
/// # Examples
///
/// ```
/// use bumpalo::Bump;
/// use ir_core::RoutingConfig;
/// use ir_ts_parser::TsParser;
///
/// let mut parser = TsParser::new()?;
/// let bump = Bump::new();
/// let source = "export const boardSchema = z.object({ boardId: z.string() });";
///
/// let located = parser.locate(source, &RoutingConfig::default(), &bump)?;
/// let names: Vec<_> = located.arena.declarations().map(|d| d.name).collect();
/// assert_eq!(names, ["boardSchema"]);
/// # Ok::<(), ir_ts_parser::LocateError>(())
/// ```
pub struct TsParser {
    parser: Parser,
    dialect: Dialect,
}

impl TsParser {
    /// Creates a parser for plain TypeScript.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn new() -> Result<Self, ParseError> {
        Self::for_dialect(Dialect::TypeScript)
    }

    /// Creates a parser for TSX.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn new_tsx() -> Result<Self, ParseError> {
        Self::for_dialect(Dialect::Tsx)
    }

    /// Creates a parser for the given dialect.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn for_dialect(dialect: Dialect) -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|_| ParseError::LanguageInit)?;
        Ok(Self { parser, dialect })
    }

    /// Returns the dialect the parser is currently configured for.
    #[inline]
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Switches the parser to `dialect` if it is not already using it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the grammar cannot be loaded.
    pub fn set_dialect(&mut self, dialect: Dialect) -> Result<(), ParseError> {
        if self.dialect != dialect {
            self.parser
                .set_language(&dialect.language())
                .map_err(|_| ParseError::LanguageInit)?;
            self.dialect = dialect;
        }
        Ok(())
    }

    /// Parses source code into a syntax tree.
    ///
    /// The tree may contain error nodes; use [`check`](Self::check) or
    /// [`locate`](Self::locate) to reject malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Parse`] if tree-sitter produces no tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser.parse(source, None).ok_or(ParseError::Parse)
    }

    /// Parses source code and fails if it contains a syntax error.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::Malformed`] pointing at the first error node.
    pub fn check(&mut self, source: &str) -> Result<Tree, LocateError> {
        let tree = self.parse(source)?;
        ensure_well_formed(&tree, source)?;
        Ok(tree)
    }

    /// Parses source code and locates every schema and handler declaration.
    ///
    /// # Errors
    ///
    /// - [`LocateError::Malformed`] if the file contains a syntax error
    /// - [`LocateError::Parse`] if the parser or a query fails
    pub fn locate<'bump>(
        &mut self,
        source: &str,
        routing: &RoutingConfig,
        bump: &'bump Bump,
    ) -> Result<LocatedFile<'bump>, LocateError> {
        let tree = self.check(source)?;
        locate(&tree, source, self.dialect, routing, bump)
    }
}

impl std::fmt::Debug for TsParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsParser")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

/// Fails with [`LocateError::Malformed`] if the tree contains an error node.
///
/// # Errors
///
/// Returns [`LocateError::Malformed`] describing the first `ERROR` or
/// `MISSING` node in document order.
pub fn ensure_well_formed(tree: &Tree, source: &str) -> Result<(), LocateError> {
    let root = tree.root_node();
    if !root.has_error() {
        return Ok(());
    }

    let node = first_error(root).unwrap_or(root);
    Err(LocateError::Malformed {
        location: node_to_location(node),
        detail: describe_error(node, source),
    })
}

/// Finds the first `ERROR` or `MISSING` node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn describe_error(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing \"{}\"", node.kind());
    }

    let text = source.get(node.byte_range()).unwrap_or_default();
    let snippet: String = text
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(32)
        .collect();
    if snippet.is_empty() {
        "unexpected end of input".to_owned()
    } else {
        format!("unexpected \"{snippet}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_new() {
        assert!(TsParser::new().is_ok());
        assert!(TsParser::new_tsx().is_ok());
    }

    #[test]
    fn test_set_dialect_switches_grammar() {
        let mut parser = TsParser::new().expect("Parser creation failed");
        let jsx = "const App = () => <div>Hello</div>;";
        assert!(parser.check(jsx).is_err());

        parser.set_dialect(Dialect::Tsx).expect("switch to tsx");
        assert_eq!(parser.dialect(), Dialect::Tsx);
        assert!(parser.check(jsx).is_ok());
    }

    #[test]
    fn test_check_accepts_braces_in_strings() {
        let mut parser = TsParser::new().expect("Parser creation failed");
        let source = "const s = '{ not a block'; // }\nconst t = `${'}'}`;\n";
        assert!(parser.check(source).is_ok());
    }

    #[test]
    fn test_check_reports_unclosed_brace() {
        let mut parser = TsParser::new().expect("Parser creation failed");
        let source = "export const aSchema = z.object({\n  a: z.string(),\n";
        let err = parser.check(source).expect_err("unclosed object");
        assert!(
            matches!(&err, LocateError::Malformed { location, .. } if location.line >= 1),
            "expected malformed error, got {err:?}"
        );
    }

    #[test]
    fn test_check_empty_source() {
        let mut parser = TsParser::new().expect("Parser creation failed");
        assert!(parser.check("").is_ok());
    }

    #[test]
    fn test_parser_debug() {
        let parser = TsParser::new_tsx().expect("Parser creation failed");
        let debug = format!("{parser:?}");
        assert!(debug.contains("TsParser"));
        assert!(debug.contains("Tsx"));
    }
}
