//! TypeScript declaration locator built on tree-sitter.
//!
//! This crate finds the two declaration shapes the injector rewrites:
//!
//! - zod schema constants (`export const fooSchema = z.object({ ... })`)
//! - `async` request handlers registered with a server or placed in a
//!   routing map (`server.tool('name', 'desc', shape, async (args) => { ... })`)
//!
//! # Overview
//!
//! [`TsParser`] parses a file, rejects it if the tree contains a syntax
//! error, and hands it to the locator, which flattens the declarations into a
//! [`DeclArena`]. Delimiters inside strings, template literals and comments
//! never affect declaration boundaries because the boundaries come from the
//! syntax tree.
//!
//! ```
//! use bumpalo::Bump;
//! use ir_core::{DeclarationKind, RoutingConfig};
//! use ir_ts_parser::TsParser;
//!
//! let mut parser = TsParser::new()?;
//! let bump = Bump::new();
//! let source = r#"
//! export const listCardsSchema = z.object({ boardId: z.number() });
//!
//! server.tool('list-cards', 'List cards', listCardsSchema.shape, async ({ boardId }) => {
//!   return client.listCards(boardId);
//! });
//! "#;
//!
//! let located = parser.locate(source, &RoutingConfig::default(), &bump)?;
//! let kinds: Vec<_> = located.arena.declarations().map(|d| d.kind).collect();
//! assert_eq!(kinds, [DeclarationKind::Schema, DeclarationKind::Handler]);
//! # Ok::<(), ir_ts_parser::LocateError>(())
//! ```
//!
//! # Malformed Input
//!
//! A file whose tree contains an `ERROR` or `MISSING` node produces
//! [`LocateError::Malformed`] and no declarations:
//!
//! ```
//! use bumpalo::Bump;
//! use ir_core::RoutingConfig;
//! use ir_ts_parser::{LocateError, TsParser};
//!
//! let mut parser = TsParser::new()?;
//! let bump = Bump::new();
//! let result = parser.locate("const aSchema = z.object({", &RoutingConfig::default(), &bump);
//! assert!(matches!(result, Err(LocateError::Malformed { .. })));
//! # Ok::<(), ir_ts_parser::ParseError>(())
//! ```
//!
//! # Thread Safety
//!
//! [`TsParser`] is `Send` but not `Sync`; create one per worker thread. The
//! compiled queries are shared globally.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod arena;
pub mod error;
mod import;
pub mod locator;
mod parser;
pub mod queries;

use ir_core::{SourceLocation, Span};
use tree_sitter::Node;

pub use arena::{ArenaStr, DeclArena, NodeFlags, NodeId, NodeKind, StringInterner, SyntaxNode};
pub use error::{LocateError, ParseError};
pub use import::extract_import_clauses;
pub use locator::LocatedFile;
pub use parser::{Dialect, TsParser, ensure_well_formed};

// Re-export bumpalo for convenience (callers allocate the arena)
pub use bumpalo::Bump;

/// Extracts the text of a node.
pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> Option<&'a str> {
    std::str::from_utf8(source.get(node.start_byte()..node.end_byte())?).ok()
}

/// Converts a node's byte range to a [`Span`].
///
/// Source files are read into memory whole, so offsets fit in `u32`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn node_span(node: Node<'_>) -> Span {
    Span::new(node.start_byte() as u32, node.end_byte() as u32)
}

/// Converts a node's start position to a [`SourceLocation`].
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn node_to_location(node: Node<'_>) -> SourceLocation {
    let start = node.start_position();
    SourceLocation::new(
        start.row as u32 + 1, // Convert 0-indexed to 1-indexed
        start.column as u32,
        node.start_byte() as u32,
    )
}

/// Strips one layer of matching quotes from a string literal.
pub(crate) fn unquote(text: &str) -> &str {
    for quote in ['\'', '"', '`'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'get-board'"), "get-board");
        assert_eq!(unquote("\"x\""), "x");
        assert_eq!(unquote("`t`"), "t");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_node_helpers() {
        let mut parser = TsParser::new().expect("Parser creation failed");
        let source = "\n  const a = 1;";
        let tree = parser.parse(source).expect("Parse failed");
        let root = tree.root_node();
        let mut cursor = root.walk();
        let decl = root
            .named_children(&mut cursor)
            .next()
            .expect("declaration");

        assert_eq!(node_text(decl, source.as_bytes()), Some("const a = 1;"));
        assert_eq!(node_span(decl), Span::new(3, 15));
        assert_eq!(node_to_location(decl), SourceLocation::new(2, 2, 3));
    }
}
