//! Import clause extraction from TypeScript source using tree-sitter queries.
//!
//! Each top-level `import` statement becomes an [`ImportClause`] that records
//! its kind, the names it binds and the byte spans needed to merge a new name
//! into it.

use ir_core::{ImportClause, ImportKind, Span};
use smallvec::SmallVec;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use crate::queries::capture_name;
use crate::{node_span, node_text};

/// Extracts every top-level import clause, in source order.
///
/// # Examples
///
/// ```
/// use ir_core::ImportKind;
/// use ir_ts_parser::{Dialect, TsParser, extract_import_clauses, queries};
///
/// let mut parser = TsParser::new()?;
/// let source = "import { a, b } from './common-schemas.js';";
/// let tree = parser.parse(source)?;
/// let query = queries::import_query(Dialect::TypeScript)?;
///
/// let clauses = extract_import_clauses(&tree, source, query);
/// assert_eq!(clauses[0].kind, ImportKind::Named);
/// assert_eq!(clauses[0].module_specifier, "./common-schemas.js");
/// # Ok::<(), ir_ts_parser::ParseError>(())
/// ```
pub fn extract_import_clauses(
    tree: &Tree,
    source: &str,
    query: &Query,
) -> SmallVec<[ImportClause; 8]> {
    let bytes = source.as_bytes();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), bytes);

    let mut clauses: SmallVec<[ImportClause; 8]> = SmallVec::new();
    while let Some(m) = matches.next() {
        let mut statement = None;
        let mut specifier = None;
        for capture in m.captures {
            match capture_name(query, capture.index) {
                Some("import.statement") => statement = Some(capture.node),
                Some("import.source") => specifier = Some(capture.node),
                _ => {}
            }
        }
        if let (Some(statement), Some(specifier)) = (statement, specifier) {
            if let Some(clause) = ClauseBuilder::new(statement, specifier, bytes).build() {
                clauses.push(clause);
            }
        }
    }

    clauses.sort_by_key(|c| c.span.start);
    clauses
}

/// Collects the parts of one `import_statement`.
struct ClauseBuilder<'t, 's> {
    statement: Node<'t>,
    specifier: Node<'t>,
    source: &'s [u8],
    names: SmallVec<[String; 4]>,
    default_span: Option<Span>,
    named_span: Option<Span>,
    last_named: Option<Span>,
    trailing_comma: bool,
    namespace: bool,
}

impl<'t, 's> ClauseBuilder<'t, 's> {
    fn new(statement: Node<'t>, specifier: Node<'t>, source: &'s [u8]) -> Self {
        Self {
            statement,
            specifier,
            source,
            names: SmallVec::new(),
            default_span: None,
            named_span: None,
            last_named: None,
            trailing_comma: false,
            namespace: false,
        }
    }

    fn build(mut self) -> Option<ImportClause> {
        let quoted = node_text(self.specifier, self.source)?;
        let quote = quoted.chars().next().unwrap_or('\'');
        let module_specifier = quoted.trim_matches(|c| c == '\'' || c == '"').to_owned();

        let mut type_only = false;
        let mut has_clause = false;
        let mut cursor = self.statement.walk();
        for child in self.statement.children(&mut cursor) {
            match child.kind() {
                "type" | "typeof" => type_only = true,
                "import_clause" => {
                    has_clause = true;
                    self.read_clause(child);
                }
                _ => {}
            }
        }

        let kind = if type_only {
            ImportKind::TypeOnly
        } else if self.namespace {
            ImportKind::Namespace
        } else if !has_clause {
            ImportKind::SideEffect
        } else {
            match (self.default_span.is_some(), self.named_span.is_some()) {
                (true, true) => ImportKind::DefaultAndNamed,
                (true, false) => ImportKind::Default,
                _ => ImportKind::Named,
            }
        };

        Some(ImportClause {
            module_specifier,
            kind,
            names: self.names,
            span: node_span(self.statement),
            named_span: self.named_span,
            last_named: self.last_named,
            trailing_comma: self.trailing_comma,
            default_span: self.default_span,
            quote,
        })
    }

    fn read_clause(&mut self, clause: Node<'t>) {
        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    self.default_span = Some(node_span(child));
                    self.push_name(child);
                }
                "namespace_import" => {
                    self.namespace = true;
                    let mut inner = child.walk();
                    if let Some(ident) = child
                        .named_children(&mut inner)
                        .find(|n| n.kind() == "identifier")
                    {
                        self.push_name(ident);
                    }
                }
                "named_imports" => self.read_named(child),
                _ => {}
            }
        }
    }

    fn read_named(&mut self, list: Node<'t>) {
        self.named_span = Some(node_span(list));

        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            match child.kind() {
                "import_specifier" => {
                    let local = child
                        .child_by_field_name("alias")
                        .or_else(|| child.child_by_field_name("name"));
                    if let Some(local) = local {
                        self.push_name(local);
                    }
                    self.last_named = Some(node_span(child));
                    self.trailing_comma = false;
                }
                "," => self.trailing_comma = true,
                _ => {}
            }
        }
    }

    fn push_name(&mut self, node: Node<'_>) {
        if let Some(text) = node_text(node, self.source) {
            self.names.push(text.to_owned());
        }
    }
}
