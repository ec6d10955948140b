//! Declaration locator.
//!
//! Walks a well-formed syntax tree and records every schema and handler
//! declaration in a [`DeclArena`], together with the file's import clauses
//! and the names it declares at program level.
//!
//! # Candidates
//!
//! - **Schema**: a program-level `const` (optionally exported) whose value is
//!   a call to the schema factory with a single object-literal argument,
//!   possibly followed by method calls (`z.object({...}).strict()`). Only
//!   names ending in the schema suffix qualify.
//! - **Handler**: an `async` arrow function with a block body that is either
//!   the value of an object-literal property or the last of several arguments
//!   of a registering call (`server.tool('name', 'desc', shape, async () => {})`).
//!   Handlers nested inside another handler are part of it, not candidates.

use bumpalo::Bump;
use ir_core::{FxHashSet, ImportClause, RoutingConfig};
use smallvec::SmallVec;
use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::arena::{ArenaStr, DeclArena, NodeFlags, NodeId, NodeKind, SyntaxNode};
use crate::error::LocateError;
use crate::import::extract_import_clauses;
use crate::parser::Dialect;
use crate::queries::{capture_name, import_query, locator_query};
use crate::{node_span, node_text, node_to_location, unquote};

/// Everything the rewriters need to know about one file.
#[derive(Debug)]
pub struct LocatedFile<'bump> {
    /// Schema and handler declarations.
    pub arena: DeclArena<'bump>,

    /// Top-level import clauses in source order.
    pub imports: SmallVec<[ImportClause; 8]>,

    /// Value names declared at program level (`const`, `function`, `class`).
    pub program_names: FxHashSet<ArenaStr<'bump>>,

    /// The grammar the file was parsed with.
    pub dialect: Dialect,
}

impl LocatedFile<'_> {
    /// Returns `true` if the file declares `name` at program level.
    #[inline]
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.program_names.contains(name)
    }

    /// Returns `true` if the file has no schema or handler declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.roots().next().is_none()
    }

    /// Returns `true` if every declaration already carries the marker.
    ///
    /// Vacuously `true` for a file without declarations.
    #[must_use]
    pub fn all_injected(&self) -> bool {
        self.arena
            .roots()
            .all(|id| self.arena.node(id).has(NodeFlags::INJECTED))
    }
}

const FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
    "method_definition",
];

/// A single-argument method call found anywhere in the file.
#[derive(Debug, Clone, Copy)]
struct CallSite<'t> {
    call: Node<'t>,
    object: Node<'t>,
    argument: Node<'t>,
}

/// A declaration candidate, ordered by its start byte.
#[derive(Debug, Clone, Copy)]
enum Candidate<'t> {
    Schema {
        declarator: Node<'t>,
        name: Node<'t>,
        value: Node<'t>,
    },
    Handler(Node<'t>),
}

impl Candidate<'_> {
    fn start(&self) -> usize {
        match self {
            Self::Schema { declarator, .. } => declarator.start_byte(),
            Self::Handler(node) => node.start_byte(),
        }
    }
}

/// Locates declarations in a tree that has already been checked for errors.
///
/// # Errors
///
/// Returns [`LocateError::Parse`] if a query fails to compile.
pub fn locate<'bump>(
    tree: &Tree,
    source: &str,
    dialect: Dialect,
    routing: &RoutingConfig,
    bump: &'bump Bump,
) -> Result<LocatedFile<'bump>, LocateError> {
    let bytes = source.as_bytes();
    let root = tree.root_node();
    let query = locator_query(dialect)?;

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    let mut calls: Vec<CallSite<'_>> = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, bytes);
    while let Some(m) = matches.next() {
        let mut declarator = None;
        let mut name = None;
        let mut value = None;
        let mut handler = None;
        let mut call = None;
        let mut object = None;
        let mut argument = None;

        for capture in m.captures {
            let node = capture.node;
            match capture_name(query, capture.index) {
                Some("schema.declarator") => declarator = Some(node),
                Some("schema.name") => name = Some(node),
                Some("schema.value") => value = Some(node),
                Some("handler.function") => handler = Some(node),
                Some("call.expression") => call = Some(node),
                Some("call.object") => object = Some(node),
                Some("call.argument") => argument = Some(node),
                _ => {}
            }
        }

        if let (Some(declarator), Some(name), Some(value)) = (declarator, name, value) {
            candidates.push(Candidate::Schema {
                declarator,
                name,
                value,
            });
        }
        if let Some(handler) = handler.filter(|&n| is_handler_candidate(n)) {
            candidates.push(Candidate::Handler(handler));
        }
        if let (Some(call), Some(object), Some(argument)) = (call, object, argument) {
            calls.push(CallSite {
                call,
                object,
                argument,
            });
        }
    }

    candidates.sort_by_key(Candidate::start);

    let mut locator = Locator {
        source: bytes,
        routing,
        arena: DeclArena::new(bump),
    };

    let mut handler_end = 0;
    for candidate in candidates {
        match candidate {
            Candidate::Schema {
                declarator,
                name,
                value,
            } => locator.push_schema(declarator, name, value),
            Candidate::Handler(func) => {
                if func.start_byte() < handler_end {
                    continue;
                }
                handler_end = func.end_byte();
                locator.push_handler(func, &calls);
            }
        }
    }

    let program_names = locator.program_names(root);
    let imports = extract_import_clauses(tree, source, import_query(dialect)?);

    Ok(LocatedFile {
        arena: locator.arena,
        imports,
        program_names,
        dialect,
    })
}

struct Locator<'a, 'bump> {
    source: &'a [u8],
    routing: &'a RoutingConfig,
    arena: DeclArena<'bump>,
}

impl<'a, 'bump> Locator<'a, 'bump> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.source).unwrap_or_default()
    }

    fn push_schema(&mut self, declarator: Node<'_>, name: Node<'_>, value: Node<'_>) {
        let name = self.text(name);
        if !self.routing.is_schema_name(name) {
            return;
        }
        let Some(object) = schema_object(value, self.source, &self.routing.schema_factory) else {
            return;
        };

        let interned = self.arena.intern(name);
        let root = self.arena.push_root(
            SyntaxNode::new(
                NodeKind::Schema,
                node_span(declarator),
                node_to_location(declarator),
            )
            .named(interned),
        );
        let body = self.arena.push_child(
            root,
            SyntaxNode::new(
                NodeKind::ObjectBody,
                node_span(object),
                node_to_location(object),
            )
            .anchored(node_span(object).end.saturating_sub(1)),
        );

        let mut injected = false;
        let mut trailing_comma = false;
        let mut cursor = object.walk();
        for child in object.children(&mut cursor) {
            match child.kind() {
                "," => trailing_comma = true,
                "comment" => {}
                _ if child.is_named() => {
                    trailing_comma = false;
                    let spread = child.kind() == "spread_element";
                    let member = self.member_name(child);
                    injected |= if spread {
                        member == self.routing.spread_symbol
                    } else {
                        member == self.routing.routing_field
                    };

                    let interned = self.arena.intern(member);
                    let mut node =
                        SyntaxNode::new(NodeKind::Member, node_span(child), node_to_location(child))
                            .named(interned);
                    node.flags.set(NodeFlags::SPREAD, spread);
                    self.arena.push_child(body, node);
                }
                _ => {}
            }
        }

        self.arena
            .node_mut(body)
            .flags
            .set(NodeFlags::TRAILING_COMMA, trailing_comma);
        self.arena
            .node_mut(root)
            .flags
            .set(NodeFlags::INJECTED, injected);

        debug!(name, kind = "schema", injected, "located declaration");
    }

    fn member_name(&self, member: Node<'_>) -> &'a str {
        let key = match member.kind() {
            "pair" => member.child_by_field_name("key"),
            "method_definition" => member.child_by_field_name("name"),
            "spread_element" => first_named(member),
            _ => Some(member),
        };
        key.map_or("", |k| unquote(self.text(k)))
    }

    fn push_handler(&mut self, func: Node<'_>, calls: &[CallSite<'_>]) {
        let name = handler_name(func, self.source);
        let (binds_routing, resolves) = self.scan_markers(func);

        let interned = self.arena.intern(name);
        let mut node = SyntaxNode::new(NodeKind::Handler, node_span(func), node_to_location(func))
            .named(interned);
        node.flags.set(NodeFlags::BINDS_ROUTING, binds_routing);
        node.flags.set(NodeFlags::INJECTED, binds_routing || resolves);
        let root = self.arena.push_root(node);

        let positional = self.push_params(root, func);

        let Some(body) = func.child_by_field_name("body") else {
            return;
        };

        let sites: SmallVec<[Node<'_>; 4]> = positional
            .map(|param| {
                calls
                    .iter()
                    .filter(|site| {
                        encloses(body, site.call)
                            && self.text(site.object) == self.routing.client_binding
                            && self.text(site.argument) == param
                            && !is_shadowed(site.call, func, param, self.source)
                    })
                    .map(|site| site.argument)
                    .collect()
            })
            .unwrap_or_default();

        self.push_block(root, body, &sites);

        for argument in sites {
            let param = self.text(argument);
            let interned = self.arena.intern(param);
            self.arena.push_child(
                root,
                SyntaxNode::new(
                    NodeKind::CallArgument,
                    node_span(argument),
                    node_to_location(argument),
                )
                .named(interned),
            );
        }

        debug!(
            name,
            kind = "handler",
            injected = binds_routing || resolves,
            "located declaration"
        );
    }

    /// Records the parameter list; returns the positional parameter name.
    fn push_params(&mut self, root: NodeId, func: Node<'_>) -> Option<&'a str> {
        if let Some(ident) = func.child_by_field_name("parameter") {
            let name = self.text(ident);
            let list = self.arena.push_child(
                root,
                SyntaxNode::new(
                    NodeKind::ParamList,
                    node_span(ident),
                    node_to_location(ident),
                ),
            );
            let interned = self.arena.intern(name);
            self.arena.push_child(
                list,
                SyntaxNode::new(
                    NodeKind::ParamBinding,
                    node_span(ident),
                    node_to_location(ident),
                )
                .named(interned),
            );
            return Some(name);
        }

        let params = func.child_by_field_name("parameters")?;
        let list = self.arena.push_child(
            root,
            SyntaxNode::new(
                NodeKind::ParamList,
                node_span(params),
                node_to_location(params),
            )
            .with_flags(NodeFlags::PARENTHESIZED),
        );

        let mut cursor = params.walk();
        let mut named = params
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment");
        let first = named.next();
        let several = named.next().is_some();

        match first {
            None => None,
            Some(_) if several => {
                self.mark_unsupported(list);
                None
            }
            Some(param) => self.push_parameter(list, param),
        }
    }

    fn push_parameter(&mut self, list: NodeId, param: Node<'_>) -> Option<&'a str> {
        let optional = match param.kind() {
            "required_parameter" => false,
            "optional_parameter" => true,
            _ => {
                self.mark_unsupported(list);
                return None;
            }
        };
        let Some(pattern) = param.child_by_field_name("pattern") else {
            self.mark_unsupported(list);
            return None;
        };

        let mut flags = NodeFlags::NONE;
        flags.set(
            NodeFlags::ANNOTATED,
            param.child_by_field_name("type").is_some(),
        );
        let anchor = if optional {
            question_mark_end(param).unwrap_or(node_span(pattern).end)
        } else {
            node_span(pattern).end
        };

        match pattern.kind() {
            "object_pattern" => {
                let node = self.arena.push_child(
                    list,
                    SyntaxNode::new(
                        NodeKind::ObjectPattern,
                        node_span(pattern),
                        node_to_location(pattern),
                    )
                    .anchored(anchor)
                    .with_flags(flags),
                );
                self.push_pattern_fields(node, pattern);
                None
            }
            "identifier" => {
                let name = self.text(pattern);
                let interned = self.arena.intern(name);
                self.arena.push_child(
                    list,
                    SyntaxNode::new(
                        NodeKind::ParamBinding,
                        node_span(pattern),
                        node_to_location(pattern),
                    )
                    .named(interned)
                    .anchored(anchor)
                    .with_flags(flags),
                );
                Some(name)
            }
            _ => {
                self.mark_unsupported(list);
                None
            }
        }
    }

    fn push_pattern_fields(&mut self, node: NodeId, pattern: Node<'_>) {
        let mut trailing_comma = false;
        let mut cursor = pattern.walk();
        for child in pattern.children(&mut cursor) {
            match child.kind() {
                "," => trailing_comma = true,
                "comment" => {}
                _ if child.is_named() => {
                    trailing_comma = false;
                    let binding = match child.kind() {
                        "pair_pattern" => child.child_by_field_name("key"),
                        "object_assignment_pattern" => child.child_by_field_name("left"),
                        "rest_pattern" => first_named(child),
                        _ => Some(child),
                    };
                    let name = binding.map_or("", |b| unquote(self.text(b)));
                    let interned = self.arena.intern(name);
                    let mut field = SyntaxNode::new(
                        NodeKind::PatternField,
                        node_span(child),
                        node_to_location(child),
                    )
                    .named(interned);
                    field
                        .flags
                        .set(NodeFlags::SPREAD, child.kind() == "rest_pattern");
                    self.arena.push_child(node, field);
                }
                _ => {}
            }
        }
        self.arena
            .node_mut(node)
            .flags
            .set(NodeFlags::TRAILING_COMMA, trailing_comma);
    }

    /// Records where new statements go: the `try` body when the function
    /// starts with one and it encloses every retargeted call, else the body.
    fn push_block(&mut self, root: NodeId, body: Node<'_>, sites: &[Node<'_>]) {
        let block = first_statement(body)
            .filter(|s| s.kind() == "try_statement")
            .and_then(|s| s.child_by_field_name("body"))
            .filter(|b| sites.iter().all(|site| encloses(*b, *site)))
            .unwrap_or(body);

        let span = node_span(block);
        let id = self.arena.push_child(
            root,
            SyntaxNode::new(NodeKind::Block, span, node_to_location(block))
                .anchored(span.start + 1),
        );

        let mut cursor = block.walk();
        for statement in block.named_children(&mut cursor) {
            self.arena.push_child(
                id,
                SyntaxNode::new(
                    NodeKind::Statement,
                    node_span(statement),
                    node_to_location(statement),
                ),
            );
        }
    }

    fn mark_unsupported(&mut self, list: NodeId) {
        self.arena
            .node_mut(list)
            .flags
            .insert(NodeFlags::UNSUPPORTED);
    }

    /// Returns whether the handler binds the routing field and whether it
    /// calls the resolver. Nested functions are not searched.
    fn scan_markers(&self, func: Node<'_>) -> (bool, bool) {
        let field = self.routing.routing_field.as_str();
        let resolver = self.routing.resolver_fn.as_str();
        let mut binds = false;
        let mut resolves = false;

        let mut cursor = func.walk();
        loop {
            let node = cursor.node();
            let descend = match node.kind() {
                "shorthand_property_identifier_pattern" => {
                    binds |= self.text(node) == field;
                    false
                }
                "pair_pattern" => {
                    binds |= node
                        .child_by_field_name("key")
                        .is_some_and(|k| unquote(self.text(k)) == field);
                    true
                }
                "call_expression" => {
                    resolves |= node
                        .child_by_field_name("function")
                        .is_some_and(|f| f.kind() == "identifier" && self.text(f) == resolver);
                    true
                }
                kind if FUNCTION_KINDS.contains(&kind) => node.id() == func.id(),
                _ => true,
            };

            if descend && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return (binds, resolves);
                }
            }
        }
    }

    fn program_names(&mut self, root: Node<'_>) -> FxHashSet<ArenaStr<'bump>> {
        let mut names: SmallVec<[&'a str; 32]> = SmallVec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            declared_names(child, self.source, &mut names);
        }
        names.into_iter().map(|n| self.arena.intern(n)).collect()
    }
}

fn declared_names<'a>(node: Node<'_>, source: &'a [u8], out: &mut SmallVec<[&'a str; 32]>) {
    match node.kind() {
        "export_statement" => {
            if let Some(decl) = node.child_by_field_name("declaration") {
                declared_names(decl, source, out);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if let Some(name) = declarator
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                    .and_then(|n| node_text(n, source))
                {
                    out.push(name);
                }
            }
        }
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "enum_declaration" => {
            if let Some(name) = node
                .child_by_field_name("name")
                .and_then(|n| node_text(n, source))
            {
                out.push(name);
            }
        }
        _ => {}
    }
}

/// Unwraps `factory({...}).method()` chains down to the object literal.
fn schema_object<'t>(value: Node<'t>, source: &[u8], factory: &str) -> Option<Node<'t>> {
    let mut value = value;
    loop {
        if value.kind() != "call_expression" {
            return None;
        }
        let function = value.child_by_field_name("function")?;
        if node_text(function, source)? == factory {
            let args = value.child_by_field_name("arguments")?;
            let mut cursor = args.walk();
            let mut named = args
                .named_children(&mut cursor)
                .filter(|n| n.kind() != "comment");
            let object = named.next()?;
            let single = named.next().is_none();
            return (single && object.kind() == "object").then_some(object);
        }
        if function.kind() != "member_expression" {
            return None;
        }
        value = function.child_by_field_name("object")?;
    }
}

fn is_handler_candidate(func: Node<'_>) -> bool {
    let mut cursor = func.walk();
    let is_async = func
        .children(&mut cursor)
        .next()
        .is_some_and(|n| n.kind() == "async");
    if !is_async {
        return false;
    }

    let Some(parent) = func.parent() else {
        return false;
    };
    match parent.kind() {
        "pair" => true,
        "arguments" => {
            let mut cursor = parent.walk();
            let args: SmallVec<[Node<'_>; 4]> = parent
                .named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .collect();
            args.len() > 1 && args.last().is_some_and(|last| last.id() == func.id())
        }
        _ => false,
    }
}

fn handler_name<'a>(func: Node<'_>, source: &'a [u8]) -> &'a str {
    let Some(parent) = func.parent() else {
        return "";
    };
    let name = match parent.kind() {
        "pair" => parent.child_by_field_name("key"),
        "arguments" => {
            let mut cursor = parent.walk();
            let first_string = parent
                .named_children(&mut cursor)
                .find(|n| n.kind() == "string");
            first_string.or_else(|| {
                parent
                    .parent()
                    .and_then(|call| call.child_by_field_name("function"))
            })
        }
        _ => None,
    };
    name.and_then(|n| node_text(n, source)).map_or("", unquote)
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    node.named_child(0)
}

fn first_statement(block: Node<'_>) -> Option<Node<'_>> {
    (0..block.named_child_count())
        .filter_map(|i| block.named_child(i))
        .find(|n| n.kind() != "comment")
}

/// Returns `true` if a function between `node` and `func` has its own
/// parameter named `name`.
fn is_shadowed(node: Node<'_>, func: Node<'_>, name: &str, source: &[u8]) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.id() == func.id() {
            return false;
        }
        if FUNCTION_KINDS.contains(&ancestor.kind()) && binds_parameter(ancestor, name, source) {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

fn binds_parameter(func: Node<'_>, name: &str, source: &[u8]) -> bool {
    if let Some(ident) = func.child_by_field_name("parameter") {
        return node_text(ident, source) == Some(name);
    }
    let Some(params) = func.child_by_field_name("parameters") else {
        return false;
    };
    (0..params.named_child_count())
        .filter_map(|i| params.named_child(i))
        .filter_map(|p| p.child_by_field_name("pattern"))
        .any(|pattern| pattern_binds(pattern, name, source))
}

fn pattern_binds(pattern: Node<'_>, name: &str, source: &[u8]) -> bool {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            node_text(pattern, source) == Some(name)
        }
        "pair_pattern" => pattern
            .child_by_field_name("value")
            .is_some_and(|v| pattern_binds(v, name, source)),
        "object_assignment_pattern" | "assignment_pattern" => pattern
            .child_by_field_name("left")
            .is_some_and(|l| pattern_binds(l, name, source)),
        _ => (0..pattern.named_child_count())
            .filter_map(|i| pattern.named_child(i))
            .any(|child| pattern_binds(child, name, source)),
    }
}

fn encloses(outer: Node<'_>, inner: Node<'_>) -> bool {
    node_span(outer).encloses(node_span(inner))
}

fn question_mark_end(param: Node<'_>) -> Option<u32> {
    let mut cursor = param.walk();
    let mark = param.children(&mut cursor).find(|n| n.kind() == "?");
    mark.map(|n| node_span(n).end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TsParser;
    use ir_core::{DeclarationKind, HandlerShape};

    fn with_located<R>(source: &str, f: impl FnOnce(&LocatedFile<'_>) -> R) -> R {
        let mut parser = TsParser::new().expect("Parser creation failed");
        let bump = Bump::new();
        let located = parser
            .locate(source, &RoutingConfig::default(), &bump)
            .expect("locate failed");
        f(&located)
    }

    #[test]
    fn test_locates_schema_with_members() {
        let source = "export const cardSchema = z.object({\n  cardId: z.number(),\n  title: z.string(),\n});\n";
        with_located(source, |file| {
            let decls: Vec<_> = file.arena.declarations().collect();
            assert_eq!(decls.len(), 1);
            assert_eq!(decls[0].name, "cardSchema");
            assert_eq!(decls[0].kind, DeclarationKind::Schema);
            assert!(!decls[0].already_injected);

            let root = file.arena.roots().next().expect("root");
            let body = file.arena.child(root, NodeKind::ObjectBody).expect("body");
            assert!(file.arena.node(body).has(NodeFlags::TRAILING_COMMA));
            assert_eq!(&source[file.arena.node(body).anchor as usize..][..1], "}");
            let members: Vec<_> = file
                .arena
                .children_of(body, NodeKind::Member)
                .map(|m| file.arena.node(m).name_str())
                .collect();
            assert_eq!(members, ["cardId", "title"]);
        });
    }

    #[test]
    fn test_schema_marker_detection() {
        let source = "const aSchema = z.object({ ...instanceParameterSchema, a: z.string() });\nconst bSchema = z.object({ instance: z.string() });\nconst cSchema = z.object({}).strict();\n";
        with_located(source, |file| {
            let injected: Vec<_> = file
                .arena
                .declarations()
                .map(|d| (d.name, d.already_injected))
                .collect();
            assert_eq!(
                injected,
                vec![
                    ("aSchema".to_owned(), true),
                    ("bSchema".to_owned(), true),
                    ("cSchema".to_owned(), false),
                ]
            );
        });
    }

    #[test]
    fn test_non_schema_bindings_are_ignored() {
        let source = "const instanceParameterSchema = z.object({ instance: z.string() });\nconst defaults = z.object({ a: 1 });\nconst listSchema = z.array(z.string());\nfunction f() { const innerSchema = z.object({}); }\n";
        with_located(source, |file| {
            assert!(file.is_empty());
            assert!(file.declares("instanceParameterSchema"));
            assert!(file.declares("defaults"));
            assert!(file.declares("f"));
        });
    }

    #[test]
    fn test_braces_in_strings_do_not_move_boundaries() {
        let source = "export const noteSchema = z.object({\n  text: z.string().describe('use { and } freely'),\n  // closing } in a comment\n  tag: z.string().default(`}`),\n});\n";
        with_located(source, |file| {
            let decl = file.arena.declarations().next().expect("schema");
            let text = &source[decl.span.range()];
            assert!(text.starts_with("noteSchema = z.object({"));
            assert!(text.ends_with("})"));
            let root = file.arena.roots().next().expect("root");
            let body = file.arena.child(root, NodeKind::ObjectBody).expect("body");
            assert_eq!(file.arena.children_of(body, NodeKind::Member).count(), 2);
        });
    }

    #[test]
    fn test_destructured_handler() {
        let source = "server.tool('get-board', 'Get a board', schema.shape, async ({ boardId, cardId }) => {\n  try {\n    const board = await client.getBoard(boardId);\n    return board;\n  } catch (e) {\n    throw e;\n  }\n});\n";
        with_located(source, |file| {
            let decl = file.arena.declarations().next().expect("handler");
            assert_eq!(decl.name, "get-board");
            assert_eq!(decl.kind, DeclarationKind::Handler);

            let root = file.arena.roots().next().expect("root");
            let sig = file.arena.signature(root).expect("supported");
            assert_eq!(sig.shape, HandlerShape::Destructured);
            assert_eq!(sig.bindings.as_slice(), ["boardId", "cardId"]);
            assert!(!sig.has_instance_field);

            let block = file.arena.child(root, NodeKind::Block).expect("block");
            let first = file.arena.child(block, NodeKind::Statement).expect("stmt");
            assert!(source[file.arena.node(first).span.range()].starts_with("const board"));
        });
    }

    #[test]
    fn test_positional_handler_call_sites() {
        let source = "server.tool('list', 'List', s.shape, async (params) => {\n  try {\n    const r = await client.fetch(params);\n    const n = await client.count(params.id);\n    other.fetch(params);\n    return client.list(paramsList);\n  } catch (e) { throw e; }\n});\n";
        with_located(source, |file| {
            let root = file.arena.roots().next().expect("root");
            let sig = file.arena.signature(root).expect("supported");
            assert_eq!(sig.param_name(), Some("params"));

            let sites: Vec<_> = file
                .arena
                .children_of(root, NodeKind::CallArgument)
                .map(|c| file.arena.node(c).span)
                .collect();
            assert_eq!(sites.len(), 1);
            assert_eq!(&source[sites[0].range()], "params");
            assert!(source[..sites[0].start as usize].ends_with("client.fetch("));
        });
    }

    #[test]
    fn test_call_after_try_moves_block_to_body() {
        let source = "const h = {\n  list: async (params) => {\n    try {\n      validate(params);\n    } catch (e) {\n      return null;\n    }\n    return client.list(params);\n  },\n};\n";
        with_located(source, |file| {
            let root = file.arena.roots().next().expect("root");
            assert_eq!(
                file.arena.children_of(root, NodeKind::CallArgument).count(),
                1
            );

            let block = file.arena.child(root, NodeKind::Block).expect("block");
            let first = file.arena.child(block, NodeKind::Statement).expect("stmt");
            assert!(source[file.arena.node(first).span.range()].starts_with("try {"));
        });
    }

    #[test]
    fn test_calls_inside_try_keep_try_block() {
        let source = "const h = {\n  list: async (params) => {\n    try {\n      return client.list(params);\n    } catch (e) {\n      return null;\n    }\n  },\n};\n";
        with_located(source, |file| {
            let root = file.arena.roots().next().expect("root");
            let block = file.arena.child(root, NodeKind::Block).expect("block");
            let first = file.arena.child(block, NodeKind::Statement).expect("stmt");
            assert!(source[file.arena.node(first).span.range()].starts_with("return client.list"));
        });
    }

    #[test]
    fn test_nested_function_parameter_shadows_call_sites() {
        let source = "const h = {\n  many: async (params) => {\n    const one = await client.get(params);\n    return items.map((params) => client.get(params));\n  },\n};\n";
        with_located(source, |file| {
            let root = file.arena.roots().next().expect("root");
            let sites: Vec<_> = file
                .arena
                .children_of(root, NodeKind::CallArgument)
                .map(|c| file.arena.node(c).span)
                .collect();
            assert_eq!(sites.len(), 1);
            assert!(source[..sites[0].start as usize].ends_with("const one = await client.get("));
        });
    }

    #[test]
    fn test_nested_function_with_other_parameter_keeps_call_sites() {
        let source = "const h = {\n  many: async (params) => {\n    return ids.map(({ id }) => client.get(params));\n  },\n};\n";
        with_located(source, |file| {
            let root = file.arena.roots().next().expect("root");
            assert_eq!(
                file.arena.children_of(root, NodeKind::CallArgument).count(),
                1
            );
        });
    }

    #[test]
    fn test_handler_markers() {
        let source = "const tools = {\n  a: async ({ boardId, instance }) => { return 1; },\n  b: async (params) => { const { instance, ...restParams } = params; return 2; },\n  c: async () => { const client = await getClientForInstance(clientOrFactory, 'x'); },\n  d: async () => { return [1].map(async ({ instance }) => instance); },\n};\n";
        with_located(source, |file| {
            let injected: Vec<_> = file
                .arena
                .declarations()
                .map(|d| (d.name, d.already_injected))
                .collect();
            assert_eq!(
                injected,
                vec![
                    ("a".to_owned(), true),
                    ("b".to_owned(), true),
                    ("c".to_owned(), true),
                    ("d".to_owned(), false),
                ]
            );
            assert!(!file.all_injected());
        });
    }

    #[test]
    fn test_nested_and_unregistered_arrows_are_not_handlers() {
        let source = "main().catch(async (e) => { console.error(e); });\nserver.tool('x', 'X', async ({ ids }) => {\n  await Promise.all(ids.map(async (id) => { await client.get(id); }));\n});\nconst f = async () => { return 1; };\n";
        with_located(source, |file| {
            let names: Vec<_> = file.arena.declarations().map(|d| d.name).collect();
            assert_eq!(names, ["x"]);
        });
    }

    #[test]
    fn test_parameter_shapes() {
        let source = "reg('a', 'A', async () => { go(); });\nreg('b', 'B', async (x, y) => { go(); });\nreg('c', 'C', async ([x]) => { go(); });\nreg('d', 'D', async p => { go(); });\nreg('e', 'E', async ({ a }: Args) => { go(); });\n";
        with_located(source, |file| {
            let roots: Vec<_> = file.arena.roots().collect();
            assert_eq!(roots.len(), 5);

            let empty = file.arena.signature(roots[0]).expect("empty is supported");
            assert!(empty.bindings.is_empty());
            assert!(file.arena.signature(roots[1]).is_none());
            assert!(file.arena.signature(roots[2]).is_none());

            let bare = file.arena.signature(roots[3]).expect("bare is supported");
            assert_eq!(bare.param_name(), Some("p"));
            let list = file.arena.child(roots[3], NodeKind::ParamList).expect("list");
            assert!(!file.arena.node(list).has(NodeFlags::PARENTHESIZED));

            let list = file.arena.child(roots[4], NodeKind::ParamList).expect("list");
            let pattern = file.arena.child(list, NodeKind::ObjectPattern).expect("pattern");
            assert!(file.arena.node(pattern).has(NodeFlags::ANNOTATED));
        });
    }

    #[test]
    fn test_imports_and_program_names_collected() {
        let source = "import { z } from 'zod';\nimport { getClientForInstance } from '../client.js';\nexport function registerTools() {}\nclass Helper {}\n";
        with_located(source, |file| {
            assert_eq!(file.imports.len(), 2);
            assert!(file.imports[1].binds("getClientForInstance"));
            assert!(file.declares("registerTools"));
            assert!(file.declares("Helper"));
            assert!(!file.declares("z"));
            assert!(file.all_injected());
        });
    }
}
