//! Handler signature rewriting.
//!
//! A handler is classified once from its parameter list and receives the
//! single rewrite for its shape:
//!
//! - **Destructured** `({ a, b }) => {}` gains the routing field in its
//!   pattern and a client-resolution statement.
//! - **Positional** `(params) => {}` keeps its parameter, splits it into the
//!   routing field and a rest binding in the body, and resolves the client.
//!
//! Unannotated parameters receive the configured annotation so that the
//! added field type-checks.

use ir_core::{HandlerShape, HandlerSignature, RoutingConfig, Span};
use ir_ts_parser::{DeclArena, NodeFlags, NodeId, NodeKind};
use smallvec::SmallVec;
use tracing::debug;

use crate::edit::EditSet;
use crate::layout::{line_ending, line_indent, same_line};
use crate::list::{BraceList, EmptyStyle, append_item};

/// What [`rewrite`] did with a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandlerEdit {
    /// The handler already binds the routing field or resolves the client.
    AlreadyInjected,
    /// The parameter list has a shape that cannot be rewritten.
    Unsupported,
    /// Edits were recorded for a handler of this shape.
    Rewritten(HandlerShape),
}

/// Records the edits that route `handler` through the resolver.
pub(crate) fn rewrite(
    source: &str,
    arena: &DeclArena<'_>,
    handler: NodeId,
    routing: &RoutingConfig,
    edits: &mut EditSet,
) -> HandlerEdit {
    if arena.node(handler).has(NodeFlags::INJECTED) {
        return HandlerEdit::AlreadyInjected;
    }
    let (Some(signature), Some(params), Some(block)) = (
        arena.signature(handler),
        arena.child(handler, NodeKind::ParamList),
        arena.child(handler, NodeKind::Block),
    ) else {
        return HandlerEdit::Unsupported;
    };

    if collides(&signature, routing) {
        return HandlerEdit::Unsupported;
    }

    let mut statements: SmallVec<[String; 2]> = SmallVec::new();
    match signature.shape {
        HandlerShape::Destructured => {
            extend_pattern(source, arena, params, routing, edits);
        }
        HandlerShape::Positional => {
            let Some(param) = signature.param_name() else {
                return HandlerEdit::Unsupported;
            };
            annotate_binding(arena, params, routing, edits);
            statements.push(routing.rebinding_statement(param));
        }
    }
    statements.push(routing.resolution_statement());
    insert_statements(
        source,
        arena,
        block,
        &statements,
        &routing.indent_unit,
        edits,
    );

    debug!(
        name = arena.node(handler).name_str(),
        shape = signature.shape.label(),
        "rewriting handler"
    );
    HandlerEdit::Rewritten(signature.shape)
}

/// Returns `true` if a parameter name would clash with a name the rewrite
/// declares: the client binding, or for a positional parameter also the
/// routing field and the rest binding it is destructured into.
fn collides(signature: &HandlerSignature, routing: &RoutingConfig) -> bool {
    let client = routing.client_binding.as_str();
    match signature.shape {
        HandlerShape::Destructured => signature.bindings.iter().any(|b| b == client),
        HandlerShape::Positional => signature.param_name().is_some_and(|param| {
            param == client || param == routing.routing_field || param == routing.rest_binding
        }),
    }
}

fn annotation(routing: &RoutingConfig) -> String {
    routing
        .param_annotation
        .as_deref()
        .map(|ty| format!(": {ty}"))
        .unwrap_or_default()
}

/// Adds the routing field to the object pattern, creating it for `()`.
fn extend_pattern(
    source: &str,
    arena: &DeclArena<'_>,
    params: NodeId,
    routing: &RoutingConfig,
    edits: &mut EditSet,
) {
    let field = routing.routing_field.as_str();
    let Some(pattern) = arena.child(params, NodeKind::ObjectPattern) else {
        edits.replace(
            arena.node(params).span,
            format!("({{ {field} }}{})", annotation(routing)),
        );
        return;
    };

    let node = arena.node(pattern);
    let last = arena.last_child(pattern, NodeKind::PatternField);
    match last.map(|id| arena.node(id)) {
        // A rest element must stay last.
        Some(rest) if rest.has(NodeFlags::SPREAD) => {
            edits.insert(rest.span.start, format!("{field}, "));
        }
        last => {
            let list = BraceList {
                span: node.span,
                last: last.map(|f| f.span),
                trailing_comma: node.has(NodeFlags::TRAILING_COMMA),
            };
            append_item(
                source,
                list,
                field,
                EmptyStyle::Inline,
                &routing.indent_unit,
                edits,
            );
        }
    }

    if !node.has(NodeFlags::ANNOTATED) {
        let annotation = annotation(routing);
        if !annotation.is_empty() {
            edits.insert(node.anchor, annotation);
        }
    }
}

/// Annotates a positional parameter, parenthesizing the bare form.
fn annotate_binding(
    arena: &DeclArena<'_>,
    params: NodeId,
    routing: &RoutingConfig,
    edits: &mut EditSet,
) {
    let Some(binding) = arena.child(params, NodeKind::ParamBinding) else {
        return;
    };
    let node = arena.node(binding);
    let annotation = annotation(routing);

    if !arena.node(params).has(NodeFlags::PARENTHESIZED) {
        edits.replace(node.span, format!("({}{annotation})", node.name_str()));
    } else if !node.has(NodeFlags::ANNOTATED) && !annotation.is_empty() {
        edits.insert(node.anchor, annotation);
    }
}

/// Inserts `statements` ahead of the first statement of `block`.
fn insert_statements(
    source: &str,
    arena: &DeclArena<'_>,
    block: NodeId,
    statements: &[String],
    indent_unit: &str,
    edits: &mut EditSet,
) {
    let node = arena.node(block);
    let nl = line_ending(source);
    let Some(first) = arena.child(block, NodeKind::Statement) else {
        let indent = line_indent(source, node.span.start);
        let mut text = String::new();
        for statement in statements {
            text.push_str(nl);
            text.push_str(indent);
            text.push_str(indent_unit);
            text.push_str(statement);
        }
        text.push_str(nl);
        text.push_str(indent);
        let interior = Span::new(node.anchor, node.span.end.saturating_sub(1));
        edits.replace(interior, text);
        return;
    };

    let first = arena.node(first).span.start;
    let text = if same_line(source, node.span.start, first) {
        let mut text = statements.join(" ");
        text.push(' ');
        text
    } else {
        let indent = line_indent(source, first);
        statements
            .iter()
            .map(|s| format!("{s}{nl}{indent}"))
            .collect()
    };
    edits.insert(first, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_ts_parser::{Bump, TsParser};

    fn run_with(source: &str, routing: &RoutingConfig) -> (HandlerEdit, String) {
        let mut parser = TsParser::new().expect("parser");
        let bump = Bump::new();
        let file = parser.locate(source, routing, &bump).expect("locate");
        let root = file.arena.roots().next().expect("handler");

        let mut edits = EditSet::new();
        let result = rewrite(source, &file.arena, root, routing, &mut edits);
        (result, edits.apply(source).expect("apply"))
    }

    fn run(source: &str) -> (HandlerEdit, String) {
        run_with(source, &RoutingConfig::default())
    }

    #[test]
    fn test_destructured_handler_with_try() {
        let source = "\
server.tool('get-board', 'Get a board', shape, async ({ boardId }) => {
  try {
    const board = await client.getBoard(boardId);
    return ok(board);
  } catch (error) {
    return fail(error);
  }
});
";
        let (result, out) = run(source);
        assert_eq!(result, HandlerEdit::Rewritten(HandlerShape::Destructured));
        assert_eq!(
            out,
            "\
server.tool('get-board', 'Get a board', shape, async ({ boardId, instance }: any) => {
  try {
    const client = await getClientForInstance(clientOrFactory, instance);
    const board = await client.getBoard(boardId);
    return ok(board);
  } catch (error) {
    return fail(error);
  }
});
"
        );
    }

    #[test]
    fn test_positional_handler_without_try() {
        let source = "\
const handlers = {
  listCards: async (params) => {
    return client.listCards(params);
  },
};
";
        let (result, out) = run(source);
        assert_eq!(result, HandlerEdit::Rewritten(HandlerShape::Positional));
        assert_eq!(
            out,
            "\
const handlers = {
  listCards: async (params: any) => {
    const { instance, ...restParams } = params;
    const client = await getClientForInstance(clientOrFactory, instance);
    return client.listCards(params);
  },
};
"
        );
    }

    #[test]
    fn test_bare_parameter_is_parenthesized() {
        let (_, out) = run("const h = { a: async params => {\n  run(params);\n} };");
        assert!(out.starts_with("const h = { a: async (params: any) => {\n"));
    }

    #[test]
    fn test_empty_parameter_list_and_body() {
        let (result, out) = run("const h = { ping: async () => {} };");
        assert_eq!(result, HandlerEdit::Rewritten(HandlerShape::Destructured));
        assert_eq!(
            out,
            "const h = { ping: async ({ instance }: any) => {\n  const client = await getClientForInstance(clientOrFactory, instance);\n} };"
        );
    }

    #[test]
    fn test_rest_element_stays_last() {
        let (_, out) = run("const h = { a: async ({ id, ...rest }: Args) => { go(id, rest); } };");
        assert_eq!(
            out,
            "const h = { a: async ({ id, instance, ...rest }: Args) => { const client = await getClientForInstance(clientOrFactory, instance); go(id, rest); } };"
        );
    }

    #[test]
    fn test_without_annotation() {
        let routing = RoutingConfig {
            param_annotation: None,
            ..RoutingConfig::default()
        };
        let (_, out) = run_with(
            "const h = { a: async ({ id }) => {\n  go(id);\n} };",
            &routing,
        );
        assert!(out.contains("async ({ id, instance }) => {"));
    }

    #[test]
    fn test_crlf_statements() {
        let source = "const h = {\r\n  a: async ({ id }) => {\r\n    go(id);\r\n  },\r\n};\r\n";
        let (_, out) = run(source);
        assert_eq!(
            out,
            "const h = {\r\n  a: async ({ id, instance }: any) => {\r\n    const client = await getClientForInstance(clientOrFactory, instance);\r\n    go(id);\r\n  },\r\n};\r\n"
        );

        let (_, out) = run("const h = { a: async () => {} };\r\n");
        assert_eq!(
            out,
            "const h = { a: async ({ instance }: any) => {\r\n  const client = await getClientForInstance(clientOrFactory, instance);\r\n} };\r\n"
        );
    }

    #[test]
    fn test_names_declared_by_the_rewrite_are_not_reused() {
        let sources = [
            "const h = { a: async ({ client, id }) => { go(client, id); } };",
            "const h = { a: async (restParams) => { return client.get(restParams); } };",
            "const h = { a: async (client) => { go(client); } };",
        ];
        for source in sources {
            let (result, out) = run(source);
            assert_eq!(result, HandlerEdit::Unsupported);
            assert_eq!(out, source);
        }
    }

    #[test]
    fn test_injected_and_unsupported_handlers() {
        let (result, out) = run("const h = { a: async ({ id, instance }) => { go(id); } };");
        assert_eq!(result, HandlerEdit::AlreadyInjected);
        assert!(!out.contains("getClientForInstance"));

        let (result, _) = run("const h = { a: async (a, b) => { go(a, b); } };");
        assert_eq!(result, HandlerEdit::Unsupported);
    }
}
