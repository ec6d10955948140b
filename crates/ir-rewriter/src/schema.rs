//! Spread injection into schema object literals.

use ir_core::RoutingConfig;
use ir_ts_parser::{DeclArena, NodeFlags, NodeId, NodeKind};
use tracing::debug;

use crate::edit::EditSet;
use crate::list::{BraceList, EmptyStyle, append_item};

/// Records the edits that append the routing spread to a schema's object.
///
/// Returns `false` without recording anything if the schema already carries
/// the spread (or a member named after the routing field) or has no object
/// body.
pub(crate) fn inject(
    source: &str,
    arena: &DeclArena<'_>,
    schema: NodeId,
    routing: &RoutingConfig,
    edits: &mut EditSet,
) -> bool {
    let node = arena.node(schema);
    if node.kind != NodeKind::Schema || node.has(NodeFlags::INJECTED) {
        return false;
    }
    let Some(body) = arena.child(schema, NodeKind::ObjectBody) else {
        return false;
    };

    let object = arena.node(body);
    let list = BraceList {
        span: object.span,
        last: arena
            .last_child(body, NodeKind::Member)
            .map(|m| arena.node(m).span),
        trailing_comma: object.has(NodeFlags::TRAILING_COMMA),
    };
    append_item(
        source,
        list,
        &routing.spread_field(),
        EmptyStyle::Block,
        &routing.indent_unit,
        edits,
    );

    debug!(name = node.name_str(), "injecting schema spread");
    true
}
