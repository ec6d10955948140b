//! Call-site retargeting for positional handlers.

use ir_core::RoutingConfig;
use ir_ts_parser::{DeclArena, NodeId, NodeKind};

use crate::edit::EditSet;

/// Replaces every recorded `client.method(param)` argument with the rest
/// binding and returns how many were replaced.
///
/// The locator only records arguments that are exactly the parameter
/// identifier, so `params.id` and `paramsList` are never touched.
pub(crate) fn retarget(
    arena: &DeclArena<'_>,
    handler: NodeId,
    routing: &RoutingConfig,
    edits: &mut EditSet,
) -> usize {
    let mut count = 0;
    for argument in arena.children_of(handler, NodeKind::CallArgument) {
        edits.replace(arena.node(argument).span, routing.rest_binding.as_str());
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_ts_parser::{Bump, TsParser};

    #[test]
    fn test_only_exact_arguments_are_retargeted() {
        let source = "\
const h = {
  a: async (params) => {
    const one = await client.fetch(params);
    const two = await client.fetch(params.id);
    const three = await other.fetch(params);
    return client.list(paramsList);
  },
};
";
        let mut parser = TsParser::new().expect("parser");
        let bump = Bump::new();
        let routing = RoutingConfig::default();
        let file = parser.locate(source, &routing, &bump).expect("locate");
        let root = file.arena.roots().next().expect("handler");

        let mut edits = EditSet::new();
        assert_eq!(retarget(&file.arena, root, &routing, &mut edits), 1);

        let out = edits.apply(source).expect("apply");
        assert!(out.contains("client.fetch(restParams)"));
        assert!(out.contains("client.fetch(params.id)"));
        assert!(out.contains("other.fetch(params)"));
        assert!(out.contains("client.list(paramsList)"));
    }
}
