use crate::compiler::{LoweringContext, SocketMaps};
use crate::lazy_graph::functions::conversion::ConversionFunction;
use crate::lazy_graph::functions::AnyLazyFunction;
use crate::lazy_graph::{InputSocketId, LazyGraph, LazyNodeKind, OutputSocketId, Resources};
use crate::node_tree::{Link, NodeTree};
use crate::types::{ResolvedType, TypeRegistry};

/// Graph inputs a source link feeds.
fn link_targets(tree: &NodeTree, link: &Link, maps: &SocketMaps) -> Vec<InputSocketId> {
    let Some(to_node) = tree.node(link.to.node) else {
        return Vec::new();
    };
    let Some(to_socket) = to_node.inputs.get(link.to.index) else {
        return Vec::new();
    };
    if !to_socket.available {
        return Vec::new();
    }
    if !to_socket.multi_input {
        return maps.input_sockets.get(&link.to).cloned().unwrap_or_default();
    }
    let Some(link_index) = tree
        .links_to(link.to)
        .filter(|other| !other.muted)
        .position(|other| other.id == link.id)
    else {
        return Vec::new();
    };
    if to_node.muted {
        // A muted node only passes its first linked value through.
        if link_index == 0 {
            return maps.input_sockets.get(&link.to).cloned().unwrap_or_default();
        }
        return Vec::new();
    }
    match maps.multi_input_nodes.get(&link.to) {
        Some(collector) => vec![InputSocketId::new(*collector, link_index)],
        None => Vec::new(),
    }
}

/// Conversion node already reading `from` and producing `to_type`, e.g. one
/// inserted while lowering a spliced group.
fn existing_conversion(
    graph: &LazyGraph,
    resources: &Resources,
    from: OutputSocketId,
    to_type: &ResolvedType,
) -> Option<OutputSocketId> {
    graph.output(from).targets().iter().find_map(|target| {
        let node = graph.node(target.node);
        let LazyNodeKind::Function(function) = node.kind() else {
            return None;
        };
        let is_match = matches!(resources.function(function), AnyLazyFunction::Conversion(_))
            && node.outputs()[0].ty() == to_type;
        is_match.then(|| OutputSocketId::new(target.node, 0))
    })
}

/// Returns a socket providing `from`'s value as `to_type`, reusing or inserting
/// a conversion node if needed. `None` when no conversion exists.
fn insert_type_conversion(
    graph: &mut LazyGraph,
    resources: &mut Resources,
    from: OutputSocketId,
    to_type: &ResolvedType,
    types: &TypeRegistry,
) -> Option<OutputSocketId> {
    let from_type = graph.output(from).ty().clone();
    if from_type == *to_type {
        return Some(from);
    }
    if let Some(existing) = existing_conversion(graph, resources, from, to_type) {
        return Some(existing);
    }
    let function = types.conversion(from_type.base_type()?, to_type.base_type()?)?;
    let node = graph.add_function(
        resources,
        ConversionFunction::new(function.clone(), from_type, to_type.clone()),
    );
    graph.add_link(from, InputSocketId::new(node, 0));
    Some(OutputSocketId::new(node, 0))
}

/// Recreates the tree's links between the mapped graph sockets.
///
/// Targets of one produced output are grouped by type so at most one conversion
/// node exists per distinct target type, also when several source outputs
/// (spliced group outputs) resolve to the same produced output. Targets whose type cannot be
/// reached keep no origin and get the target type's default value.
pub(crate) fn resolve_links(
    tree: &NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &SocketMaps,
    ctx: &LoweringContext,
) {
    for (source, &from) in &maps.output_sockets {
        let mut targets_by_type: Vec<(ResolvedType, Vec<InputSocketId>)> = Vec::new();
        for link in tree.links_from(*source).filter(|link| !link.muted) {
            for target in link_targets(tree, link, maps) {
                if graph.input(target).origin().is_some() {
                    log::warn!("{} input {} is linked more than once", tree.name, target.index);
                    continue;
                }
                let ty = graph.input(target).ty().clone();
                match targets_by_type.iter_mut().find(|(existing, _)| *existing == ty) {
                    Some((_, targets)) => targets.push(target),
                    None => targets_by_type.push((ty, vec![target])),
                }
            }
        }
        for (to_type, targets) in targets_by_type {
            match insert_type_conversion(graph, resources, from, &to_type, ctx.types) {
                Some(converted) => {
                    for target in targets {
                        graph.add_link(converted, target);
                    }
                }
                None => {
                    log::debug!(
                        "No conversion from {} to {to_type}, using its default",
                        graph.output(from).ty()
                    );
                    let value = resources.add_value(to_type.value_initialize());
                    for target in targets {
                        graph.set_default_value(target, value);
                    }
                }
            }
        }
    }
}
