use crate::compiler::interface::{NodeInterface, interface_from_node};
use crate::compiler::translate::bind_sockets;
use crate::compiler::{GroupStrategy, LoweringContext, LoweringError, SocketMaps, lower_node_tree};
use crate::lazy_graph::functions::group::GroupFunction;
use crate::lazy_graph::functions::reroute::RerouteFunction;
use crate::lazy_graph::functions::FunctionInterface;
use crate::lazy_graph::{InputSocketId, LazyGraph, OutputSocketId, Resources};
use crate::node_tree::{InputSocketRef, Node, NodeTree, OutputSocketRef};
use crate::value::SocketValue;

pub(crate) fn translate_group_node<'a>(
    node: &'a Node,
    group_tree: &'a NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    ctx: &mut LoweringContext<'a>,
) -> Result<(), LoweringError> {
    match ctx.options.group_strategy {
        GroupStrategy::Opaque => translate_opaque(node, group_tree, graph, resources, maps, ctx),
        GroupStrategy::Inline => translate_inline(node, group_tree, graph, resources, maps, ctx),
    }
}

/// The group becomes one function owning its own lowered graph.
fn translate_opaque<'a>(
    node: &'a Node,
    group_tree: &'a NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    ctx: &mut LoweringContext<'a>,
) -> Result<(), LoweringError> {
    let mut group_graph = LazyGraph::new();
    let mut group_resources = Resources::default();
    let group_mapping = lower_node_tree(group_tree, &mut group_graph, &mut group_resources, ctx)?;

    let NodeInterface {
        used_inputs,
        used_outputs,
        inputs,
        outputs,
    } = interface_from_node(node, ctx.types, true);
    let graph_inputs = used_inputs
        .iter()
        .map(|&i| group_mapping.group_input_sockets.get(i).copied().flatten())
        .collect();
    let graph_outputs = used_outputs
        .iter()
        .map(|&i| group_mapping.group_output_sockets.get(i).copied().flatten())
        .collect();
    let function = GroupFunction::new(
        FunctionInterface {
            name: node.name.clone(),
            inputs,
            outputs,
        },
        group_tree.name.clone(),
        group_graph,
        group_resources,
        graph_inputs,
        graph_outputs,
    );
    let lazy_node = graph.add_function(resources, function);
    bind_sockets(node, lazy_node, &used_inputs, &used_outputs, graph, resources, maps, ctx.types);
    Ok(())
}

/// The group's nodes are lowered straight into `graph` and its interface dummies
/// are bypassed: consumers of the group node read from the nodes that feed the
/// group's output, and the group's inner consumers of its inputs are fed by
/// whatever is linked to the group node.
fn translate_inline<'a>(
    node: &'a Node,
    group_tree: &'a NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    ctx: &mut LoweringContext<'a>,
) -> Result<(), LoweringError> {
    let group_mapping = lower_node_tree(group_tree, graph, resources, ctx)?;

    for (index, dummy_input) in group_mapping.group_output_sockets.iter().enumerate() {
        let Some(dummy_input) = *dummy_input else {
            continue;
        };
        if !node.outputs.get(index).is_some_and(|socket| socket.available) {
            continue;
        }
        let outside = OutputSocketRef::new(node.id, index);
        let ty = graph.input(dummy_input).ty().clone();
        match graph.input(dummy_input).origin() {
            None => {
                // Unlinked group output: provide its default through a reroute.
                let reroute = graph.add_function(resources, RerouteFunction::new(ty));
                if let Some(value) = graph.input(dummy_input).default_value() {
                    graph.set_default_value(InputSocketId::new(reroute, 0), value);
                }
                maps.set_output(outside, OutputSocketId::new(reroute, 0));
            }
            Some(origin) => {
                graph.remove_link(origin, dummy_input);
                if origin.node == group_mapping.group_input_node {
                    // Group input passed straight through: route the outer input's value.
                    let reroute = graph.add_function(resources, RerouteFunction::new(ty));
                    maps.set_output(outside, OutputSocketId::new(reroute, 0));
                    let reroute_input = InputSocketId::new(reroute, 0);
                    if let Some(input_index) = group_mapping
                        .group_input_sockets
                        .iter()
                        .position(|socket| *socket == Some(origin))
                    {
                        bind_outer_input(node, input_index, reroute_input, graph, resources, maps, ctx);
                    }
                } else {
                    maps.set_output(outside, origin);
                }
            }
        }
    }

    for (index, group_input) in group_mapping.group_input_sockets.iter().enumerate() {
        let Some(group_input) = *group_input else {
            continue;
        };
        let targets = graph.output(group_input).targets().to_vec();
        for target in targets {
            graph.remove_link(group_input, target);
            bind_outer_input(node, index, target, graph, resources, maps, ctx);
        }
    }
    Ok(())
}

/// Makes `target` receive whatever feeds input `index` of the group node, or
/// that input's default value.
fn bind_outer_input(
    node: &Node,
    index: usize,
    target: InputSocketId,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    ctx: &LoweringContext,
) {
    let ty = graph.input(target).ty().clone();
    let socket = node.inputs.get(index).filter(|socket| socket.available);
    if socket.is_some() {
        maps.add_input(InputSocketRef::new(node.id, index), target);
    }
    let default_value = socket
        .and_then(|socket| socket.default_value.as_ref())
        .zip(ty.base_type())
        .and_then(|(value, base_type)| ctx.types.convert_value(value, base_type))
        .map(SocketValue::from)
        .unwrap_or_else(|| ty.value_initialize());
    let value = resources.add_value(default_value);
    graph.set_default_value(target, value);
}
