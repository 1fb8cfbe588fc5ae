use crate::compiler::defaults::{
    create_implicit_input_if_necessary, prepare_default_value, prepare_socket_default_value,
};
use crate::compiler::interface::{NodeInterface, interface_from_node};
use crate::compiler::{GraphMapping, LoweringContext, LoweringError, SocketMaps, group};
use crate::lazy_graph::functions::geometry_node::{GeometryExecFn, GeometryNodeFunction};
use crate::lazy_graph::functions::multi_function_node::MultiFunctionNodeFunction;
use crate::lazy_graph::functions::multi_input::MultiInputFunction;
use crate::lazy_graph::functions::muted::MutedFunction;
use crate::lazy_graph::functions::reroute::RerouteFunction;
use crate::lazy_graph::functions::FunctionInterface;
use crate::lazy_graph::{InputSocketId, LazyGraph, LazyNodeId, OutputSocketId, Resources};
use crate::multi_function::MultiFunction;
use crate::node_tree::{InputSocketRef, InterfaceSocket, Node, NodeKind, NodeTree, OutputSocketRef};
use crate::types::{ResolvedType, TypeRegistry};
use std::sync::Arc;

/// Adds the dummy nodes standing for the tree's interface.
pub(crate) fn add_interface_dummies(
    tree: &NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    ctx: &LoweringContext,
) -> GraphMapping {
    fn resolve_all(
        sockets: &[InterfaceSocket],
        types: &TypeRegistry,
    ) -> (Vec<ResolvedType>, Vec<Option<usize>>) {
        let mut resolved = Vec::new();
        let mut positions = Vec::new();
        for socket in sockets {
            match types.resolve(&socket.socket_type) {
                Some(ty) => {
                    positions.push(Some(resolved.len()));
                    resolved.push(ty);
                }
                None => positions.push(None),
            }
        }
        (resolved, positions)
    }

    let (input_types, input_positions) = resolve_all(&tree.interface_inputs, ctx.types);
    let (output_types, output_positions) = resolve_all(&tree.interface_outputs, ctx.types);
    let group_input_node = graph.add_dummy(format!("{} Input", tree.name), Vec::new(), input_types);
    let group_output_node = graph.add_dummy(format!("{} Output", tree.name), output_types, Vec::new());

    let group_output_sockets: Vec<Option<InputSocketId>> = output_positions
        .iter()
        .map(|position| position.map(|i| InputSocketId::new(group_output_node, i)))
        .collect();
    for (socket, target) in tree.interface_outputs.iter().zip(&group_output_sockets) {
        if let Some(target) = target {
            prepare_default_value(graph, resources, *target, socket.default_value.as_ref(), ctx.types);
        }
    }
    GraphMapping {
        group_input_node,
        group_output_node,
        group_input_sockets: input_positions
            .iter()
            .map(|position| position.map(|i| OutputSocketId::new(group_input_node, i)))
            .collect(),
        group_output_sockets,
        group_output_bound: false,
    }
}

pub(crate) fn translate_node<'a>(
    node: &'a Node,
    tree: &'a NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    mapping: &mut GraphMapping,
    maps: &mut SocketMaps,
    ctx: &mut LoweringContext<'a>,
) -> Result<(), LoweringError> {
    if node.muted {
        translate_muted_node(node, graph, resources, maps, ctx.types);
        return Ok(());
    }
    match &node.kind {
        NodeKind::Frame => {}
        NodeKind::Reroute => translate_reroute(node, graph, resources, maps, ctx.types),
        NodeKind::GroupInput => {
            for (index, socket) in node.outputs.iter().enumerate() {
                if let Some(Some(dummy)) = mapping.group_input_sockets.get(index) {
                    if socket.available {
                        maps.set_output(OutputSocketRef::new(node.id, index), *dummy);
                    }
                }
            }
        }
        NodeKind::GroupOutput { .. } => {
            if mapping.group_output_bound || tree.active_group_output() != Some(node.id) {
                return Ok(());
            }
            for (index, socket) in node.inputs.iter().enumerate() {
                if let Some(Some(dummy)) = mapping.group_output_sockets.get(index) {
                    maps.add_input(InputSocketRef::new(node.id, index), *dummy);
                    prepare_socket_default_value(graph, resources, *dummy, socket, ctx.types);
                }
            }
            mapping.group_output_bound = true;
        }
        NodeKind::Group(group_tree) => {
            group::translate_group_node(node, group_tree, graph, resources, maps, ctx)?;
        }
        NodeKind::Function { idname } => match ctx.node_types.get(idname) {
            Some(info) => {
                if let Some(execute) = &info.execute {
                    translate_geometry_node(
                        node,
                        tree,
                        execute.clone(),
                        info.execute_supports_laziness,
                        graph,
                        resources,
                        maps,
                        ctx.types,
                    );
                } else if let Some(function) = &info.multi_function {
                    translate_multi_function_node(node, tree, function.clone(), graph, resources, maps, ctx.types);
                }
            }
            None => log::debug!("Skipping {} of unknown type {idname}", node.name),
        },
    }
    Ok(())
}

/// Maps every kept socket of `node` to the corresponding socket of `lazy_node`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn bind_sockets(
    node: &Node,
    lazy_node: LazyNodeId,
    used_inputs: &[usize],
    used_outputs: &[usize],
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    types: &TypeRegistry,
) {
    for (j, &i) in used_inputs.iter().enumerate() {
        let target = InputSocketId::new(lazy_node, j);
        maps.add_input(InputSocketRef::new(node.id, i), target);
        prepare_socket_default_value(graph, resources, target, &node.inputs[i], types);
    }
    for (j, &i) in used_outputs.iter().enumerate() {
        maps.set_output(OutputSocketRef::new(node.id, i), OutputSocketId::new(lazy_node, j));
    }
}

fn translate_muted_node(
    node: &Node,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    types: &TypeRegistry,
) {
    let interface = interface_from_node(node, types, false);
    let internal_links: Vec<(usize, usize)> = node
        .internal_links
        .iter()
        .filter_map(|link| {
            let input = interface.used_inputs.iter().position(|&i| i == link.from_input)?;
            let output = interface.used_outputs.iter().position(|&i| i == link.to_output)?;
            Some((input, output))
        })
        .collect();
    let NodeInterface {
        used_inputs,
        used_outputs,
        inputs,
        outputs,
    } = interface;
    let function = MutedFunction::new(node.name.clone(), inputs, outputs, &internal_links, types);
    let lazy_node = graph.add_function(resources, function);
    bind_sockets(node, lazy_node, &used_inputs, &used_outputs, graph, resources, maps, types);
}

fn translate_reroute(
    node: &Node,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    types: &TypeRegistry,
) {
    let (Some(input), Some(_)) = (node.inputs.first(), node.outputs.first()) else {
        return;
    };
    let Some(ty) = types.resolve(&input.socket_type) else {
        return;
    };
    let lazy_node = graph.add_function(resources, RerouteFunction::new(ty));
    bind_sockets(node, lazy_node, &[0], &[0], graph, resources, maps, types);
}

#[allow(clippy::too_many_arguments)]
fn translate_geometry_node(
    node: &Node,
    tree: &NodeTree,
    execute: GeometryExecFn,
    supports_laziness: bool,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    types: &TypeRegistry,
) {
    let interface = interface_from_node(node, types, supports_laziness);
    let input_identifiers = interface.input_identifiers(node);
    let output_identifiers = interface.output_identifiers(node);
    let NodeInterface {
        used_inputs,
        used_outputs,
        inputs,
        outputs,
    } = interface;
    let function = GeometryNodeFunction::new(
        FunctionInterface {
            name: node.name.clone(),
            inputs,
            outputs,
        },
        input_identifiers,
        output_identifiers,
        execute,
    );
    let lazy_node = graph.add_function(resources, function);

    for (j, &i) in used_inputs.iter().enumerate() {
        let socket = &node.inputs[i];
        let source = InputSocketRef::new(node.id, i);
        let target = InputSocketId::new(lazy_node, j);
        if socket.multi_input {
            let Some(element) = types.resolve(&socket.socket_type) else {
                continue;
            };
            let link_count = tree.links_to(source).filter(|link| !link.muted).count();
            let list_type = graph.input(target).ty().clone();
            let collector = graph.add_function(resources, MultiInputFunction::new(element, list_type, link_count));
            graph.add_link(OutputSocketId::new(collector, 0), target);
            maps.multi_input_nodes.insert(source, collector);
            for k in 0..link_count {
                prepare_socket_default_value(graph, resources, InputSocketId::new(collector, k), socket, types);
            }
        } else {
            maps.add_input(source, target);
            prepare_socket_default_value(graph, resources, target, socket, types);
            if !tree.has_unmuted_links_to(source) {
                create_implicit_input_if_necessary(graph, resources, target, socket);
            }
        }
    }
    bind_sockets(node, lazy_node, &[], &used_outputs, graph, resources, maps, types);
}

fn translate_multi_function_node(
    node: &Node,
    tree: &NodeTree,
    function: Arc<dyn MultiFunction>,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    maps: &mut SocketMaps,
    types: &TypeRegistry,
) {
    let interface = interface_from_node(node, types, false);
    let signature = function.signature();
    let input_types: Vec<_> = interface.inputs.iter().map(|input| input.ty.base_type()).collect();
    let output_types: Vec<_> = interface.outputs.iter().map(|output| output.ty.base_type()).collect();
    if input_types != signature.inputs.iter().copied().map(Some).collect::<Vec<_>>()
        || output_types != signature.outputs.iter().copied().map(Some).collect::<Vec<_>>()
    {
        log::warn!(
            "Skipping {}: its sockets do not match multi-function {}",
            node.name,
            function.name()
        );
        return;
    }
    let output_identifiers = interface.output_identifiers(node);
    let NodeInterface {
        used_inputs,
        used_outputs,
        inputs,
        outputs,
    } = interface;
    let lazy_function = MultiFunctionNodeFunction::new(
        FunctionInterface {
            name: node.name.clone(),
            inputs,
            outputs,
        },
        function,
        output_identifiers,
    );
    let lazy_node = graph.add_function(resources, lazy_function);
    bind_sockets(node, lazy_node, &used_inputs, &used_outputs, graph, resources, maps, types);
    for (j, &i) in used_inputs.iter().enumerate() {
        if !tree.has_unmuted_links_to(InputSocketRef::new(node.id, i)) {
            let target = InputSocketId::new(lazy_node, j);
            create_implicit_input_if_necessary(graph, resources, target, &node.inputs[i]);
        }
    }
}
