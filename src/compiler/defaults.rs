use crate::lazy_graph::functions::complex_input::ComplexInputFunction;
use crate::lazy_graph::{InputSocketId, LazyGraph, OutputSocketId, Resources};
use crate::node_tree::Socket;
use crate::types::TypeRegistry;
use crate::value::{SocketValue, Value};

/// Stores `value` as the default of `target`, converted to the target's type.
/// Values that cannot be converted are dropped and the type default applies.
pub(crate) fn prepare_default_value(
    graph: &mut LazyGraph,
    resources: &mut Resources,
    target: InputSocketId,
    value: Option<&Value>,
    types: &TypeRegistry,
) {
    let Some(value) = value else {
        return;
    };
    let Some(base_type) = graph.input(target).ty().base_type() else {
        return;
    };
    match types.convert_value(value, base_type) {
        Some(converted) => {
            let id = resources.add_value(SocketValue::from(converted));
            graph.set_default_value(target, id);
        }
        None => log::debug!("Default {value} does not convert to {base_type}"),
    }
}

pub(crate) fn prepare_socket_default_value(
    graph: &mut LazyGraph,
    resources: &mut Resources,
    target: InputSocketId,
    socket: &Socket,
    types: &TypeRegistry,
) {
    prepare_default_value(graph, resources, target, socket.default_value.as_ref(), types);
}

/// Feeds an unlinked input that declares an implicit field from a node producing that field.
pub(crate) fn create_implicit_input_if_necessary(
    graph: &mut LazyGraph,
    resources: &mut Resources,
    target: InputSocketId,
    socket: &Socket,
) {
    let Some(input) = &socket.implicit_field else {
        return;
    };
    let ty = graph.input(target).ty().clone();
    if ty.base_type() != Some(input.base_type()) {
        log::debug!("Implicit {input:?} does not fit socket {} of type {ty}", socket.identifier);
        return;
    }
    let node = graph.add_function(resources, ComplexInputFunction::new(ty, input.clone()));
    graph.add_link(OutputSocketId::new(node, 0), target);
}
