use crate::lazy_graph::ValueUsage;
use crate::lazy_graph::functions::{FunctionInput, FunctionOutput};
use crate::node_tree::Node;
use crate::types::TypeRegistry;

/// Sockets of a node that take part in the lazy graph.
#[derive(Debug, Default)]
pub(crate) struct NodeInterface {
    /// Source indices of the kept input sockets, in order.
    pub used_inputs: Vec<usize>,
    pub used_outputs: Vec<usize>,
    pub inputs: Vec<FunctionInput>,
    pub outputs: Vec<FunctionOutput>,
}

impl NodeInterface {
    pub fn input_identifiers(&self, node: &Node) -> Vec<String> {
        self.used_inputs.iter().map(|&i| node.inputs[i].identifier.clone()).collect()
    }

    pub fn output_identifiers(&self, node: &Node) -> Vec<String> {
        self.used_outputs.iter().map(|&i| node.outputs[i].identifier.clone()).collect()
    }
}

/// Unavailable sockets and sockets of ineligible types are skipped. Multi-input
/// sockets of non-muted nodes receive the list type of their element type.
pub(crate) fn interface_from_node(node: &Node, types: &TypeRegistry, supports_laziness: bool) -> NodeInterface {
    let usage = if supports_laziness || node.is_group() {
        ValueUsage::Maybe
    } else {
        ValueUsage::Used
    };
    let mut interface = NodeInterface::default();
    for (index, socket) in node.inputs.iter().enumerate() {
        if !socket.available {
            continue;
        }
        let Some(mut ty) = types.resolve(&socket.socket_type) else {
            continue;
        };
        if socket.multi_input && !node.muted {
            ty = types.list_type(&ty);
        }
        interface.used_inputs.push(index);
        interface.inputs.push(FunctionInput::new(socket.identifier.clone(), ty, usage));
    }
    for (index, socket) in node.outputs.iter().enumerate() {
        if !socket.available {
            continue;
        }
        let Some(ty) = types.resolve(&socket.socket_type) else {
            continue;
        };
        interface.used_outputs.push(index);
        interface.outputs.push(FunctionOutput::new(socket.identifier.clone(), ty));
    }
    interface
}
