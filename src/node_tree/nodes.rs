use crate::field::FieldInput;
use crate::graph;
use crate::node_tree::{InterfaceSocket, NodeId, NodeTree};
use crate::types::SocketType;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Socket {
    pub identifier: String,
    pub socket_type: SocketType,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub multi_input: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
    /// Field used when the input is not linked, e.g. the position of each point.
    #[serde(default)]
    pub implicit_field: Option<FieldInput>,
}

fn default_true() -> bool {
    true
}

impl Socket {
    pub fn new(identifier: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            identifier: identifier.into(),
            socket_type,
            available: true,
            multi_input: false,
            default_value: None,
            implicit_field: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn multi_input(mut self) -> Self {
        self.multi_input = true;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_implicit_field(mut self, input: FieldInput) -> Self {
        self.implicit_field = Some(input);
        self
    }

    pub(crate) fn from_interface(socket: &InterfaceSocket) -> Self {
        Self {
            default_value: socket.default_value.clone(),
            ..Self::new(socket.identifier.clone(), socket.socket_type.clone())
        }
    }
}

/// Bypass route of a muted node: output `to_output` passes through input `from_input`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalLink {
    pub from_input: usize,
    pub to_output: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    Frame,
    Reroute,
    GroupInput,
    GroupOutput { is_active_output: bool },
    Group(Arc<NodeTree>),
    Function { idname: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub inputs: Vec<Socket>,
    #[serde(default)]
    pub outputs: Vec<Socket>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub internal_links: Vec<InternalLink>,
}

impl Node {
    /// The id is assigned when the node is added to a builder.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(0),
            name: name.into(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            muted: false,
            internal_links: Vec::new(),
        }
    }

    pub fn function(name: impl Into<String>, idname: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Function { idname: idname.into() })
    }

    pub fn reroute(name: impl Into<String>, socket_type: SocketType) -> Self {
        Self::new(name, NodeKind::Reroute)
            .with_input(Socket::new("Input", socket_type.clone()))
            .with_output(Socket::new("Output", socket_type))
    }

    pub fn frame(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Frame)
    }

    pub fn with_input(mut self, socket: Socket) -> Self {
        self.inputs.push(socket);
        self
    }

    pub fn with_output(mut self, socket: Socket) -> Self {
        self.outputs.push(socket);
        self
    }

    pub fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    pub fn with_internal_link(mut self, from_input: usize, to_output: usize) -> Self {
        self.internal_links.push(InternalLink { from_input, to_output });
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }
}

impl graph::Node for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }
}
