//! The user-authored source program: nodes with typed sockets joined by links.
mod links;
mod nodes;

pub use links::{InputSocketRef, Link, LinkId, OutputSocketRef};
pub use nodes::{InternalLink, Node, NodeKind, Socket};

use crate::graph::InnerGraph;
use crate::types::SocketType;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of a tree's group interface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterfaceSocket {
    pub identifier: String,
    pub socket_type: SocketType,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl InterfaceSocket {
    pub fn new(identifier: impl Into<String>, socket_type: SocketType) -> Self {
        Self {
            identifier: identifier.into(),
            socket_type,
            default_value: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeTree {
    pub name: String,
    #[serde(default)]
    pub interface_inputs: Vec<InterfaceSocket>,
    #[serde(default)]
    pub interface_outputs: Vec<InterfaceSocket>,
    nodes: Vec<Node>,
    #[serde(default)]
    links: Vec<Link>,
}

impl NodeTree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        match self.nodes.get(id.0 as usize) {
            Some(node) if node.id == id => Some(node),
            _ => self.nodes.iter().find(|node| node.id == id),
        }
    }

    pub fn input_socket(&self, socket: InputSocketRef) -> Option<&Socket> {
        self.node(socket.node)?.inputs.get(socket.index)
    }

    pub fn output_socket(&self, socket: OutputSocketRef) -> Option<&Socket> {
        self.node(socket.node)?.outputs.get(socket.index)
    }

    /// Links leaving `socket`, in tree order.
    pub fn links_from(&self, socket: OutputSocketRef) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.from == socket)
    }

    /// Links arriving at `socket`, in tree order. For multi-input sockets this
    /// order is the order the values are aggregated in.
    pub fn links_to(&self, socket: InputSocketRef) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.to == socket)
    }

    pub fn has_unmuted_links_to(&self, socket: InputSocketRef) -> bool {
        self.links_to(socket).any(|link| !link.muted)
    }

    /// The group output node that defines the tree's results: the one flagged
    /// active, otherwise the first one.
    pub fn active_group_output(&self) -> Option<NodeId> {
        let mut first = None;
        for node in &self.nodes {
            if let NodeKind::GroupOutput { is_active_output } = node.kind {
                if is_active_output {
                    return Some(node.id);
                }
                first.get_or_insert(node.id);
            }
        }
        first
    }
}

impl InnerGraph for NodeTree {
    type NodeId = NodeId;
    type AnyNode = Node;
    type AnyLink = Link;

    fn nodes(&self) -> impl Iterator<Item = NodeId> {
        self.nodes.iter().map(|node| node.id)
    }

    fn links(&self) -> impl Iterator<Item = Link> {
        self.links.iter().filter(|link| !link.muted).cloned()
    }

    fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.node(*id)
    }
}

pub struct NodeTreeBuilder {
    name: String,
    next_node_id: u32,
    next_link_id: u32,
    interface_inputs: Vec<InterfaceSocket>,
    interface_outputs: Vec<InterfaceSocket>,
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl NodeTreeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_node_id: 0,
            next_link_id: 0,
            interface_inputs: Vec::new(),
            interface_outputs: Vec::new(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    fn get_next_node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        NodeId(id)
    }

    fn get_next_link_id(&mut self) -> LinkId {
        let id = self.next_link_id;
        self.next_link_id += 1;
        LinkId(id)
    }

    pub fn add_interface_input(&mut self, socket: InterfaceSocket) -> usize {
        self.interface_inputs.push(socket);
        self.interface_inputs.len() - 1
    }

    pub fn add_interface_output(&mut self, socket: InterfaceSocket) -> usize {
        self.interface_outputs.push(socket);
        self.interface_outputs.len() - 1
    }

    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.get_next_node_id();
        node.id = id;
        self.nodes.push(node);
        id
    }

    /// Adds a group input node exposing the interface inputs declared so far.
    pub fn add_group_input_node(&mut self, name: impl Into<String>) -> NodeId {
        let mut node = Node::new(name, NodeKind::GroupInput);
        node.outputs = self.interface_inputs.iter().map(Socket::from_interface).collect();
        self.add_node(node)
    }

    /// Adds a group output node consuming the interface outputs declared so far.
    /// The first one added is the active one.
    pub fn add_group_output_node(&mut self, name: impl Into<String>) -> NodeId {
        let is_active_output = !self
            .nodes
            .iter()
            .any(|node| matches!(node.kind, NodeKind::GroupOutput { .. }));
        let mut node = Node::new(name, NodeKind::GroupOutput { is_active_output });
        node.inputs = self.interface_outputs.iter().map(Socket::from_interface).collect();
        self.add_node(node)
    }

    /// Adds a node invoking `tree`, with sockets mirroring its interface.
    pub fn add_group_node(&mut self, name: impl Into<String>, tree: Arc<NodeTree>) -> NodeId {
        let mut node = Node::new(name, NodeKind::Group(tree.clone()));
        node.inputs = tree.interface_inputs.iter().map(Socket::from_interface).collect();
        node.outputs = tree.interface_outputs.iter().map(Socket::from_interface).collect();
        self.add_node(node)
    }

    pub fn add_link(&mut self, from: NodeId, from_index: usize, to: NodeId, to_index: usize) -> LinkId {
        self.push_link(from, from_index, to, to_index, false)
    }

    pub fn add_muted_link(&mut self, from: NodeId, from_index: usize, to: NodeId, to_index: usize) -> LinkId {
        self.push_link(from, from_index, to, to_index, true)
    }

    fn push_link(&mut self, from: NodeId, from_index: usize, to: NodeId, to_index: usize, muted: bool) -> LinkId {
        let id = self.get_next_link_id();
        self.links.push(Link {
            id,
            from: OutputSocketRef::new(from, from_index),
            to: InputSocketRef::new(to, to_index),
            muted,
        });
        id
    }

    pub fn build(self) -> NodeTree {
        NodeTree {
            name: self.name,
            interface_inputs: self.interface_inputs,
            interface_outputs: self.interface_outputs,
            nodes: self.nodes,
            links: self.links,
        }
    }
}
