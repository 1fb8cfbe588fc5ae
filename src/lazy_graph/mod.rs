//! The lowered program: a graph of lazily executed functions.
//!
//! Nodes are either functions (stored in [`Resources`]) or dummies that stand in
//! for the graph's external inputs and outputs. Every input socket has at most one
//! origin; inputs without one fall back to their default value, or the type's
//! default when none was set.
use crate::graph::{self, InnerGraph};
use crate::lazy_graph::functions::AnyLazyFunction;
use crate::types::ResolvedType;
use crate::value::SocketValue;
use serde::{Deserialize, Serialize};

pub mod executor;
pub mod functions;
pub mod observer;
pub mod params;

pub use executor::{ExecutionError, ExecutorStorage, LazyGraphExecutor};
pub use params::{Context, ContextEntry, ContextPath, ContextStack, Params, UserData};

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct LazyNodeId {
    inner: usize,
}

impl LazyNodeId {
    pub fn index(&self) -> usize {
        self.inner
    }
}

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct InputSocketId {
    pub node: LazyNodeId,
    pub index: usize,
}

impl InputSocketId {
    pub fn new(node: LazyNodeId, index: usize) -> Self {
        Self { node, index }
    }
}

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutputSocketId {
    pub node: LazyNodeId,
    pub index: usize,
}

impl OutputSocketId {
    pub fn new(node: LazyNodeId, index: usize) -> Self {
        Self { node, index }
    }
}

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct FunctionId {
    inner: usize,
}

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValueId {
    inner: usize,
}

/// How strongly a function needs an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueUsage {
    /// Computed before the function runs.
    Used,
    /// Computed only when the function asks for it.
    Maybe,
    /// Never computed.
    Unused,
}

/// Owns everything the graph refers to by id: function instances and default values.
#[derive(Debug, Default)]
pub struct Resources {
    functions: Vec<AnyLazyFunction>,
    values: Vec<SocketValue>,
}

impl Resources {
    pub fn add_function(&mut self, function: AnyLazyFunction) -> FunctionId {
        self.functions.push(function);
        FunctionId {
            inner: self.functions.len() - 1,
        }
    }

    pub fn function(&self, id: FunctionId) -> &AnyLazyFunction {
        &self.functions[id.inner]
    }

    pub fn functions(&self) -> &[AnyLazyFunction] {
        &self.functions
    }

    pub fn add_value(&mut self, value: SocketValue) -> ValueId {
        self.values.push(value);
        ValueId {
            inner: self.values.len() - 1,
        }
    }

    pub fn value(&self, id: ValueId) -> &SocketValue {
        &self.values[id.inner]
    }
}

#[derive(Debug, Clone)]
pub struct LazyInputSocket {
    ty: ResolvedType,
    usage: ValueUsage,
    origin: Option<OutputSocketId>,
    default_value: Option<ValueId>,
}

impl LazyInputSocket {
    pub fn ty(&self) -> &ResolvedType {
        &self.ty
    }

    pub fn usage(&self) -> ValueUsage {
        self.usage
    }

    pub fn origin(&self) -> Option<OutputSocketId> {
        self.origin
    }

    pub fn default_value(&self) -> Option<ValueId> {
        self.default_value
    }
}

#[derive(Debug, Clone)]
pub struct LazyOutputSocket {
    ty: ResolvedType,
    targets: Vec<InputSocketId>,
}

impl LazyOutputSocket {
    pub fn ty(&self) -> &ResolvedType {
        &self.ty
    }

    pub fn targets(&self) -> &[InputSocketId] {
        &self.targets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyNodeKind {
    Function(FunctionId),
    Dummy,
}

#[derive(Debug, Clone)]
pub struct LazyNode {
    name: String,
    kind: LazyNodeKind,
    inputs: Vec<LazyInputSocket>,
    outputs: Vec<LazyOutputSocket>,
}

impl LazyNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LazyNodeKind {
        self.kind
    }

    pub fn inputs(&self) -> &[LazyInputSocket] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[LazyOutputSocket] {
        &self.outputs
    }

    pub fn is_dummy(&self) -> bool {
        self.kind == LazyNodeKind::Dummy
    }
}

impl graph::Node for LazyNode {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LazyLink {
    pub from: OutputSocketId,
    pub to: InputSocketId,
}

impl graph::Link<LazyNodeId> for LazyLink {
    fn source_node(&self) -> LazyNodeId {
        self.from.node
    }

    fn target_node(&self) -> LazyNodeId {
        self.to.node
    }
}

#[derive(Debug, Clone, Default)]
pub struct LazyGraph {
    nodes: Vec<LazyNode>,
}

impl LazyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_node(&mut self, node: LazyNode) -> LazyNodeId {
        self.nodes.push(node);
        LazyNodeId {
            inner: self.nodes.len() - 1,
        }
    }

    /// Moves `function` into `resources` and adds a node with sockets matching its interface.
    pub fn add_function(&mut self, resources: &mut Resources, function: impl Into<AnyLazyFunction>) -> LazyNodeId {
        let function = function.into();
        let interface = function.interface();
        let name = interface.name.clone();
        let inputs = interface
            .inputs
            .iter()
            .map(|input| LazyInputSocket {
                ty: input.ty.clone(),
                usage: input.usage,
                origin: None,
                default_value: None,
            })
            .collect();
        let outputs = interface
            .outputs
            .iter()
            .map(|output| LazyOutputSocket {
                ty: output.ty.clone(),
                targets: Vec::new(),
            })
            .collect();
        let function_id = resources.add_function(function);
        self.push_node(LazyNode {
            name,
            kind: LazyNodeKind::Function(function_id),
            inputs,
            outputs,
        })
    }

    /// Adds a node that only provides sockets for the graph boundary.
    pub fn add_dummy(
        &mut self,
        name: impl Into<String>,
        input_types: Vec<ResolvedType>,
        output_types: Vec<ResolvedType>,
    ) -> LazyNodeId {
        self.push_node(LazyNode {
            name: name.into(),
            kind: LazyNodeKind::Dummy,
            inputs: input_types
                .into_iter()
                .map(|ty| LazyInputSocket {
                    ty,
                    usage: ValueUsage::Used,
                    origin: None,
                    default_value: None,
                })
                .collect(),
            outputs: output_types
                .into_iter()
                .map(|ty| LazyOutputSocket { ty, targets: Vec::new() })
                .collect(),
        })
    }

    pub fn node(&self, id: LazyNodeId) -> &LazyNode {
        &self.nodes[id.inner]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = LazyNodeId> + '_ {
        (0..self.nodes.len()).map(|inner| LazyNodeId { inner })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn input(&self, socket: InputSocketId) -> &LazyInputSocket {
        &self.nodes[socket.node.inner].inputs[socket.index]
    }

    pub fn output(&self, socket: OutputSocketId) -> &LazyOutputSocket {
        &self.nodes[socket.node.inner].outputs[socket.index]
    }

    pub fn add_link(&mut self, from: OutputSocketId, to: InputSocketId) {
        debug_assert_eq!(self.output(from).ty, self.input(to).ty, "link between different types");
        debug_assert!(self.input(to).origin.is_none(), "input already has an origin");
        self.nodes[to.node.inner].inputs[to.index].origin = Some(from);
        self.nodes[from.node.inner].outputs[from.index].targets.push(to);
    }

    pub fn remove_link(&mut self, from: OutputSocketId, to: InputSocketId) {
        let input = &mut self.nodes[to.node.inner].inputs[to.index];
        if input.origin == Some(from) {
            input.origin = None;
        }
        self.nodes[from.node.inner].outputs[from.index]
            .targets
            .retain(|target| *target != to);
    }

    pub fn set_default_value(&mut self, socket: InputSocketId, value: ValueId) {
        self.nodes[socket.node.inner].inputs[socket.index].default_value = Some(value);
    }

    pub fn all_links(&self) -> impl Iterator<Item = LazyLink> + '_ {
        self.node_ids().flat_map(move |node| {
            self.node(node)
                .inputs
                .iter()
                .enumerate()
                .filter_map(move |(index, input)| {
                    input.origin.map(|from| LazyLink {
                        from,
                        to: InputSocketId::new(node, index),
                    })
                })
        })
    }
}

impl InnerGraph for LazyGraph {
    type NodeId = LazyNodeId;
    type AnyNode = LazyNode;
    type AnyLink = LazyLink;

    fn nodes(&self) -> impl Iterator<Item = LazyNodeId> {
        self.node_ids()
    }

    fn links(&self) -> impl Iterator<Item = LazyLink> {
        self.all_links()
    }

    fn get_node(&self, id: &LazyNodeId) -> Option<&LazyNode> {
        self.nodes.get(id.inner)
    }
}
