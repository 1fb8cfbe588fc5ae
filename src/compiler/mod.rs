//! Lowering of node trees into lazy graphs.
//!
//! Every node is translated into zero or more lazy graph nodes and the tree's
//! links are then reconnected between the produced sockets, inserting implicit
//! conversions where socket types differ.
mod defaults;
mod group;
mod interface;
mod links;
mod translate;

use crate::graph::InnerGraph;
use crate::lazy_graph::executor::GraphIoParams;
use crate::lazy_graph::functions::AnyLazyFunction;
use crate::lazy_graph::observer::ExecutionLogger;
use crate::lazy_graph::{
    Context, ContextStack, ExecutionError, InputSocketId, LazyGraph, LazyGraphExecutor, LazyNodeId,
    OutputSocketId, Resources, UserData,
};
use crate::node_tree::{InputSocketRef, NodeTree, OutputSocketRef};
use crate::node_types::NodeTypeRegistry;
use crate::types::TypeRegistry;
use crate::value::SocketValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(thiserror::Error, Debug)]
pub enum LoweringError {
    #[error("Node group \"{0}\" contains itself")]
    RecursiveGroup(String),
}

/// How group nodes are represented in the produced graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupStrategy {
    /// One function node owning the group's own lowered graph.
    #[default]
    Opaque,
    /// The group's nodes are spliced into the enclosing graph.
    Inline,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoweringOptions {
    #[serde(default)]
    pub group_strategy: GroupStrategy,
}

/// Where a lowered tree's interface ended up in the produced graph.
#[derive(Debug, Clone)]
pub struct GraphMapping {
    pub group_input_node: LazyNodeId,
    pub group_output_node: LazyNodeId,
    /// Per interface input, the dummy output providing it. `None` for ineligible types.
    pub group_input_sockets: Vec<Option<OutputSocketId>>,
    /// Per interface output, the dummy input receiving it. `None` for ineligible types.
    pub group_output_sockets: Vec<Option<InputSocketId>>,
    /// Whether a group output node was bound to the output dummy.
    pub group_output_bound: bool,
}

/// Registries and options shared by all nested lowerings.
pub struct LoweringContext<'a> {
    pub types: &'a TypeRegistry,
    pub node_types: &'a NodeTypeRegistry,
    pub options: &'a LoweringOptions,
    tree_stack: Vec<&'a NodeTree>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(types: &'a TypeRegistry, node_types: &'a NodeTypeRegistry, options: &'a LoweringOptions) -> Self {
        Self {
            types,
            node_types,
            options,
            tree_stack: Vec::new(),
        }
    }
}

/// Source sockets mapped to the lazy graph sockets that represent them.
#[derive(Debug, Default)]
pub(crate) struct SocketMaps {
    /// A source input may be represented by several graph inputs, all fed by the same link.
    pub input_sockets: BTreeMap<InputSocketRef, Vec<InputSocketId>>,
    pub output_sockets: BTreeMap<OutputSocketRef, OutputSocketId>,
    /// Collector nodes of multi-input sockets.
    pub multi_input_nodes: HashMap<InputSocketRef, LazyNodeId>,
}

impl SocketMaps {
    pub fn add_input(&mut self, source: InputSocketRef, socket: InputSocketId) {
        self.input_sockets.entry(source).or_default().push(socket);
    }

    pub fn set_output(&mut self, source: OutputSocketRef, socket: OutputSocketId) {
        self.output_sockets.insert(source, socket);
    }
}

/// Lowers `tree` (and every group it uses) into `graph`, filling `mapping`.
pub fn lower_node_tree<'a>(
    tree: &'a NodeTree,
    graph: &mut LazyGraph,
    resources: &mut Resources,
    ctx: &mut LoweringContext<'a>,
) -> Result<GraphMapping, LoweringError> {
    if ctx.tree_stack.iter().any(|parent| std::ptr::eq(*parent, tree)) {
        return Err(LoweringError::RecursiveGroup(tree.name.clone()));
    }
    ctx.tree_stack.push(tree);
    for link in tree.dangling_links() {
        log::warn!("{}: link {} references a missing node", tree.name, link.id.0);
    }

    let mut mapping = translate::add_interface_dummies(tree, graph, resources, ctx);
    let mut maps = SocketMaps::default();
    let result = tree
        .nodes()
        .iter()
        .try_for_each(|node| translate::translate_node(node, tree, graph, resources, &mut mapping, &mut maps, ctx));
    ctx.tree_stack.pop();
    result?;

    links::resolve_links(tree, graph, resources, &maps, ctx);
    log::debug!(
        "Lowered {} into {} nodes ({} functions)",
        tree.name,
        graph.node_count(),
        resources.functions().len()
    );
    Ok(mapping)
}

pub fn build_lazy_graph(
    tree: &NodeTree,
    types: &TypeRegistry,
    node_types: &NodeTypeRegistry,
    options: &LoweringOptions,
) -> Result<LoweredGraph, LoweringError> {
    let mut ctx = LoweringContext::new(types, node_types, options);
    let mut graph = LazyGraph::new();
    let mut resources = Resources::default();
    let mapping = lower_node_tree(tree, &mut graph, &mut resources, &mut ctx)?;
    Ok(LoweredGraph {
        tree_name: tree.name.clone(),
        graph,
        resources,
        graph_inputs: mapping.group_input_sockets.clone(),
        graph_outputs: mapping.group_output_sockets.clone(),
        mapping,
    })
}

/// A lowered top-level tree, ready to execute.
#[derive(Debug)]
pub struct LoweredGraph {
    tree_name: String,
    graph: LazyGraph,
    resources: Resources,
    mapping: GraphMapping,
    graph_inputs: Vec<Option<OutputSocketId>>,
    graph_outputs: Vec<Option<InputSocketId>>,
}

impl LoweredGraph {
    pub fn graph(&self) -> &LazyGraph {
        &self.graph
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn mapping(&self) -> &GraphMapping {
        &self.mapping
    }

    pub fn executor(&self) -> LazyGraphExecutor<'_> {
        LazyGraphExecutor::new(&self.graph, &self.resources, &self.graph_inputs, &self.graph_outputs)
    }

    /// Number of function nodes for which `predicate` holds.
    pub fn count_functions(&self, predicate: impl Fn(&AnyLazyFunction) -> bool) -> usize {
        self.resources.functions().iter().filter(|f| predicate(f)).count()
    }

    /// Runs the graph once. `inputs` follows the tree's interface inputs (values
    /// for ineligible entries are ignored); the result follows its interface
    /// outputs, with `None` for ineligible ones.
    pub fn execute(
        &self,
        inputs: Vec<SocketValue>,
        logger: &dyn ExecutionLogger,
    ) -> Result<Vec<Option<SocketValue>>, ExecutionError> {
        if inputs.len() != self.graph_inputs.len() {
            return Err(ExecutionError::InputCountMismatch {
                expected: self.graph_inputs.len(),
                actual: inputs.len(),
            });
        }
        let stack = ContextStack::root(self.tree_name.clone());
        let user_data = UserData::new(logger, &stack);
        let context = Context::new(&user_data);
        let executor = self.executor();
        let mut storage = executor.init_storage();
        let mut io = GraphIoParams::new(inputs, self.graph_outputs.len());
        executor.execute(&mut io, &context, &mut storage);
        executor.destruct_storage(storage);

        let outputs = io.into_outputs();
        for (index, (socket, value)) in self.graph_outputs.iter().zip(&outputs).enumerate() {
            if socket.is_some() && value.is_none() {
                return Err(ExecutionError::UnproducedOutput(index));
            }
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_tree::{InterfaceSocket, NodeTreeBuilder};
    use crate::types::SocketType;

    #[test]
    fn test_tree_already_on_the_stack_is_rejected() {
        let mut builder = NodeTreeBuilder::new("Loop");
        builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
        let tree = builder.build();
        let types = TypeRegistry::builtin();
        let node_types = NodeTypeRegistry::builtin();
        let options = LoweringOptions::default();
        let mut ctx = LoweringContext::new(&types, &node_types, &options);
        ctx.tree_stack.push(&tree);

        let mut graph = LazyGraph::new();
        let mut resources = Resources::default();
        let result = lower_node_tree(&tree, &mut graph, &mut resources, &mut ctx);
        assert!(matches!(result, Err(LoweringError::RecursiveGroup(name)) if name == "Loop"));
        assert_eq!(ctx.tree_stack.len(), 1);
    }

    #[test]
    fn test_mapping_skips_ineligible_interface_entries() {
        let mut builder = NodeTreeBuilder::new("Mapping");
        builder.add_interface_input(InterfaceSocket::new("Shader", SocketType::Shader));
        builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
        builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
        let tree = builder.build();
        let lowered = build_lazy_graph(
            &tree,
            &TypeRegistry::builtin(),
            &NodeTypeRegistry::builtin(),
            &LoweringOptions::default(),
        )
        .unwrap();
        let mapping = lowered.mapping();
        assert!(mapping.group_input_sockets[0].is_none());
        assert_eq!(
            mapping.group_input_sockets[1],
            Some(OutputSocketId::new(mapping.group_input_node, 0))
        );
        assert!(!mapping.group_output_bound);
        assert_eq!(lowered.graph().node_count(), 2);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: LoweringOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.group_strategy, GroupStrategy::Opaque);
        let options: LoweringOptions = serde_json::from_str(r#"{"group_strategy":"Inline"}"#).unwrap();
        assert_eq!(options.group_strategy, GroupStrategy::Inline);
    }
}
