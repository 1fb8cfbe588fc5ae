//! Demand-driven evaluation of a [`LazyGraph`].
//!
//! Evaluation starts at the requested graph outputs and pulls values backwards.
//! `Used` inputs are computed before a function runs, `Maybe` inputs only once
//! the function requests them, `Unused` inputs never. A function that returns
//! without producing the output being pulled, after requesting inputs, runs again
//! once those inputs are loaded. When a graph input is not available yet the
//! evaluation suspends: the state stays in [`ExecutorStorage`] and the caller runs
//! the executor again after providing it.
use crate::lazy_graph::functions::NodeStorage;
use crate::lazy_graph::params::{Context, Params};
use crate::lazy_graph::{
    InputSocketId, LazyGraph, LazyNode, LazyNodeId, LazyNodeKind, OutputSocketId, Resources, ValueUsage,
};
use crate::value::SocketValue;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Expected {expected} graph inputs, got {actual}")]
    InputCountMismatch { expected: usize, actual: usize },
    #[error("Graph output {0} was not produced")]
    UnproducedOutput(usize),
}

#[derive(Debug, Default)]
struct InputState {
    value: Option<SocketValue>,
    requested: bool,
    loaded: bool,
}

#[derive(Debug, Default)]
struct OutputState {
    value: Option<SocketValue>,
    produced: bool,
    /// Pulled by a consumer at least once.
    requested: bool,
}

#[derive(Debug, Default)]
struct NodeState {
    inputs: Vec<InputState>,
    outputs: Vec<OutputState>,
    storage: Option<NodeStorage>,
    loading: bool,
    executions: usize,
}

/// Evaluation state of one graph execution.
#[derive(Debug, Default)]
pub struct ExecutorStorage {
    nodes: Vec<NodeState>,
}

impl ExecutorStorage {
    /// How many times the node's function ran.
    pub fn execution_count(&self, node: LazyNodeId) -> usize {
        self.nodes.get(node.index()).map_or(0, |state| state.executions)
    }
}

pub struct LazyGraphExecutor<'g> {
    graph: &'g LazyGraph,
    resources: &'g Resources,
    graph_inputs: &'g [Option<OutputSocketId>],
    graph_outputs: &'g [Option<InputSocketId>],
}

impl<'g> LazyGraphExecutor<'g> {
    pub fn new(
        graph: &'g LazyGraph,
        resources: &'g Resources,
        graph_inputs: &'g [Option<OutputSocketId>],
        graph_outputs: &'g [Option<InputSocketId>],
    ) -> Self {
        Self {
            graph,
            resources,
            graph_inputs,
            graph_outputs,
        }
    }

    pub fn init_storage(&self) -> ExecutorStorage {
        let nodes = self
            .graph
            .node_ids()
            .map(|id| {
                let node = self.graph.node(id);
                NodeState {
                    inputs: node.inputs().iter().map(|_| InputState::default()).collect(),
                    outputs: node.outputs().iter().map(|_| OutputState::default()).collect(),
                    storage: match node.kind() {
                        LazyNodeKind::Function(function) => self.resources.function(function).init_storage(),
                        LazyNodeKind::Dummy => None,
                    },
                    loading: false,
                    executions: 0,
                }
            })
            .collect();
        ExecutorStorage { nodes }
    }

    /// Hands node storage back to the functions that created it.
    pub fn destruct_storage(&self, storage: ExecutorStorage) {
        for (id, state) in self.graph.node_ids().zip(storage.nodes) {
            if let (LazyNodeKind::Function(function), Some(node_storage)) = (self.graph.node(id).kind(), state.storage) {
                self.resources.function(function).destruct_storage(node_storage);
            }
        }
    }

    /// Computes every graph output `io` has not produced yet. Outputs depending on
    /// graph inputs that `io` cannot provide yet stay unproduced.
    pub fn execute(&self, io: &mut dyn Params, context: &Context, storage: &mut ExecutorStorage) {
        for (index, socket) in self.graph_outputs.iter().enumerate() {
            let Some(socket) = socket else {
                continue;
            };
            if io.output_was_produced(index) || io.get_output_usage(index) == ValueUsage::Unused {
                continue;
            }
            if let Some(value) = self.compute_input(*socket, io, context, storage) {
                io.set_output(index, value);
            }
        }
    }

    fn default_input_value(&self, socket: InputSocketId) -> SocketValue {
        let input = self.graph.input(socket);
        match input.default_value() {
            Some(value) => input.ty().copy(self.resources.value(value)),
            None => input.ty().value_initialize(),
        }
    }

    fn compute_input(
        &self,
        socket: InputSocketId,
        io: &mut dyn Params,
        context: &Context,
        storage: &mut ExecutorStorage,
    ) -> Option<SocketValue> {
        match self.graph.input(socket).origin() {
            Some(origin) => self.compute_output(origin, io, context, storage),
            None => Some(self.default_input_value(socket)),
        }
    }

    fn compute_output(
        &self,
        socket: OutputSocketId,
        io: &mut dyn Params,
        context: &Context,
        storage: &mut ExecutorStorage,
    ) -> Option<SocketValue> {
        let node = self.graph.node(socket.node);
        match node.kind() {
            LazyNodeKind::Dummy => match self.graph_inputs.iter().position(|input| *input == Some(socket)) {
                Some(index) => io
                    .try_get_input_or_request(index)
                    .map(|value| node.outputs()[socket.index].ty().copy(value)),
                None => Some(node.outputs()[socket.index].ty().value_initialize()),
            },
            LazyNodeKind::Function(_) => self.compute_function_output(socket, node, io, context, storage),
        }
    }

    fn compute_function_output(
        &self,
        socket: OutputSocketId,
        node: &LazyNode,
        io: &mut dyn Params,
        context: &Context,
        storage: &mut ExecutorStorage,
    ) -> Option<SocketValue> {
        let node_index = socket.node.index();
        let output_type = node.outputs()[socket.index].ty();
        let LazyNodeKind::Function(function_id) = node.kind() else {
            return None;
        };
        let function = self.resources.function(function_id);
        storage.nodes[node_index].outputs[socket.index].requested = true;
        loop {
            let state = &storage.nodes[node_index];
            let output = &state.outputs[socket.index];
            if output.produced {
                return Some(match &output.value {
                    Some(value) => output_type.copy(value),
                    None => output_type.value_initialize(),
                });
            }
            if state.loading {
                log::warn!("{} depends on its own output, using a default value", node.name());
                return Some(output_type.value_initialize());
            }

            let pending: Vec<usize> = state
                .inputs
                .iter()
                .enumerate()
                .filter(|(i, input)| {
                    !input.loaded && (input.requested || node.inputs()[*i].usage() == ValueUsage::Used)
                })
                .map(|(i, _)| i)
                .collect();
            storage.nodes[node_index].loading = true;
            for i in pending {
                let value = self.compute_input(InputSocketId::new(socket.node, i), io, context, storage);
                let input = &mut storage.nodes[node_index].inputs[i];
                match value {
                    Some(value) => {
                        input.value = Some(value);
                        input.loaded = true;
                        input.requested = false;
                    }
                    None => {
                        storage.nodes[node_index].loading = false;
                        return None;
                    }
                }
            }
            storage.nodes[node_index].loading = false;

            let state = &mut storage.nodes[node_index];
            let NodeState {
                inputs,
                outputs,
                storage: node_storage,
                executions,
                ..
            } = &mut *state;
            let mut params = NodeParams { node, inputs, outputs };
            function.execute(&mut params, context, node_storage.as_mut());
            *executions += 1;

            if state.outputs[socket.index].produced {
                continue;
            }
            let has_new_requests = state.inputs.iter().any(|input| input.requested && !input.loaded);
            if !has_new_requests {
                log::warn!(
                    "{} finished without producing output {}, using a default value",
                    node.name(),
                    node.outputs()[socket.index].ty()
                );
                let output = &mut state.outputs[socket.index];
                output.value = Some(output_type.value_initialize());
                output.produced = true;
            }
        }
    }
}

struct NodeParams<'s> {
    node: &'s LazyNode,
    inputs: &'s mut [InputState],
    outputs: &'s mut [OutputState],
}

impl Params for NodeParams<'_> {
    fn output_slot(&mut self, index: usize) -> &mut Option<SocketValue> {
        &mut self.outputs[index].value
    }

    fn try_get_input(&self, index: usize) -> Option<&SocketValue> {
        self.inputs[index].value.as_ref()
    }

    fn try_get_input_or_request(&mut self, index: usize) -> Option<&SocketValue> {
        debug_assert_ne!(self.node.inputs()[index].usage(), ValueUsage::Unused);
        let input = &mut self.inputs[index];
        if !input.loaded {
            input.requested = true;
        }
        input.value.as_ref()
    }

    fn take_input(&mut self, index: usize) -> Option<SocketValue> {
        self.inputs[index].value.take()
    }

    fn mark_output_produced(&mut self, index: usize) {
        let output = &mut self.outputs[index];
        debug_assert!(
            output
                .value
                .as_ref()
                .is_none_or(|value| self.node.outputs()[index].ty().matches(value)),
            "{} produced a value of the wrong type",
            self.node.name()
        );
        output.produced = true;
    }

    fn output_was_produced(&self, index: usize) -> bool {
        self.outputs[index].produced
    }

    fn get_output_usage(&self, index: usize) -> ValueUsage {
        if self.outputs[index].requested {
            ValueUsage::Used
        } else if self.node.outputs()[index].targets().is_empty() {
            ValueUsage::Unused
        } else {
            ValueUsage::Maybe
        }
    }
}

/// Params for a top-level execution where every graph input is known up front.
#[derive(Debug)]
pub struct GraphIoParams {
    inputs: Vec<Option<SocketValue>>,
    outputs: Vec<Option<SocketValue>>,
    produced: Vec<bool>,
}

impl GraphIoParams {
    pub fn new(inputs: Vec<SocketValue>, output_count: usize) -> Self {
        Self {
            inputs: inputs.into_iter().map(Some).collect(),
            outputs: vec![None; output_count],
            produced: vec![false; output_count],
        }
    }

    pub fn into_outputs(self) -> Vec<Option<SocketValue>> {
        self.outputs
    }
}

impl Params for GraphIoParams {
    fn output_slot(&mut self, index: usize) -> &mut Option<SocketValue> {
        &mut self.outputs[index]
    }

    fn try_get_input(&self, index: usize) -> Option<&SocketValue> {
        self.inputs.get(index)?.as_ref()
    }

    fn try_get_input_or_request(&mut self, index: usize) -> Option<&SocketValue> {
        self.try_get_input(index)
    }

    fn take_input(&mut self, index: usize) -> Option<SocketValue> {
        self.inputs.get_mut(index)?.take()
    }

    fn mark_output_produced(&mut self, index: usize) {
        self.produced[index] = true;
    }

    fn output_was_produced(&self, index: usize) -> bool {
        self.produced[index]
    }
}
