use crate::lazy_graph::executor::LazyGraphExecutor;
use crate::lazy_graph::functions::{AnyLazyFunction, FunctionInterface, LazyFunction, NodeStorage};
use crate::lazy_graph::params::{Context, ContextEntry, Params, UserData};
use crate::lazy_graph::{InputSocketId, LazyGraph, OutputSocketId, Resources};

/// Evaluates a nested node group through its own lowered graph.
///
/// The function owns the nested graph and everything it refers to. Its executor
/// state lives in the node storage, so a suspended evaluation resumes where it
/// stopped when more inputs arrive.
#[derive(Debug)]
pub struct GroupFunction {
    interface: FunctionInterface,
    tree_name: String,
    graph: LazyGraph,
    resources: Resources,
    graph_inputs: Vec<Option<OutputSocketId>>,
    graph_outputs: Vec<Option<InputSocketId>>,
}

impl GroupFunction {
    /// `graph_inputs[i]` is the nested socket providing function input `i`,
    /// `graph_outputs[j]` the nested socket computing function output `j`.
    pub fn new(
        interface: FunctionInterface,
        tree_name: impl Into<String>,
        graph: LazyGraph,
        resources: Resources,
        graph_inputs: Vec<Option<OutputSocketId>>,
        graph_outputs: Vec<Option<InputSocketId>>,
    ) -> Self {
        debug_assert_eq!(interface.inputs.len(), graph_inputs.len());
        debug_assert_eq!(interface.outputs.len(), graph_outputs.len());
        Self {
            interface,
            tree_name: tree_name.into(),
            graph,
            resources,
            graph_inputs,
            graph_outputs,
        }
    }

    pub fn graph(&self) -> &LazyGraph {
        &self.graph
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn executor(&self) -> LazyGraphExecutor<'_> {
        LazyGraphExecutor::new(&self.graph, &self.resources, &self.graph_inputs, &self.graph_outputs)
    }
}

impl LazyFunction for GroupFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, context: &Context, storage: Option<&mut NodeStorage>) {
        for (index, socket) in self.graph_outputs.iter().enumerate() {
            if socket.is_none() && !params.output_was_produced(index) {
                params.set_output(index, self.interface.outputs[index].ty.value_initialize());
            }
        }

        let stack = context.context_stack().push(ContextEntry::Group {
            node_name: self.interface.name.clone(),
            tree_name: self.tree_name.clone(),
        });
        let user_data = UserData::new(context.logger(), &stack);
        let group_context = Context::new(&user_data);

        let executor = self.executor();
        match storage {
            Some(NodeStorage::Group(executor_storage)) => {
                executor.execute(params, &group_context, executor_storage);
            }
            None => {
                log::warn!("{} executed without storage", self.interface.name);
                let mut executor_storage = executor.init_storage();
                executor.execute(params, &group_context, &mut executor_storage);
                executor.destruct_storage(executor_storage);
            }
        }
    }

    fn init_storage(&self) -> Option<NodeStorage> {
        Some(NodeStorage::Group(Box::new(self.executor().init_storage())))
    }

    fn destruct_storage(&self, storage: NodeStorage) {
        let NodeStorage::Group(executor_storage) = storage;
        self.executor().destruct_storage(*executor_storage);
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::Group(self)
    }
}
