pub mod basic;
pub mod geometry;
pub mod groups;

use nodegraph_lazy::lazy_graph::observer::EvalLog;
use nodegraph_lazy::{LoweringOptions, NodeTree, NodeTypeRegistry, SocketValue, TypeRegistry, build_lazy_graph};

/// Lowers `tree` with the builtin registries and runs it once.
pub fn run_tree(tree: &NodeTree, options: &LoweringOptions, inputs: Vec<SocketValue>) -> (Vec<Option<SocketValue>>, EvalLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let lowered = build_lazy_graph(tree, &types, &node_types, options).unwrap();
    let log = EvalLog::new();
    let outputs = lowered.execute(inputs, &log).unwrap();
    (outputs, log)
}

pub fn output_float(outputs: &[Option<SocketValue>], index: usize) -> f32 {
    outputs[index].as_ref().and_then(|value| value.as_float()).unwrap()
}
