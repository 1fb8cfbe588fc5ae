use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use nodegraph_lazy::graph::InnerGraph;
use nodegraph_lazy::lazy_graph::observer::EvalLog;
use nodegraph_lazy::types::BaseType;
use nodegraph_lazy::{
    GroupStrategy, LoweringOptions, NodeTree, NodeTypeRegistry, SocketValue, TypeRegistry, Value,
    build_lazy_graph,
};

/// `Float=2.5` style command line value.
fn parse_input(text: &str) -> anyhow::Result<Value> {
    let (type_name, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected TYPE=VALUE, got \"{text}\""))?;
    let base_type = BaseType::from_str(type_name)?;
    Ok(Value::parse(base_type, value)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let tree_path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: nodegraph-lazy <tree.json> [--inline] [TYPE=VALUE ...]"))?;
    let mut options = LoweringOptions::default();
    let mut given = Vec::new();
    for arg in args {
        if arg == "--inline" {
            options.group_strategy = GroupStrategy::Inline;
        } else {
            given.push(parse_input(&arg)?);
        }
    }

    let text = std::fs::read_to_string(Path::new(&tree_path))
        .with_context(|| format!("Unable to read {tree_path}"))?;
    let tree: NodeTree = serde_json::from_str(&text).with_context(|| format!("Unable to parse {tree_path}"))?;

    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let lowered = build_lazy_graph(&tree, &types, &node_types, &options)?;
    log::info!(
        "Lowered {} into {} nodes with {:?} groups",
        tree.name,
        lowered.graph().node_count(),
        options.group_strategy
    );
    if lowered.graph().topological_order().is_none() {
        log::warn!("{} contains a cycle, affected outputs fall back to defaults", tree.name);
    }

    // Missing values fall back to the interface defaults, then the type defaults.
    let mut given = given.into_iter();
    let inputs = tree
        .interface_inputs
        .iter()
        .map(|socket| {
            let ty = types.resolve(&socket.socket_type);
            match (given.next().or_else(|| socket.default_value.clone()), ty) {
                (Some(value), Some(ty)) => match ty.base_type() {
                    Some(base_type) => types
                        .convert_value(&value, base_type)
                        .map(SocketValue::from)
                        .unwrap_or_else(|| ty.value_initialize()),
                    None => ty.value_initialize(),
                },
                (Some(value), None) => SocketValue::from(value),
                (None, Some(ty)) => ty.value_initialize(),
                (None, None) => SocketValue::from(0.0f32),
            }
        })
        .collect();

    let log = EvalLog::new();
    let outputs = lowered.execute(inputs, &log)?;
    for (socket, value) in tree.interface_outputs.iter().zip(outputs) {
        match value {
            Some(value) => println!("{}: {value}", socket.identifier),
            None => println!("{}: <{}>", socket.identifier, socket.socket_type),
        }
    }
    for path in log.contexts() {
        let Some(tree_log) = log.tree_log(&path) else {
            continue;
        };
        for time in &tree_log.node_execution_times {
            println!("[{path}] {} took {:?}", time.node_name, time.duration());
        }
    }
    Ok(())
}
