use super::{output_float, run_tree};
use nodegraph_lazy::lazy_graph::{ContextEntry, ContextPath};
use nodegraph_lazy::node_tree::{InterfaceSocket, NodeTree, NodeTreeBuilder};
use nodegraph_lazy::lazy_graph::functions::AnyLazyFunction;
use nodegraph_lazy::node_types::builtin::{MATH_ADD, MATH_MULTIPLY, join_geometry_node, math_node, points_line_node};
use nodegraph_lazy::types::SocketType;
use nodegraph_lazy::{LoweringOptions, NodeTypeRegistry, SocketValue, TypeRegistry, Value, build_lazy_graph};
use std::sync::Arc;

/// `Result = Value + Amount`, with `Amount` defaulting to one.
fn add_tree() -> Arc<NodeTree> {
    let mut builder = NodeTreeBuilder::new("Add One");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    let mut amount = InterfaceSocket::new("Amount", SocketType::Float);
    amount.default_value = Some(Value::Float(1.0));
    builder.add_interface_input(amount);
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let add = builder.add_node(math_node("Add", MATH_ADD));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, add, 0);
    builder.add_link(input, 1, add, 1);
    builder.add_link(add, 0, output, 0);
    Arc::new(builder.build())
}

fn twice_tree() -> NodeTree {
    let inner = add_tree();
    let mut builder = NodeTreeBuilder::new("Twice");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let first = builder.add_group_node("First", inner.clone());
    let second = builder.add_group_node("Second", inner);
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, first, 0);
    builder.add_link(first, 0, second, 0);
    builder.add_link(second, 0, output, 0);
    builder.build()
}

pub fn test_nested_groups(options: &LoweringOptions) {
    let (outputs, _) = run_tree(&twice_tree(), options, vec![SocketValue::from(1.0f32)]);
    assert_eq!(output_float(&outputs, 0), 3.0);
}

pub fn test_group_of_groups(options: &LoweringOptions) {
    let twice = Arc::new(twice_tree());
    let mut builder = NodeTreeBuilder::new("Outer");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Int));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let group = builder.add_group_node("Twice", twice);
    let scale = builder.add_node(math_node("Scale", MATH_MULTIPLY));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, group, 0);
    builder.add_link(group, 0, scale, 0);
    builder.add_link(input, 0, scale, 1);
    builder.add_link(scale, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(2)]);
    assert_eq!(output_float(&outputs, 0), 8.0);
}

pub fn test_group_passes_input_through(options: &LoweringOptions) {
    let mut inner = NodeTreeBuilder::new("Pass");
    inner.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    inner.add_interface_output(InterfaceSocket::new("Same", SocketType::Float));
    let mut constant = InterfaceSocket::new("Constant", SocketType::Float);
    constant.default_value = Some(Value::Float(7.0));
    inner.add_interface_output(constant);
    let inner_input = inner.add_group_input_node("Group Input");
    let inner_output = inner.add_group_output_node("Group Output");
    inner.add_link(inner_input, 0, inner_output, 0);
    let inner = Arc::new(inner.build());

    let mut builder = NodeTreeBuilder::new("Outer");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Same", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Constant", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let group = builder.add_group_node("Pass", inner);
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, group, 0);
    builder.add_link(group, 0, output, 0);
    builder.add_link(group, 1, output, 1);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(-2.0f32)]);
    assert_eq!(output_float(&outputs, 0), -2.0);
    assert_eq!(output_float(&outputs, 1), 7.0);
}

pub fn test_group_without_output_node(options: &LoweringOptions) {
    let mut inner = NodeTreeBuilder::new("Empty");
    let mut result = InterfaceSocket::new("Result", SocketType::Float);
    result.default_value = Some(Value::Float(4.0));
    inner.add_interface_output(result);
    let inner = Arc::new(inner.build());

    let mut builder = NodeTreeBuilder::new("Outer");
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let group = builder.add_group_node("Empty", inner);
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(group, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, Vec::new());
    assert_eq!(output_float(&outputs, 0), 4.0);
}

/// Opaque groups log their values under their own context.
pub fn test_opaque_group_contexts(options: &LoweringOptions) {
    let (_, log) = run_tree(&twice_tree(), options, vec![SocketValue::from(1.0f32)]);
    let first = ContextPath(vec![
        ContextEntry::Root {
            tree_name: "Twice".to_string(),
        },
        ContextEntry::Group {
            node_name: "First".to_string(),
            tree_name: "Add One".to_string(),
        },
    ]);
    assert_eq!(first.to_string(), "Twice > First(Add One)");
    let values = log.tree_log(&first).unwrap().values;
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].node_name, "Add");
    assert_eq!(values[0].value.as_float(), Some(2.0));
    assert_eq!(log.contexts().len(), 2);
}

/// Inlined groups leave no trace of their own.
pub fn test_inline_group_contexts(options: &LoweringOptions) {
    let (_, log) = run_tree(&twice_tree(), options, vec![SocketValue::from(1.0f32)]);
    let contexts = log.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].depth(), 1);
    let values = log.tree_log(&contexts[0]).unwrap().values;
    let mut results: Vec<f32> = values.iter().filter_map(|value| value.value.as_float()).collect();
    results.sort_by(f32::total_cmp);
    assert_eq!(results, vec![2.0, 3.0]);
}

pub fn test_unused_group_output_is_not_computed(options: &LoweringOptions) {
    let mut inner = NodeTreeBuilder::new("Two Outputs");
    inner.add_interface_output(InterfaceSocket::new("Used", SocketType::Geometry));
    inner.add_interface_output(InterfaceSocket::new("Unused", SocketType::Geometry));
    let used = inner.add_node(points_line_node("Used Points", 2));
    let unused = inner.add_node(points_line_node("Unused Points", 3));
    let inner_output = inner.add_group_output_node("Group Output");
    inner.add_link(used, 0, inner_output, 0);
    inner.add_link(unused, 0, inner_output, 1);
    let inner = Arc::new(inner.build());

    let mut builder = NodeTreeBuilder::new("Outer");
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let group = builder.add_group_node("Group", inner);
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(group, 0, output, 0);
    let tree = builder.build();

    let (outputs, log) = run_tree(&tree, options, Vec::new());
    let geometry = outputs[0].as_ref().and_then(|value| value.as_geometry()).unwrap();
    assert_eq!(geometry.len(), 2);
    let executed: Vec<String> = log
        .contexts()
        .iter()
        .filter_map(|path| log.tree_log(path))
        .flat_map(|tree_log| tree_log.node_execution_times)
        .map(|time| time.node_name)
        .collect();
    assert!(executed.contains(&"Used Points".to_string()));
    assert!(!executed.contains(&"Unused Points".to_string()));
}

/// The group's float feeds an int socket inside and outside the group.
fn count_tree() -> NodeTree {
    let mut inner = NodeTreeBuilder::new("Count");
    inner.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    inner.add_interface_output(InterfaceSocket::new("Value", SocketType::Float));
    inner.add_interface_output(InterfaceSocket::new("Points", SocketType::Geometry));
    let inner_input = inner.add_group_input_node("Group Input");
    let mut add = math_node("Add", MATH_ADD);
    add.inputs[1].default_value = Some(Value::Float(1.0));
    let add = inner.add_node(add);
    let points = inner.add_node(points_line_node("Inner Points", 0));
    let inner_output = inner.add_group_output_node("Group Output");
    inner.add_link(inner_input, 0, add, 0);
    inner.add_link(add, 0, points, 0);
    inner.add_link(add, 0, inner_output, 0);
    inner.add_link(points, 0, inner_output, 1);
    let inner = Arc::new(inner.build());

    let mut builder = NodeTreeBuilder::new("Outer");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let input = builder.add_group_input_node("Group Input");
    let group = builder.add_group_node("Count", inner);
    let points = builder.add_node(points_line_node("Outer Points", 0));
    let join = builder.add_node(join_geometry_node("Join"));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, group, 0);
    builder.add_link(group, 0, points, 0);
    builder.add_link(group, 1, join, 0);
    builder.add_link(points, 0, join, 0);
    builder.add_link(join, 0, output, 0);
    builder.build()
}

pub fn test_conversion_shared_across_group_boundary(options: &LoweringOptions) {
    let tree = count_tree();
    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let lowered = build_lazy_graph(&tree, &types, &node_types, options).unwrap();
    assert_eq!(
        lowered.count_functions(|function| matches!(function, AnyLazyFunction::Conversion(_))),
        1
    );
    let outputs = lowered.execute(vec![SocketValue::from(1.5f32)], &()).unwrap();
    let geometry = outputs[0].as_ref().and_then(|value| value.as_geometry()).unwrap();
    assert_eq!(geometry.len(), 4);
}
