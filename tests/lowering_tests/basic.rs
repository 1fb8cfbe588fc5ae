use super::{output_float, run_tree};
use nodegraph_lazy::lazy_graph::ExecutionError;
use nodegraph_lazy::lazy_graph::functions::AnyLazyFunction;
use nodegraph_lazy::node_tree::{InterfaceSocket, Node, NodeTreeBuilder, Socket};
use nodegraph_lazy::field::FieldInput;
use nodegraph_lazy::node_types::builtin::{
    MATH_ADD, combine_xyz_node, math_node, points_line_node, separate_xyz_node, set_position_node,
};
use nodegraph_lazy::types::SocketType;
use nodegraph_lazy::{LoweringOptions, NodeTypeRegistry, SocketValue, TypeRegistry, Value, build_lazy_graph};

fn add_one_node() -> Node {
    let mut node = math_node("Add", MATH_ADD);
    node.inputs[1].default_value = Some(Value::Float(1.0));
    node
}

pub fn test_reroute_then_add(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Reroute Add");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let reroute = builder.add_node(Node::reroute("Reroute", SocketType::Float));
    let add = builder.add_node(add_one_node());
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, reroute, 0);
    builder.add_link(reroute, 0, add, 0);
    builder.add_link(add, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(2.0f32)]);
    assert_eq!(output_float(&outputs, 0), 3.0);
}

pub fn test_reroute_chain_is_identity(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Reroutes");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let first = builder.add_node(Node::reroute("First", SocketType::Float));
    let second = builder.add_node(Node::reroute("Second", SocketType::Float));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, first, 0);
    builder.add_link(first, 0, second, 0);
    builder.add_link(second, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(-4.5f32)]);
    assert_eq!(output_float(&outputs, 0), -4.5);
}

pub fn test_muted_node_converts_passed_value(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Muted");
    builder.add_interface_input(InterfaceSocket::new("Count", SocketType::Int));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let muted = builder.add_node(
        Node::function("Muted", MATH_ADD)
            .with_input(Socket::new("A", SocketType::Int))
            .with_output(Socket::new("Result", SocketType::Float))
            .with_internal_link(0, 0)
            .muted(),
    );
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, muted, 0);
    builder.add_link(muted, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(4)]);
    assert_eq!(output_float(&outputs, 0), 4.0);
}

pub fn test_muted_node_without_internal_link_gives_default(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Muted");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let muted = builder.add_node(add_one_node().muted());
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, muted, 0);
    builder.add_link(muted, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(8.0f32)]);
    assert_eq!(output_float(&outputs, 0), 0.0);
}

pub fn test_unconvertible_link_uses_type_default(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("String");
    builder.add_interface_input(InterfaceSocket::new("Text", SocketType::String));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let mut add = add_one_node();
    add.inputs[0].default_value = Some(Value::Float(5.0));
    let add = builder.add_node(add);
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, add, 0);
    builder.add_link(add, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(Value::String("2".to_string()))]);
    assert_eq!(output_float(&outputs, 0), 1.0);
}

pub fn test_ineligible_sockets_are_skipped(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Shader");
    builder.add_interface_input(InterfaceSocket::new("Shader", SocketType::Shader));
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Shader", SocketType::Shader));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let add = builder.add_node(add_one_node().with_input(Socket::new("Shader", SocketType::Shader)));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, add, 2);
    builder.add_link(input, 1, add, 0);
    builder.add_link(input, 0, output, 0);
    builder.add_link(add, 0, output, 1);
    let tree = builder.build();

    let (outputs, _) = run_tree(
        &tree,
        options,
        vec![SocketValue::from(0.0f32), SocketValue::from(1.5f32)],
    );
    assert!(outputs[0].is_none());
    assert_eq!(output_float(&outputs, 1), 2.5);
}

fn shared_conversion_tree() -> nodegraph_lazy::NodeTree {
    let mut builder = NodeTreeBuilder::new("Shared");
    builder.add_interface_input(InterfaceSocket::new("Count", SocketType::Int));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let double = builder.add_node(math_node("Double", MATH_ADD));
    let separate = builder.add_node(separate_xyz_node("Separate"));
    let sum = builder.add_node(math_node("Sum", MATH_ADD));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, double, 0);
    builder.add_link(input, 0, double, 1);
    builder.add_link(input, 0, separate, 0);
    builder.add_link(separate, 0, sum, 0);
    builder.add_link(double, 0, sum, 1);
    builder.add_link(sum, 0, output, 0);
    builder.build()
}

pub fn test_conversions_are_shared_per_target_type(options: &LoweringOptions) {
    let tree = shared_conversion_tree();
    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let lowered = build_lazy_graph(&tree, &types, &node_types, options).unwrap();
    assert_eq!(
        lowered.count_functions(|function| matches!(function, AnyLazyFunction::Conversion(_))),
        2
    );
    let outputs = lowered.execute(vec![SocketValue::from(3)], &()).unwrap();
    assert_eq!(output_float(&outputs, 0), 9.0);
}

pub fn test_input_count_mismatch(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Mismatch");
    builder.add_interface_input(InterfaceSocket::new("Value", SocketType::Float));
    builder.add_interface_output(InterfaceSocket::new("Result", SocketType::Float));
    let input = builder.add_group_input_node("Group Input");
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, output, 0);
    let tree = builder.build();

    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let lowered = build_lazy_graph(&tree, &types, &node_types, options).unwrap();
    let result = lowered.execute(Vec::new(), &());
    assert!(matches!(
        result,
        Err(ExecutionError::InputCountMismatch { expected: 1, actual: 0 })
    ));
}

pub fn test_unlinked_output_uses_interface_default(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Defaults");
    let mut result = InterfaceSocket::new("Result", SocketType::Float);
    result.default_value = Some(Value::Int(6));
    builder.add_interface_output(result);
    builder.add_group_output_node("Group Output");
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, Vec::new());
    assert_eq!(output_float(&outputs, 0), 6.0);
}

pub fn test_conversion_count_is_stable_across_builds(options: &LoweringOptions) {
    let tree = shared_conversion_tree();
    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let is_conversion = |function: &AnyLazyFunction| matches!(function, AnyLazyFunction::Conversion(_));
    let first = build_lazy_graph(&tree, &types, &node_types, options).unwrap();
    let second = build_lazy_graph(&tree, &types, &node_types, options).unwrap();
    assert_eq!(first.count_functions(is_conversion), second.count_functions(is_conversion));
    assert_eq!(first.graph().node_count(), second.graph().node_count());
}

pub fn test_unlinked_implicit_input_of_function_node_is_a_field(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Implicit");
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    builder.add_interface_output(InterfaceSocket::new("X", SocketType::Float));
    let points = builder.add_node(points_line_node("Points", 3));
    let mut separate = separate_xyz_node("Separate");
    separate.inputs[0].default_value = Some(Value::Vector([9.0, 9.0, 9.0]));
    separate.inputs[0].implicit_field = Some(FieldInput::Position);
    let separate = builder.add_node(separate);
    let combine = builder.add_node(combine_xyz_node("Combine"));
    let set_position = builder.add_node(set_position_node("Set Position"));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(points, 0, set_position, 0);
    builder.add_link(separate, 0, combine, 2);
    builder.add_link(combine, 0, set_position, 2);
    builder.add_link(set_position, 0, output, 0);
    builder.add_link(separate, 0, output, 1);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, Vec::new());
    assert!(outputs[1].as_ref().unwrap().is_field());
    let geometry = outputs[0].as_ref().and_then(|value| value.as_geometry()).unwrap();
    assert_eq!(
        geometry.points(),
        &[[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [2.0, 0.0, 2.0]]
    );
}
