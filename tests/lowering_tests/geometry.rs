use super::run_tree;
use nodegraph_lazy::LoweringOptions;
use nodegraph_lazy::SocketValue;
use nodegraph_lazy::Value;
use nodegraph_lazy::lazy_graph::ContextEntry;
use nodegraph_lazy::lazy_graph::ContextPath;
use nodegraph_lazy::node_tree::{InterfaceSocket, NodeTreeBuilder};
use nodegraph_lazy::node_types::builtin::{join_geometry_node, points_line_node, set_position_node, switch_node};
use nodegraph_lazy::types::SocketType;

fn x_coordinates(value: &Option<SocketValue>) -> Vec<f32> {
    let geometry = value.as_ref().and_then(|value| value.as_geometry()).unwrap();
    geometry.points().iter().map(|point| point[0]).collect()
}

pub fn test_join_keeps_link_order(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Join");
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let two = builder.add_node(points_line_node("Two", 2));
    let three = builder.add_node(points_line_node("Three", 3));
    let ignored = builder.add_node(points_line_node("Ignored", 5));
    let join = builder.add_node(join_geometry_node("Join"));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(three, 0, join, 0);
    builder.add_muted_link(ignored, 0, join, 0);
    builder.add_link(two, 0, join, 0);
    builder.add_link(join, 0, output, 0);
    let tree = builder.build();

    let (outputs, log) = run_tree(&tree, options, Vec::new());
    assert_eq!(x_coordinates(&outputs[0]), vec![0.0, 1.0, 2.0, 0.0, 1.0]);
    let root = ContextPath(vec![ContextEntry::Root {
        tree_name: "Join".to_string(),
    }]);
    let executed: Vec<String> = log
        .tree_log(&root)
        .unwrap()
        .node_execution_times
        .into_iter()
        .map(|time| time.node_name)
        .collect();
    assert!(!executed.contains(&"Ignored".to_string()));
}

pub fn test_set_position_uses_implicit_position(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Offset");
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let points = builder.add_node(points_line_node("Points", 3));
    let mut set_position = set_position_node("Set Position");
    set_position.inputs[2].default_value = Some(Value::Vector([0.0, 0.0, 1.0]));
    let set_position = builder.add_node(set_position);
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(points, 0, set_position, 0);
    builder.add_link(set_position, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, Vec::new());
    let geometry = outputs[0].as_ref().and_then(|value| value.as_geometry()).unwrap();
    assert_eq!(
        geometry.points(),
        &[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [2.0, 0.0, 1.0]]
    );
}

pub fn test_set_position_with_linked_constant(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Constant");
    builder.add_interface_input(InterfaceSocket::new("Position", SocketType::Vector));
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let input = builder.add_group_input_node("Group Input");
    let points = builder.add_node(points_line_node("Points", 2));
    let set_position = builder.add_node(set_position_node("Set Position"));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(points, 0, set_position, 0);
    builder.add_link(input, 0, set_position, 1);
    builder.add_link(set_position, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, vec![SocketValue::from(Value::Vector([5.0, 1.0, 0.0]))]);
    let geometry = outputs[0].as_ref().and_then(|value| value.as_geometry()).unwrap();
    assert_eq!(geometry.points(), &[[5.0, 1.0, 0.0], [5.0, 1.0, 0.0]]);
}

pub fn test_switch_skips_unselected_branch(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Switch");
    builder.add_interface_input(InterfaceSocket::new("Switch", SocketType::Bool));
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let input = builder.add_group_input_node("Group Input");
    let few = builder.add_node(points_line_node("Few", 1));
    let many = builder.add_node(points_line_node("Many", 4));
    let switch = builder.add_node(switch_node("Switch"));
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(input, 0, switch, 0);
    builder.add_link(few, 0, switch, 1);
    builder.add_link(many, 0, switch, 2);
    builder.add_link(switch, 0, output, 0);
    let tree = builder.build();

    let (outputs, log) = run_tree(&tree, options, vec![SocketValue::from(Value::Bool(true))]);
    assert_eq!(x_coordinates(&outputs[0]).len(), 4);
    let root = ContextPath(vec![ContextEntry::Root {
        tree_name: "Switch".to_string(),
    }]);
    let executed: Vec<String> = log
        .tree_log(&root)
        .unwrap()
        .node_execution_times
        .into_iter()
        .map(|time| time.node_name)
        .collect();
    assert!(executed.contains(&"Many".to_string()));
    assert!(!executed.contains(&"Few".to_string()));
}

pub fn test_muted_switch_passes_false_branch(options: &LoweringOptions) {
    let mut builder = NodeTreeBuilder::new("Muted Switch");
    builder.add_interface_output(InterfaceSocket::new("Geometry", SocketType::Geometry));
    let few = builder.add_node(points_line_node("Few", 1));
    let many = builder.add_node(points_line_node("Many", 4));
    let switch = builder.add_node(switch_node("Switch").muted());
    let output = builder.add_group_output_node("Group Output");
    builder.add_link(few, 0, switch, 1);
    builder.add_link(many, 0, switch, 2);
    builder.add_link(switch, 0, output, 0);
    let tree = builder.build();

    let (outputs, _) = run_tree(&tree, options, Vec::new());
    assert_eq!(x_coordinates(&outputs[0]), vec![0.0]);
}
