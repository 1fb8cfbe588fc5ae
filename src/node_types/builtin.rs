//! Node types available without any registration by the caller, with helpers
//! building nodes that carry the sockets each type expects.
use crate::field::{Field, FieldInput, GeometryFieldContext, ValueOrField};
use crate::multi_function::CustomMultiFunction;
use crate::node_tree::{Node, Socket};
use crate::node_types::{GeoNodeExecParams, NodeTypeInfo, NodeTypeRegistry};
use crate::types::{BaseType, SocketType};
use crate::value::{GeometrySet, SocketValue, Value};
use std::sync::Arc;

pub const MATH_ADD: &str = "math_add";
pub const MATH_SUBTRACT: &str = "math_subtract";
pub const MATH_MULTIPLY: &str = "math_multiply";
pub const COMPARE_GREATER: &str = "compare_greater";
pub const COMBINE_XYZ: &str = "combine_xyz";
pub const SEPARATE_XYZ: &str = "separate_xyz";
pub const JOIN_GEOMETRY: &str = "join_geometry";
pub const POINTS_LINE: &str = "points_line";
pub const SET_POSITION: &str = "set_position";
pub const SWITCH: &str = "switch";

fn float_binary(name: &str, op: fn(f32, f32) -> f32) -> NodeTypeInfo {
    let function = CustomMultiFunction::new(
        name,
        vec![BaseType::Float, BaseType::Float],
        vec![BaseType::Float],
        move |inputs| match (&inputs[0], &inputs[1]) {
            (Value::Float(a), Value::Float(b)) => vec![Value::Float(op(*a, *b))],
            _ => vec![Value::Float(0.0)],
        },
    );
    NodeTypeInfo::function(name, Arc::new(function))
}

pub fn register_all(registry: &mut NodeTypeRegistry) {
    registry.register(float_binary(MATH_ADD, |a, b| a + b));
    registry.register(float_binary(MATH_SUBTRACT, |a, b| a - b));
    registry.register(float_binary(MATH_MULTIPLY, |a, b| a * b));
    registry.register(NodeTypeInfo::function(
        COMPARE_GREATER,
        Arc::new(CustomMultiFunction::new(
            COMPARE_GREATER,
            vec![BaseType::Float, BaseType::Float],
            vec![BaseType::Bool],
            |inputs| match (&inputs[0], &inputs[1]) {
                (Value::Float(a), Value::Float(b)) => vec![Value::Bool(a > b)],
                _ => vec![Value::Bool(false)],
            },
        )),
    ));
    registry.register(NodeTypeInfo::function(
        COMBINE_XYZ,
        Arc::new(CustomMultiFunction::new(
            COMBINE_XYZ,
            vec![BaseType::Float; 3],
            vec![BaseType::Vector],
            |inputs| {
                let mut v = [0.0; 3];
                for (component, input) in v.iter_mut().zip(inputs) {
                    *component = input.as_float().unwrap_or_default();
                }
                vec![Value::Vector(v)]
            },
        )),
    ));
    registry.register(NodeTypeInfo::function(
        SEPARATE_XYZ,
        Arc::new(CustomMultiFunction::new(
            SEPARATE_XYZ,
            vec![BaseType::Vector],
            vec![BaseType::Float; 3],
            |inputs| {
                let v = inputs[0].as_vector().unwrap_or_default();
                v.iter().map(|x| Value::Float(*x)).collect()
            },
        )),
    ));
    registry.register(NodeTypeInfo::geometry(JOIN_GEOMETRY, execute_join_geometry));
    registry.register(NodeTypeInfo::geometry(POINTS_LINE, execute_points_line));
    registry.register(NodeTypeInfo::geometry(SET_POSITION, execute_set_position));
    registry.register(NodeTypeInfo::geometry(SWITCH, execute_switch).with_laziness());
}

fn execute_join_geometry(params: &mut GeoNodeExecParams) {
    let geometries = match params.extract_input("Geometry") {
        Some(SocketValue::List { items, .. }) => items.into_iter().filter_map(|item| item.into_geometry()).collect(),
        _ => Vec::new(),
    };
    params.set_output("Geometry", GeometrySet::join(geometries));
}

fn execute_points_line(params: &mut GeoNodeExecParams) {
    let count = params
        .get_input("Count")
        .and_then(|value| value.as_value())
        .and_then(|value| value.as_int())
        .unwrap_or(0)
        .max(0);
    let points = (0..count).map(|i| [i as f32, 0.0, 0.0]).collect();
    params.set_output("Points", GeometrySet::from_points(points));
}

fn execute_set_position(params: &mut GeoNodeExecParams) {
    let mut geometry = params.extract_geometry("Geometry");
    let position = params.get_value_or_field("Position").cloned();
    let offset = params.get_value_or_field("Offset").cloned();
    let size = geometry.len();
    let evaluated = {
        let context = GeometryFieldContext::new(&geometry);
        let evaluate = |input: Option<ValueOrField>, fallback: FieldInput| match input {
            Some(input) => input.evaluate(&context, size),
            None => Field::input(fallback).evaluate(&context, size),
        };
        evaluate(position, FieldInput::Position).and_then(|positions| {
            let offsets = match offset {
                Some(offset) => offset.evaluate(&context, size)?,
                None => vec![Value::Vector([0.0; 3]); size],
            };
            Ok((positions, offsets))
        })
    };
    match evaluated {
        Ok((positions, offsets)) => {
            for ((point, position), offset) in geometry.points_mut().iter_mut().zip(positions).zip(offsets) {
                let position = position.as_vector().unwrap_or(*point);
                let offset = offset.as_vector().unwrap_or_default();
                *point = [position[0] + offset[0], position[1] + offset[1], position[2] + offset[2]];
            }
        }
        Err(err) => log::warn!("{}: {err}", params.node_name()),
    }
    params.set_output("Geometry", geometry);
}

/// Only the selected branch is ever computed.
fn execute_switch(params: &mut GeoNodeExecParams) {
    if params.lazy_require_input("Switch") {
        return;
    }
    let switch = params
        .get_input("Switch")
        .and_then(|value| value.as_value())
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let branch = if switch { "True" } else { "False" };
    if params.lazy_require_input(branch) {
        return;
    }
    match params.extract_input(branch) {
        Some(value) => params.set_output("Output", value),
        None => params.set_default_remaining_outputs(),
    }
}

pub fn math_node(name: impl Into<String>, idname: &str) -> Node {
    Node::function(name, idname)
        .with_input(Socket::new("A", SocketType::Float).with_default(Value::Float(0.0)))
        .with_input(Socket::new("B", SocketType::Float).with_default(Value::Float(0.0)))
        .with_output(Socket::new("Result", SocketType::Float))
}

pub fn compare_greater_node(name: impl Into<String>) -> Node {
    Node::function(name, COMPARE_GREATER)
        .with_input(Socket::new("A", SocketType::Float))
        .with_input(Socket::new("B", SocketType::Float))
        .with_output(Socket::new("Result", SocketType::Bool))
}

pub fn combine_xyz_node(name: impl Into<String>) -> Node {
    Node::function(name, COMBINE_XYZ)
        .with_input(Socket::new("X", SocketType::Float))
        .with_input(Socket::new("Y", SocketType::Float))
        .with_input(Socket::new("Z", SocketType::Float))
        .with_output(Socket::new("Vector", SocketType::Vector))
}

pub fn separate_xyz_node(name: impl Into<String>) -> Node {
    Node::function(name, SEPARATE_XYZ)
        .with_input(Socket::new("Vector", SocketType::Vector))
        .with_output(Socket::new("X", SocketType::Float))
        .with_output(Socket::new("Y", SocketType::Float))
        .with_output(Socket::new("Z", SocketType::Float))
}

pub fn join_geometry_node(name: impl Into<String>) -> Node {
    Node::function(name, JOIN_GEOMETRY)
        .with_input(Socket::new("Geometry", SocketType::Geometry).multi_input())
        .with_output(Socket::new("Geometry", SocketType::Geometry))
}

pub fn points_line_node(name: impl Into<String>, count: i32) -> Node {
    Node::function(name, POINTS_LINE)
        .with_input(Socket::new("Count", SocketType::Int).with_default(Value::Int(count)))
        .with_output(Socket::new("Points", SocketType::Geometry))
}

pub fn set_position_node(name: impl Into<String>) -> Node {
    Node::function(name, SET_POSITION)
        .with_input(Socket::new("Geometry", SocketType::Geometry))
        .with_input(Socket::new("Position", SocketType::Vector).with_implicit_field(FieldInput::Position))
        .with_input(Socket::new("Offset", SocketType::Vector))
        .with_output(Socket::new("Geometry", SocketType::Geometry))
        .with_internal_link(0, 0)
}

pub fn switch_node(name: impl Into<String>) -> Node {
    Node::function(name, SWITCH)
        .with_input(Socket::new("Switch", SocketType::Bool))
        .with_input(Socket::new("False", SocketType::Geometry))
        .with_input(Socket::new("True", SocketType::Geometry))
        .with_output(Socket::new("Output", SocketType::Geometry))
        .with_internal_link(1, 0)
}
