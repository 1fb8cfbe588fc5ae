use crate::field::ValueOrField;
use crate::types::{BaseType, RuntimeType, TypeError};
use serde::{Deserialize, Serialize};

/// A single concrete value of one of the base types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vector([f32; 3]),
    Color([f32; 4]),
    String(String),
}

impl Value {
    pub fn default_for(base_type: BaseType) -> Self {
        match base_type {
            BaseType::Float => Value::Float(0.0),
            BaseType::Int => Value::Int(0),
            BaseType::Bool => Value::Bool(false),
            BaseType::Vector => Value::Vector([0.0; 3]),
            BaseType::Color => Value::Color([0.0; 4]),
            BaseType::String => Value::String(String::new()),
        }
    }

    pub fn base_type(&self) -> BaseType {
        match self {
            Value::Float(_) => BaseType::Float,
            Value::Int(_) => BaseType::Int,
            Value::Bool(_) => BaseType::Bool,
            Value::Vector(_) => BaseType::Vector,
            Value::Color(_) => BaseType::Color,
            Value::String(_) => BaseType::String,
        }
    }

    /// Parses command line style text, `1,2,3` for vectors and colors.
    pub fn parse(base_type: BaseType, text: &str) -> Result<Self, TypeError> {
        let err = || TypeError::Parse(text.to_string(), base_type);
        let floats = || -> Result<Vec<f32>, TypeError> {
            text.split(',')
                .map(|part| part.trim().parse::<f32>().map_err(|_| err()))
                .collect()
        };
        Ok(match base_type {
            BaseType::Float => Value::Float(text.trim().parse().map_err(|_| err())?),
            BaseType::Int => Value::Int(text.trim().parse().map_err(|_| err())?),
            BaseType::Bool => Value::Bool(text.trim().parse().map_err(|_| err())?),
            BaseType::Vector => Value::Vector(floats()?.try_into().map_err(|_| err())?),
            BaseType::Color => Value::Color(floats()?.try_into().map_err(|_| err())?),
            BaseType::String => Value::String(text.to_string()),
        })
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f32; 3]> {
        match self {
            Value::Vector(x) => Some(*x),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Float(x) => write!(f, "{x}"),
            Value::Int(x) => write!(f, "{x}"),
            Value::Bool(x) => write!(f, "{x}"),
            Value::Vector([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Value::Color([r, g, b, a]) => write!(f, "rgba({r}, {g}, {b}, {a})"),
            Value::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Opaque geometry container. Only a point cloud is modelled, enough for nodes
/// to evaluate fields against a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometrySet {
    points: Vec<[f32; 3]>,
}

impl GeometrySet {
    pub fn from_points(points: Vec<[f32; 3]>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut Vec<[f32; 3]> {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn join(geometries: impl IntoIterator<Item = GeometrySet>) -> Self {
        let mut points = Vec::new();
        for geometry in geometries {
            points.extend(geometry.points);
        }
        Self { points }
    }
}

/// Everything that can flow along a link of the lazy graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketValue {
    ValueOrField(ValueOrField),
    Geometry(GeometrySet),
    List {
        element: RuntimeType,
        items: Vec<SocketValue>,
    },
}

impl SocketValue {
    pub fn runtime_type(&self) -> RuntimeType {
        match self {
            SocketValue::ValueOrField(value) => RuntimeType::ValueOrField(value.base_type()),
            SocketValue::Geometry(_) => RuntimeType::Geometry,
            SocketValue::List { element, .. } => RuntimeType::List(Box::new(element.clone())),
        }
    }

    pub fn as_value_or_field(&self) -> Option<&ValueOrField> {
        match self {
            SocketValue::ValueOrField(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value_or_field(self) -> Option<ValueOrField> {
        match self {
            SocketValue::ValueOrField(value) => Some(value),
            _ => None,
        }
    }

    /// The concrete value, if this is a value-or-field holding a plain value.
    pub fn as_value(&self) -> Option<&Value> {
        self.as_value_or_field().and_then(|v| v.as_value())
    }

    pub fn as_float(&self) -> Option<f32> {
        self.as_value().and_then(|v| v.as_float())
    }

    pub fn as_geometry(&self) -> Option<&GeometrySet> {
        match self {
            SocketValue::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    pub fn into_geometry(self) -> Option<GeometrySet> {
        match self {
            SocketValue::Geometry(geometry) => Some(geometry),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SocketValue]> {
        match self {
            SocketValue::List { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn is_field(&self) -> bool {
        match self {
            SocketValue::ValueOrField(value) => value.is_field(),
            SocketValue::Geometry(_) => false,
            SocketValue::List { items, .. } => items.iter().any(|item| item.is_field()),
        }
    }
}

impl From<Value> for SocketValue {
    fn from(value: Value) -> Self {
        SocketValue::ValueOrField(ValueOrField::Value(value))
    }
}

impl From<f32> for SocketValue {
    fn from(value: f32) -> Self {
        Value::Float(value).into()
    }
}

impl From<i32> for SocketValue {
    fn from(value: i32) -> Self {
        Value::Int(value).into()
    }
}

impl From<ValueOrField> for SocketValue {
    fn from(value: ValueOrField) -> Self {
        SocketValue::ValueOrField(value)
    }
}

impl From<GeometrySet> for SocketValue {
    fn from(value: GeometrySet) -> Self {
        SocketValue::Geometry(value)
    }
}

impl std::fmt::Display for SocketValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocketValue::ValueOrField(ValueOrField::Value(value)) => write!(f, "{value}"),
            SocketValue::ValueOrField(ValueOrField::Field(field)) => {
                write!(f, "<field {}>", field.base_type())
            }
            SocketValue::Geometry(geometry) => write!(f, "<geometry {} points>", geometry.len()),
            SocketValue::List { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        assert_eq!(Value::parse(BaseType::Float, "2.5").unwrap(), Value::Float(2.5));
        assert_eq!(
            Value::parse(BaseType::Vector, "1, 2,3").unwrap(),
            Value::Vector([1.0, 2.0, 3.0])
        );
        assert!(Value::parse(BaseType::Vector, "1,2").is_err());
        assert!(Value::parse(BaseType::Int, "x").is_err());
    }

    #[test]
    fn test_join_geometry_keeps_order() {
        let a = GeometrySet::from_points(vec![[0.0, 0.0, 0.0]]);
        let b = GeometrySet::from_points(vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let joined = GeometrySet::join([a, b]);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.points()[2], [2.0, 0.0, 0.0]);
    }
}
