use crate::multi_function::{ImplicitConversion, MultiFunction};
use crate::value::{SocketValue, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum::IntoEnumIterator;

#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("Expected a value of type {expected}, got {actual}")]
    Mismatch {
        expected: RuntimeType,
        actual: RuntimeType,
    },
    #[error("Unable to parse \"{0}\" as {1}")]
    Parse(String, BaseType),
    #[error(transparent)]
    UnknownBaseType(#[from] strum::ParseError),
}

/// Element type of a value-or-field socket.
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum BaseType {
    Float,
    Int,
    Bool,
    Vector,
    Color,
    String,
}

impl BaseType {
    pub fn size(&self) -> usize {
        match self {
            BaseType::Float => 4,
            BaseType::Int => 4,
            BaseType::Bool => 1,
            BaseType::Vector => 12,
            BaseType::Color => 16,
            BaseType::String => std::mem::size_of::<String>(),
        }
    }

    pub fn alignment(&self) -> usize {
        match self {
            BaseType::Bool => 1,
            BaseType::String => std::mem::align_of::<String>(),
            _ => 4,
        }
    }
}

/// Type a socket is declared with in the source node tree.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize, strum_macros::Display)]
pub enum SocketType {
    Float,
    Int,
    Bool,
    Vector,
    Color,
    String,
    Geometry,
    Shader,
    #[strum(to_string = "Custom({name})")]
    Custom { name: String },
}

impl From<BaseType> for SocketType {
    fn from(base_type: BaseType) -> Self {
        match base_type {
            BaseType::Float => SocketType::Float,
            BaseType::Int => SocketType::Int,
            BaseType::Bool => SocketType::Bool,
            BaseType::Vector => SocketType::Vector,
            BaseType::Color => SocketType::Color,
            BaseType::String => SocketType::String,
        }
    }
}

/// Shape of the values stored in a produced socket.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum RuntimeType {
    ValueOrField(BaseType),
    Geometry,
    List(Box<RuntimeType>),
}

impl RuntimeType {
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            RuntimeType::ValueOrField(base_type) => Some(*base_type),
            _ => None,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            RuntimeType::ValueOrField(base_type) => base_type.size() + 16,
            RuntimeType::Geometry => 24,
            RuntimeType::List(_) => 24,
        }
    }

    pub fn alignment(&self) -> usize {
        8
    }

    /// The value a socket of this type holds when nothing else was assigned.
    pub fn value_initialize(&self) -> SocketValue {
        match self {
            RuntimeType::ValueOrField(base_type) => SocketValue::from(Value::default_for(*base_type)),
            RuntimeType::Geometry => SocketValue::Geometry(Default::default()),
            RuntimeType::List(element) => SocketValue::List {
                element: element.as_ref().clone(),
                items: Vec::new(),
            },
        }
    }

    pub fn matches(&self, value: &SocketValue) -> bool {
        value.runtime_type() == *self
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::ValueOrField(base_type) => write!(f, "ValueOrField<{base_type}>"),
            RuntimeType::Geometry => write!(f, "GeometrySet"),
            RuntimeType::List(element) => write!(f, "List<{element}>"),
        }
    }
}

pub type CopyConstructFn = fn(&SocketValue) -> SocketValue;
pub type ValueInitializeFn = fn(&RuntimeType) -> SocketValue;
pub type EqualsFn = fn(&SocketValue, &SocketValue) -> bool;

/// Value-semantics operations a type must provide to take part in a lazy graph.
/// Moving and destructing are covered by ownership of `SocketValue`.
#[derive(Clone, Copy, Debug)]
pub struct ValueSemantics {
    pub copy_construct: CopyConstructFn,
    pub value_initialize: ValueInitializeFn,
    pub equals: EqualsFn,
}

impl ValueSemantics {
    pub fn standard() -> Self {
        Self {
            copy_construct: |value| value.clone(),
            value_initialize: RuntimeType::value_initialize,
            equals: |a, b| a == b,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub name: String,
    pub runtime_type: RuntimeType,
    pub size: usize,
    pub alignment: usize,
    pub semantics: Option<ValueSemantics>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, runtime_type: RuntimeType) -> Self {
        Self {
            name: name.into(),
            size: runtime_type.size(),
            alignment: runtime_type.alignment(),
            runtime_type,
            semantics: Some(ValueSemantics::standard()),
        }
    }

    pub fn without_value_semantics(name: impl Into<String>, runtime_type: RuntimeType) -> Self {
        Self {
            semantics: None,
            ..Self::new(name, runtime_type)
        }
    }

    pub fn has_value_semantics(&self) -> bool {
        self.semantics.is_some()
    }
}

#[derive(Debug)]
struct ResolvedTypeInner {
    name: String,
    runtime_type: RuntimeType,
    size: usize,
    alignment: usize,
    semantics: ValueSemantics,
}

/// A type descriptor that is known to provide full value semantics.
#[derive(Clone, Debug)]
pub struct ResolvedType {
    inner: Arc<ResolvedTypeInner>,
}

impl ResolvedType {
    fn from_descriptor(descriptor: &TypeDescriptor) -> Option<Self> {
        let semantics = descriptor.semantics?;
        Some(Self {
            inner: Arc::new(ResolvedTypeInner {
                name: descriptor.name.clone(),
                runtime_type: descriptor.runtime_type.clone(),
                size: descriptor.size,
                alignment: descriptor.alignment,
                semantics,
            }),
        })
    }

    pub fn value_or_field(base_type: BaseType) -> Self {
        Self::standard(format!("ValueOrField<{base_type}>"), RuntimeType::ValueOrField(base_type))
    }

    pub fn geometry() -> Self {
        Self::standard("GeometrySet", RuntimeType::Geometry)
    }

    fn standard(name: impl Into<String>, runtime_type: RuntimeType) -> Self {
        let descriptor = TypeDescriptor::new(name, runtime_type);
        Self {
            inner: Arc::new(ResolvedTypeInner {
                name: descriptor.name,
                runtime_type: descriptor.runtime_type,
                size: descriptor.size,
                alignment: descriptor.alignment,
                semantics: ValueSemantics::standard(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn runtime_type(&self) -> &RuntimeType {
        &self.inner.runtime_type
    }

    pub fn base_type(&self) -> Option<BaseType> {
        self.inner.runtime_type.base_type()
    }

    pub fn is_value_or_field(&self) -> bool {
        self.base_type().is_some()
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    pub fn alignment(&self) -> usize {
        self.inner.alignment
    }

    pub fn copy(&self, value: &SocketValue) -> SocketValue {
        (self.inner.semantics.copy_construct)(value)
    }

    pub fn value_initialize(&self) -> SocketValue {
        (self.inner.semantics.value_initialize)(&self.inner.runtime_type)
    }

    pub fn equals(&self, a: &SocketValue, b: &SocketValue) -> bool {
        (self.inner.semantics.equals)(a, b)
    }

    pub fn matches(&self, value: &SocketValue) -> bool {
        self.inner.runtime_type.matches(value)
    }
}

impl PartialEq for ResolvedType {
    fn eq(&self, other: &Self) -> bool {
        self.inner.runtime_type == other.inner.runtime_type
    }
}

impl Eq for ResolvedType {}

impl std::hash::Hash for ResolvedType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.runtime_type.hash(state)
    }
}

impl std::fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner.name)
    }
}

/// Socket type descriptors and implicit conversions between base types.
///
/// The registry is owned by the caller and handed to the lowering pass; nothing
/// in this crate looks types up through global state.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    descriptors: HashMap<SocketType, TypeDescriptor>,
    resolved: HashMap<SocketType, ResolvedType>,
    conversions: HashMap<(BaseType, BaseType), Arc<dyn MultiFunction>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All base types, geometry, and the shader type (which has no value semantics),
    /// plus the implicit conversions between numeric base types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for base_type in BaseType::iter() {
            registry.register_socket_type(
                SocketType::from(base_type),
                TypeDescriptor::new(
                    format!("ValueOrField<{base_type}>"),
                    RuntimeType::ValueOrField(base_type),
                ),
            );
        }
        registry.register_socket_type(
            SocketType::Geometry,
            TypeDescriptor::new("GeometrySet", RuntimeType::Geometry),
        );
        registry.register_socket_type(
            SocketType::Shader,
            TypeDescriptor::without_value_semantics("Shader", RuntimeType::Geometry),
        );
        for from in BaseType::iter() {
            for to in BaseType::iter() {
                if from != to && ImplicitConversion::supports(from, to) {
                    registry.register_conversion(from, to, Arc::new(ImplicitConversion::new(from, to)));
                }
            }
        }
        registry
    }

    pub fn register_socket_type(&mut self, socket_type: SocketType, descriptor: TypeDescriptor) {
        match ResolvedType::from_descriptor(&descriptor) {
            Some(resolved) => {
                self.resolved.insert(socket_type.clone(), resolved);
            }
            None => {
                self.resolved.remove(&socket_type);
            }
        }
        self.descriptors.insert(socket_type, descriptor);
    }

    pub fn register_conversion(&mut self, from: BaseType, to: BaseType, function: Arc<dyn MultiFunction>) {
        debug_assert_eq!(function.signature().inputs, vec![from]);
        debug_assert_eq!(function.signature().outputs, vec![to]);
        self.conversions.insert((from, to), function);
    }

    pub fn descriptor(&self, socket_type: &SocketType) -> Option<&TypeDescriptor> {
        self.descriptors.get(socket_type)
    }

    /// Returns `None` for unregistered types and for types lacking value semantics.
    /// Sockets of such types are left out of the produced graph.
    pub fn resolve(&self, socket_type: &SocketType) -> Option<ResolvedType> {
        self.resolved.get(socket_type).cloned()
    }

    /// Type of the sequence a multi-input socket aggregates into.
    pub fn list_type(&self, element: &ResolvedType) -> ResolvedType {
        let runtime_type = RuntimeType::List(Box::new(element.runtime_type().clone()));
        ResolvedType::standard(format!("List<{}>", element.name()), runtime_type)
    }

    pub fn is_convertible(&self, from: BaseType, to: BaseType) -> bool {
        self.conversions.contains_key(&(from, to))
    }

    pub fn conversion(&self, from: BaseType, to: BaseType) -> Option<&Arc<dyn MultiFunction>> {
        self.conversions.get(&(from, to))
    }

    /// Converts a concrete value eagerly, used for socket default values.
    pub fn convert_value(&self, value: &Value, to: BaseType) -> Option<Value> {
        let from = value.base_type();
        if from == to {
            return Some(value.clone());
        }
        let function = self.conversion(from, to)?;
        let mut outputs = vec![Vec::with_capacity(1)];
        function.call(1, &[std::slice::from_ref(value)], &mut outputs);
        outputs.pop().and_then(|mut values| values.pop())
    }
}
