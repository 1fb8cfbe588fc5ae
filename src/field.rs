//! Deferred per-element expressions.
//!
//! A [`Field`] describes how to compute one value per element of a domain that is
//! only known once the field is evaluated. Fields form an immutable DAG: inputs
//! read from the evaluation context, constants, and operations that apply a
//! multi-function to other fields.

use crate::multi_function::MultiFunction;
use crate::types::BaseType;
use crate::value::{GeometrySet, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("Field input {0:?} is not available in this context")]
    MissingInput(FieldInput),
    #[error("Field input {0:?} produced {1} values, expected {2}")]
    WrongLength(FieldInput, usize, usize),
}

/// Per-element data supplied by the evaluation context.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldInput {
    Position,
    Normal,
    Index,
    Id,
    Attribute { name: String, base_type: BaseType },
}

impl FieldInput {
    pub fn base_type(&self) -> BaseType {
        match self {
            FieldInput::Position | FieldInput::Normal => BaseType::Vector,
            FieldInput::Index | FieldInput::Id => BaseType::Int,
            FieldInput::Attribute { base_type, .. } => *base_type,
        }
    }
}

#[derive(Debug)]
pub struct FieldOperation {
    function: Arc<dyn MultiFunction>,
    inputs: Vec<Field>,
}

impl FieldOperation {
    pub fn function(&self) -> &Arc<dyn MultiFunction> {
        &self.function
    }

    pub fn inputs(&self) -> &[Field] {
        &self.inputs
    }
}

#[derive(Debug)]
pub enum FieldSource {
    Input(FieldInput),
    Constant(Value),
    Operation(FieldOperation),
}

impl FieldSource {
    fn output_types(&self) -> Vec<BaseType> {
        match self {
            FieldSource::Input(input) => vec![input.base_type()],
            FieldSource::Constant(value) => vec![value.base_type()],
            FieldSource::Operation(operation) => operation.function.signature().outputs.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    source: Arc<FieldSource>,
    output_index: usize,
}

impl Field {
    pub fn input(input: FieldInput) -> Self {
        Self {
            source: Arc::new(FieldSource::Input(input)),
            output_index: 0,
        }
    }

    pub fn constant(value: Value) -> Self {
        Self {
            source: Arc::new(FieldSource::Constant(value)),
            output_index: 0,
        }
    }

    /// Builds one operation node shared by all returned fields, one per function output.
    pub fn operation(function: Arc<dyn MultiFunction>, inputs: Vec<Field>) -> Vec<Field> {
        debug_assert_eq!(function.signature().inputs.len(), inputs.len());
        let output_count = function.signature().outputs.len();
        let source = Arc::new(FieldSource::Operation(FieldOperation { function, inputs }));
        (0..output_count)
            .map(|output_index| Self {
                source: source.clone(),
                output_index,
            })
            .collect()
    }

    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    pub fn output_index(&self) -> usize {
        self.output_index
    }

    pub fn base_type(&self) -> BaseType {
        self.source.output_types()[self.output_index]
    }

    /// Whether any context input is reachable from this field.
    pub fn depends_on_input(&self) -> bool {
        match self.source.as_ref() {
            FieldSource::Input(_) => true,
            FieldSource::Constant(_) => false,
            FieldSource::Operation(op) => op.inputs.iter().any(|f| f.depends_on_input()),
        }
    }

    pub fn evaluate(&self, context: &dyn FieldContext, size: usize) -> Result<Vec<Value>, FieldError> {
        let mut cache = HashMap::new();
        let mut outputs = evaluate_source(&self.source, context, size, &mut cache)?;
        Ok(std::mem::take(&mut outputs[self.output_index]))
    }
}

type EvalCache = HashMap<*const FieldSource, Vec<Vec<Value>>>;

fn evaluate_source(
    source: &Arc<FieldSource>,
    context: &dyn FieldContext,
    size: usize,
    cache: &mut EvalCache,
) -> Result<Vec<Vec<Value>>, FieldError> {
    let key = Arc::as_ptr(source);
    if let Some(outputs) = cache.get(&key) {
        return Ok(outputs.clone());
    }
    let outputs = match source.as_ref() {
        FieldSource::Input(input) => {
            let values = context
                .input_values(input, size)
                .ok_or_else(|| FieldError::MissingInput(input.clone()))?;
            if values.len() != size {
                return Err(FieldError::WrongLength(input.clone(), values.len(), size));
            }
            vec![values]
        }
        FieldSource::Constant(value) => vec![vec![value.clone(); size]],
        FieldSource::Operation(operation) => {
            let mut input_values = Vec::with_capacity(operation.inputs.len());
            for input in &operation.inputs {
                let mut outputs = evaluate_source(&input.source, context, size, cache)?;
                input_values.push(std::mem::take(&mut outputs[input.output_index]));
            }
            let input_slices: Vec<&[Value]> = input_values.iter().map(|v| v.as_slice()).collect();
            let mut outputs: Vec<Vec<Value>> = operation
                .function
                .signature()
                .outputs
                .iter()
                .map(|_| Vec::with_capacity(size))
                .collect();
            operation.function.call(size, &input_slices, &mut outputs);
            outputs
        }
    };
    cache.insert(key, outputs.clone());
    Ok(outputs)
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source) && self.output_index == other.output_index
    }
}

/// Supplies the values of [`FieldInput`]s over a domain.
pub trait FieldContext {
    fn input_values(&self, input: &FieldInput, size: usize) -> Option<Vec<Value>>;
}

/// Context over a plain index range. Only index-like inputs are available.
pub struct IndexFieldContext;

impl FieldContext for IndexFieldContext {
    fn input_values(&self, input: &FieldInput, size: usize) -> Option<Vec<Value>> {
        match input {
            FieldInput::Index | FieldInput::Id => Some((0..size as i32).map(Value::Int).collect()),
            _ => None,
        }
    }
}

/// Context over the points of a geometry.
pub struct GeometryFieldContext<'a> {
    geometry: &'a GeometrySet,
}

impl<'a> GeometryFieldContext<'a> {
    pub fn new(geometry: &'a GeometrySet) -> Self {
        Self { geometry }
    }
}

impl FieldContext for GeometryFieldContext<'_> {
    fn input_values(&self, input: &FieldInput, size: usize) -> Option<Vec<Value>> {
        match input {
            FieldInput::Position => Some(
                self.geometry
                    .points()
                    .iter()
                    .take(size)
                    .map(|p| Value::Vector(*p))
                    .collect(),
            ),
            FieldInput::Normal => Some(vec![Value::Vector([0.0, 0.0, 1.0]); size]),
            FieldInput::Attribute { .. } => None,
            FieldInput::Index | FieldInput::Id => IndexFieldContext.input_values(input, size),
        }
    }
}

/// Either a single concrete value or a field, the two forms a data socket can carry.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueOrField {
    Value(Value),
    Field(Field),
}

impl ValueOrField {
    pub fn default_for(base_type: BaseType) -> Self {
        ValueOrField::Value(Value::default_for(base_type))
    }

    pub fn base_type(&self) -> BaseType {
        match self {
            ValueOrField::Value(value) => value.base_type(),
            ValueOrField::Field(field) => field.base_type(),
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, ValueOrField::Field(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ValueOrField::Value(value) => Some(value),
            ValueOrField::Field(_) => None,
        }
    }

    /// Values become constant fields.
    pub fn as_field(&self) -> Field {
        match self {
            ValueOrField::Value(value) => Field::constant(value.clone()),
            ValueOrField::Field(field) => field.clone(),
        }
    }

    /// Evaluates to one value per element regardless of the held form.
    pub fn evaluate(&self, context: &dyn FieldContext, size: usize) -> Result<Vec<Value>, FieldError> {
        match self {
            ValueOrField::Value(value) => Ok(vec![value.clone(); size]),
            ValueOrField::Field(field) => field.evaluate(context, size),
        }
    }
}

impl From<Value> for ValueOrField {
    fn from(value: Value) -> Self {
        ValueOrField::Value(value)
    }
}

impl From<Field> for ValueOrField {
    fn from(field: Field) -> Self {
        ValueOrField::Field(field)
    }
}
