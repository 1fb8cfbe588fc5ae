use crate::field::{Field, ValueOrField};
use crate::types::BaseType;
use crate::value::Value;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<BaseType>,
    pub outputs: Vec<BaseType>,
}

/// A pure element-wise function over base-type values.
///
/// `call` evaluates `size` elements at once: every input slice holds `size` values
/// and the function pushes `size` values into every output vector.
pub trait MultiFunction: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn signature(&self) -> &Signature;
    fn call(&self, size: usize, inputs: &[&[Value]], outputs: &mut [Vec<Value>]);
}

type ElementFn = dyn Fn(&[Value]) -> Vec<Value> + Send + Sync;

/// Multi-function built from a closure that maps one element's inputs to its outputs.
pub struct CustomMultiFunction {
    name: String,
    signature: Signature,
    element_fn: Arc<ElementFn>,
}

impl CustomMultiFunction {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<BaseType>,
        outputs: Vec<BaseType>,
        element_fn: impl Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            signature: Signature { inputs, outputs },
            element_fn: Arc::new(element_fn),
        }
    }
}

impl std::fmt::Debug for CustomMultiFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomMultiFunction")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

impl MultiFunction for CustomMultiFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, size: usize, inputs: &[&[Value]], outputs: &mut [Vec<Value>]) {
        let mut element_inputs = Vec::with_capacity(inputs.len());
        for i in 0..size {
            element_inputs.clear();
            element_inputs.extend(inputs.iter().map(|values| values[i].clone()));
            let results = (self.element_fn)(&element_inputs);
            debug_assert_eq!(results.len(), outputs.len());
            for (output, (result, base_type)) in outputs
                .iter_mut()
                .zip(results.into_iter().zip(&self.signature.outputs))
            {
                debug_assert_eq!(result.base_type(), *base_type);
                output.push(result);
            }
        }
    }
}

/// Implicit conversion between two base types.
#[derive(Debug)]
pub struct ImplicitConversion {
    name: String,
    signature: Signature,
}

impl ImplicitConversion {
    pub fn new(from: BaseType, to: BaseType) -> Self {
        debug_assert!(Self::supports(from, to));
        Self {
            name: format!("{from} to {to}"),
            signature: Signature {
                inputs: vec![from],
                outputs: vec![to],
            },
        }
    }

    /// Numeric and vector-like types convert among each other, strings never do.
    pub fn supports(from: BaseType, to: BaseType) -> bool {
        from != BaseType::String && to != BaseType::String
    }

    pub fn convert(value: &Value, to: BaseType) -> Value {
        match (value, to) {
            (Value::Float(x), BaseType::Float) => Value::Float(*x),
            (Value::Float(x), BaseType::Int) => Value::Int(*x as i32),
            (Value::Float(x), BaseType::Bool) => Value::Bool(*x > 0.0),
            (Value::Float(x), BaseType::Vector) => Value::Vector([*x; 3]),
            (Value::Float(x), BaseType::Color) => Value::Color([*x, *x, *x, 1.0]),
            (Value::Int(x), BaseType::Float) => Value::Float(*x as f32),
            (Value::Int(x), BaseType::Int) => Value::Int(*x),
            (Value::Int(x), BaseType::Bool) => Value::Bool(*x > 0),
            (Value::Int(x), BaseType::Vector) => Value::Vector([*x as f32; 3]),
            (Value::Int(x), BaseType::Color) => {
                let x = *x as f32;
                Value::Color([x, x, x, 1.0])
            }
            (Value::Bool(x), _) => {
                let number = if *x { 1.0 } else { 0.0 };
                match to {
                    BaseType::Bool => Value::Bool(*x),
                    BaseType::Int => Value::Int(number as i32),
                    other => Self::convert(&Value::Float(number), other),
                }
            }
            (Value::Vector(v), BaseType::Float) => Value::Float((v[0] + v[1] + v[2]) / 3.0),
            (Value::Vector(v), BaseType::Int) => Value::Int(((v[0] + v[1] + v[2]) / 3.0) as i32),
            (Value::Vector(v), BaseType::Bool) => Value::Bool(v.iter().any(|x| *x != 0.0)),
            (Value::Vector(v), BaseType::Vector) => Value::Vector(*v),
            (Value::Vector(v), BaseType::Color) => Value::Color([v[0], v[1], v[2], 1.0]),
            (Value::Color(c), BaseType::Float) => Value::Float(luminance(c)),
            (Value::Color(c), BaseType::Int) => Value::Int(luminance(c) as i32),
            (Value::Color(c), BaseType::Bool) => Value::Bool(luminance(c) > 0.0),
            (Value::Color(c), BaseType::Vector) => Value::Vector([c[0], c[1], c[2]]),
            (Value::Color(c), BaseType::Color) => Value::Color(*c),
            (Value::String(s), BaseType::String) => Value::String(s.clone()),
            (_, to) => Value::default_for(to),
        }
    }
}

fn luminance(color: &[f32; 4]) -> f32 {
    0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2]
}

impl MultiFunction for ImplicitConversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, size: usize, inputs: &[&[Value]], outputs: &mut [Vec<Value>]) {
        let to = self.signature.outputs[0];
        outputs[0].extend(inputs[0][..size].iter().map(|value| Self::convert(value, to)));
    }
}

/// Applies `function` to value-or-field inputs.
///
/// When any input is a field, no computation happens: the result is one field per
/// output, all backed by a single operation over the inputs (values become
/// constant fields). Otherwise the function runs once over single-element inputs.
pub fn execute_on_value_or_field(
    function: &Arc<dyn MultiFunction>,
    inputs: &[&ValueOrField],
) -> Vec<ValueOrField> {
    let signature = function.signature();
    debug_assert_eq!(signature.inputs.len(), inputs.len());
    if inputs.iter().any(|input| input.is_field()) {
        let fields = inputs.iter().map(|input| input.as_field()).collect();
        return Field::operation(function.clone(), fields)
            .into_iter()
            .map(ValueOrField::Field)
            .collect();
    }
    let values: Vec<Value> = inputs
        .iter()
        .zip(&signature.inputs)
        .map(|(input, base_type)| match input.as_value() {
            Some(value) => value.clone(),
            None => Value::default_for(*base_type),
        })
        .collect();
    let slices: Vec<&[Value]> = values.iter().map(std::slice::from_ref).collect();
    let mut outputs: Vec<Vec<Value>> = signature.outputs.iter().map(|_| Vec::with_capacity(1)).collect();
    function.call(1, &slices, &mut outputs);
    outputs
        .into_iter()
        .zip(&signature.outputs)
        .map(|(mut values, base_type)| {
            ValueOrField::Value(values.pop().unwrap_or_else(|| Value::default_for(*base_type)))
        })
        .collect()
}
