use crate::lazy_graph::ValueUsage;
use crate::lazy_graph::functions::{
    AnyLazyFunction, FunctionInput, FunctionInterface, FunctionOutput, LazyFunction, NodeStorage,
};
use crate::lazy_graph::params::{Context, Params};
use crate::multi_function::{MultiFunction, execute_on_value_or_field};
use crate::types::ResolvedType;
use crate::value::SocketValue;
use std::sync::Arc;

/// Applies an implicit conversion to a value-or-field.
#[derive(Debug, Clone)]
pub struct ConversionFunction {
    interface: FunctionInterface,
    function: Arc<dyn MultiFunction>,
}

impl ConversionFunction {
    pub fn new(function: Arc<dyn MultiFunction>, from: ResolvedType, to: ResolvedType) -> Self {
        debug_assert!(from.is_value_or_field() && to.is_value_or_field());
        Self {
            interface: FunctionInterface {
                name: format!("Convert {} to {}", from.name(), to.name()),
                inputs: vec![FunctionInput::new("From", from, ValueUsage::Used)],
                outputs: vec![FunctionOutput::new("To", to)],
            },
            function,
        }
    }
}

impl LazyFunction for ConversionFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, _context: &Context, _storage: Option<&mut NodeStorage>) {
        let output_type = &self.interface.outputs[0].ty;
        let value = match params.try_get_input(0).and_then(|value| value.as_value_or_field()) {
            Some(from) => execute_on_value_or_field(&self.function, &[from])
                .pop()
                .map(SocketValue::ValueOrField)
                .unwrap_or_else(|| output_type.value_initialize()),
            None => output_type.value_initialize(),
        };
        params.set_output(0, value);
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::Conversion(self)
    }
}
