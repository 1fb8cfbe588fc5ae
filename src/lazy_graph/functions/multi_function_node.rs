use crate::field::ValueOrField;
use crate::lazy_graph::functions::{AnyLazyFunction, FunctionInterface, LazyFunction, NodeStorage};
use crate::lazy_graph::params::{Context, Params};
use crate::multi_function::{MultiFunction, execute_on_value_or_field};
use crate::value::SocketValue;
use std::sync::Arc;

/// Runs a node that is fully described by a multi-function. Results are reported
/// to the execution logger under the node's output identifiers.
#[derive(Debug, Clone)]
pub struct MultiFunctionNodeFunction {
    interface: FunctionInterface,
    function: Arc<dyn MultiFunction>,
    output_identifiers: Vec<String>,
}

impl MultiFunctionNodeFunction {
    pub fn new(interface: FunctionInterface, function: Arc<dyn MultiFunction>, output_identifiers: Vec<String>) -> Self {
        debug_assert_eq!(
            interface
                .inputs
                .iter()
                .map(|input| input.ty.base_type())
                .collect::<Vec<_>>(),
            function.signature().inputs.iter().copied().map(Some).collect::<Vec<_>>(),
            "{} inputs do not match its multi-function",
            interface.name
        );
        debug_assert_eq!(interface.outputs.len(), function.signature().outputs.len());
        debug_assert_eq!(interface.outputs.len(), output_identifiers.len());
        Self {
            interface,
            function,
            output_identifiers,
        }
    }
}

impl LazyFunction for MultiFunctionNodeFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, context: &Context, _storage: Option<&mut NodeStorage>) {
        let inputs: Vec<ValueOrField> = self
            .function
            .signature()
            .inputs
            .iter()
            .enumerate()
            .map(|(i, base_type)| match params.try_get_input(i).and_then(|v| v.as_value_or_field()) {
                Some(value) => value.clone(),
                None => ValueOrField::default_for(*base_type),
            })
            .collect();
        let input_refs: Vec<&ValueOrField> = inputs.iter().collect();
        let outputs = execute_on_value_or_field(&self.function, &input_refs);
        for (i, output) in outputs.into_iter().enumerate() {
            let value = SocketValue::ValueOrField(output);
            context
                .logger()
                .on_value_logged(context.context_stack(), &self.interface.name, &self.output_identifiers[i], &value);
            params.set_output(i, value);
        }
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::MultiFunctionNode(self)
    }
}
