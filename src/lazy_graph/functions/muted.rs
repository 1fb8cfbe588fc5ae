use crate::lazy_graph::ValueUsage;
use crate::lazy_graph::functions::{
    AnyLazyFunction, FunctionInput, FunctionInterface, FunctionOutput, LazyFunction, NodeStorage,
};
use crate::lazy_graph::params::{Context, Params};
use crate::multi_function::{MultiFunction, execute_on_value_or_field};
use crate::types::TypeRegistry;
use crate::value::SocketValue;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum BypassSource {
    /// No internal link targets the output. It gets its type's default.
    Unmapped,
    Forward { input: usize },
    Convert { input: usize, function: Arc<dyn MultiFunction> },
    /// Linked, but the input cannot become the output's type. The input is still
    /// loaded before the default is produced.
    Incompatible { input: usize },
}

/// Stands in for a muted node: outputs pass through the inputs its internal links
/// name, converted where the types differ.
#[derive(Debug, Clone)]
pub struct MutedFunction {
    interface: FunctionInterface,
    sources: Vec<BypassSource>,
}

impl MutedFunction {
    /// `internal_links` holds `(input, output)` pairs indexed into `inputs` and
    /// `outputs`. Inputs start out unused and only those some output passes
    /// through become lazily requested.
    pub fn new(
        name: impl Into<String>,
        mut inputs: Vec<FunctionInput>,
        outputs: Vec<FunctionOutput>,
        internal_links: &[(usize, usize)],
        types: &TypeRegistry,
    ) -> Self {
        for input in &mut inputs {
            input.usage = ValueUsage::Unused;
        }
        let mut sources = vec![BypassSource::Unmapped; outputs.len()];
        for &(input_index, output_index) in internal_links {
            let (Some(input), Some(output)) = (inputs.get_mut(input_index), outputs.get(output_index)) else {
                continue;
            };
            if !matches!(sources[output_index], BypassSource::Unmapped) {
                continue;
            }
            input.usage = ValueUsage::Maybe;
            sources[output_index] = if input.ty == output.ty {
                BypassSource::Forward { input: input_index }
            } else {
                let conversion = match (input.ty.base_type(), output.ty.base_type()) {
                    (Some(from), Some(to)) => types.conversion(from, to).cloned(),
                    _ => None,
                };
                match conversion {
                    Some(function) => BypassSource::Convert {
                        input: input_index,
                        function,
                    },
                    None => BypassSource::Incompatible { input: input_index },
                }
            };
        }
        Self {
            interface: FunctionInterface {
                name: name.into(),
                inputs,
                outputs,
            },
            sources,
        }
    }

    /// The input output `output` passes through, if any.
    pub fn bypass_input(&self, output: usize) -> Option<usize> {
        match &self.sources[output] {
            BypassSource::Unmapped => None,
            BypassSource::Forward { input }
            | BypassSource::Convert { input, .. }
            | BypassSource::Incompatible { input } => Some(*input),
        }
    }
}

impl LazyFunction for MutedFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, _context: &Context, _storage: Option<&mut NodeStorage>) {
        for (output_index, source) in self.sources.iter().enumerate() {
            if params.output_was_produced(output_index) {
                continue;
            }
            let output_type = &self.interface.outputs[output_index].ty;
            let value = match source {
                BypassSource::Unmapped => output_type.value_initialize(),
                BypassSource::Incompatible { input } => match params.try_get_input_or_request(*input) {
                    Some(_) => output_type.value_initialize(),
                    None => continue,
                },
                BypassSource::Forward { input } => match params.try_get_input_or_request(*input) {
                    Some(value) => output_type.copy(value),
                    None => continue,
                },
                BypassSource::Convert { input, function } => match params.try_get_input_or_request(*input) {
                    Some(SocketValue::ValueOrField(value)) => execute_on_value_or_field(function, &[value])
                        .pop()
                        .map(SocketValue::ValueOrField)
                        .unwrap_or_else(|| output_type.value_initialize()),
                    Some(_) => output_type.value_initialize(),
                    None => continue,
                },
            };
            params.set_output(output_index, value);
        }
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::Muted(self)
    }
}
