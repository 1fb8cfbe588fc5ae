use crate::field::{Field, FieldInput, ValueOrField};
use crate::lazy_graph::functions::{AnyLazyFunction, FunctionInterface, FunctionOutput, LazyFunction, NodeStorage};
use crate::lazy_graph::params::{Context, Params};
use crate::types::ResolvedType;
use crate::value::SocketValue;

/// Provides the implicit field of an unlinked input, e.g. each point's position.
#[derive(Debug, Clone)]
pub struct ComplexInputFunction {
    interface: FunctionInterface,
    input: FieldInput,
}

impl ComplexInputFunction {
    pub fn new(ty: ResolvedType, input: FieldInput) -> Self {
        debug_assert_eq!(ty.base_type(), Some(input.base_type()));
        Self {
            interface: FunctionInterface {
                name: format!("Implicit {input:?}"),
                inputs: Vec::new(),
                outputs: vec![FunctionOutput::new("Output", ty)],
            },
            input,
        }
    }
}

impl LazyFunction for ComplexInputFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, _context: &Context, _storage: Option<&mut NodeStorage>) {
        let field = Field::input(self.input.clone());
        params.set_output(0, SocketValue::ValueOrField(ValueOrField::Field(field)));
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::ComplexInput(self)
    }
}
