use crate::lazy_graph::ValueUsage;
use crate::lazy_graph::functions::{
    AnyLazyFunction, FunctionInput, FunctionInterface, FunctionOutput, LazyFunction, NodeStorage,
};
use crate::lazy_graph::params::{Context, Params};
use crate::types::ResolvedType;

/// Forwards its only input unchanged.
#[derive(Debug, Clone)]
pub struct RerouteFunction {
    interface: FunctionInterface,
}

impl RerouteFunction {
    pub fn new(ty: ResolvedType) -> Self {
        Self {
            interface: FunctionInterface {
                name: "Reroute".to_string(),
                inputs: vec![FunctionInput::new("Input", ty.clone(), ValueUsage::Used)],
                outputs: vec![FunctionOutput::new("Output", ty)],
            },
        }
    }
}

impl LazyFunction for RerouteFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, _context: &Context, _storage: Option<&mut NodeStorage>) {
        let value = params.take_input(0);
        debug_assert!(value.is_some());
        let value = value.unwrap_or_else(|| self.interface.outputs[0].ty.value_initialize());
        params.set_output(0, value);
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::Reroute(self)
    }
}
