use crate::field::ValueOrField;
use crate::lazy_graph::functions::{AnyLazyFunction, FunctionInterface, LazyFunction, NodeStorage};
use crate::lazy_graph::params::{Context, Params};
use crate::value::{GeometrySet, SocketValue};
use std::sync::Arc;
use std::time::Instant;

pub type GeometryExecFn = Arc<dyn Fn(&mut GeoNodeExecParams) + Send + Sync>;

/// Sockets addressed by identifier, as a node's execute callback sees them.
///
/// Identifiers of sockets that did not make it into the graph (unavailable or of
/// an ineligible type) read as missing and ignore writes.
pub struct GeoNodeExecParams<'p> {
    params: &'p mut dyn Params,
    context: &'p Context<'p>,
    node_name: &'p str,
    interface: &'p FunctionInterface,
    input_identifiers: &'p [String],
    output_identifiers: &'p [String],
}

impl<'p> GeoNodeExecParams<'p> {
    fn input_index(&self, identifier: &str) -> Option<usize> {
        self.input_identifiers.iter().position(|id| id == identifier)
    }

    fn output_index(&self, identifier: &str) -> Option<usize> {
        self.output_identifiers.iter().position(|id| id == identifier)
    }

    pub fn node_name(&self) -> &str {
        self.node_name
    }

    pub fn context(&self) -> &Context<'p> {
        self.context
    }

    pub fn get_input(&self, identifier: &str) -> Option<&SocketValue> {
        self.params.try_get_input(self.input_index(identifier)?)
    }

    pub fn get_value_or_field(&self, identifier: &str) -> Option<&ValueOrField> {
        self.get_input(identifier)?.as_value_or_field()
    }

    pub fn extract_input(&mut self, identifier: &str) -> Option<SocketValue> {
        let index = self.input_index(identifier)?;
        self.params.take_input(index)
    }

    pub fn extract_geometry(&mut self, identifier: &str) -> GeometrySet {
        self.extract_input(identifier)
            .and_then(|value| value.into_geometry())
            .unwrap_or_default()
    }

    /// Returns true when the input is not available yet. It has then been requested
    /// and the node should return; it runs again once the value is computed.
    pub fn lazy_require_input(&mut self, identifier: &str) -> bool {
        match self.input_index(identifier) {
            Some(index) => self.params.try_get_input_or_request(index).is_none(),
            None => false,
        }
    }

    pub fn set_output(&mut self, identifier: &str, value: impl Into<SocketValue>) {
        match self.output_index(identifier) {
            Some(index) => self.params.set_output(index, value.into()),
            None => log::debug!("{}: output {identifier} is not part of the graph", self.node_name),
        }
    }

    pub fn output_was_set(&self, identifier: &str) -> bool {
        self.output_index(identifier)
            .is_some_and(|index| self.params.output_was_produced(index))
    }

    pub fn set_default_remaining_outputs(&mut self) {
        for (index, output) in self.interface.outputs.iter().enumerate() {
            if !self.params.output_was_produced(index) {
                self.params.set_output(index, output.ty.value_initialize());
            }
        }
    }
}

/// Runs a node's execute callback and reports how long it took.
#[derive(Clone)]
pub struct GeometryNodeFunction {
    interface: FunctionInterface,
    input_identifiers: Vec<String>,
    output_identifiers: Vec<String>,
    execute: GeometryExecFn,
}

impl GeometryNodeFunction {
    pub fn new(
        interface: FunctionInterface,
        input_identifiers: Vec<String>,
        output_identifiers: Vec<String>,
        execute: GeometryExecFn,
    ) -> Self {
        debug_assert_eq!(interface.inputs.len(), input_identifiers.len());
        debug_assert_eq!(interface.outputs.len(), output_identifiers.len());
        Self {
            interface,
            input_identifiers,
            output_identifiers,
            execute,
        }
    }
}

impl std::fmt::Debug for GeometryNodeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryNodeFunction")
            .field("interface", &self.interface)
            .field("input_identifiers", &self.input_identifiers)
            .field("output_identifiers", &self.output_identifiers)
            .finish()
    }
}

impl LazyFunction for GeometryNodeFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, context: &Context, _storage: Option<&mut NodeStorage>) {
        let mut geo_params = GeoNodeExecParams {
            params,
            context,
            node_name: &self.interface.name,
            interface: &self.interface,
            input_identifiers: &self.input_identifiers,
            output_identifiers: &self.output_identifiers,
        };
        let start_instant = Instant::now();
        (self.execute)(&mut geo_params);
        let end_instant = Instant::now();
        context
            .logger()
            .on_node_executed(context.context_stack(), &self.interface.name, start_instant, end_instant);
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::GeometryNode(self)
    }
}
