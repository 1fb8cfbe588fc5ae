//! Function kinds a lazy graph node can run.
pub mod complex_input;
pub mod conversion;
pub mod geometry_node;
pub mod group;
pub mod multi_function_node;
pub mod multi_input;
pub mod muted;
pub mod reroute;

use crate::lazy_graph::executor::ExecutorStorage;
use crate::lazy_graph::params::{Context, Params};
use crate::lazy_graph::ValueUsage;
use crate::types::ResolvedType;
use complex_input::ComplexInputFunction;
use conversion::ConversionFunction;
use geometry_node::GeometryNodeFunction;
use group::GroupFunction;
use multi_function_node::MultiFunctionNodeFunction;
use multi_input::MultiInputFunction;
use muted::MutedFunction;
use reroute::RerouteFunction;

#[derive(Debug, Clone)]
pub struct FunctionInput {
    pub name: String,
    pub ty: ResolvedType,
    pub usage: ValueUsage,
}

impl FunctionInput {
    pub fn new(name: impl Into<String>, ty: ResolvedType, usage: ValueUsage) -> Self {
        Self {
            name: name.into(),
            ty,
            usage,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionOutput {
    pub name: String,
    pub ty: ResolvedType,
}

impl FunctionOutput {
    pub fn new(name: impl Into<String>, ty: ResolvedType) -> Self {
        Self { name: name.into(), ty }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionInterface {
    pub name: String,
    pub inputs: Vec<FunctionInput>,
    pub outputs: Vec<FunctionOutput>,
}

/// Per-node state a function keeps across (possibly suspended) executions.
#[derive(Debug)]
pub enum NodeStorage {
    Group(Box<ExecutorStorage>),
}

pub trait LazyFunction {
    fn interface(&self) -> &FunctionInterface;
    /// May be called several times per evaluation: whenever it returns with
    /// outputs missing and inputs requested, the executor loads those inputs and
    /// calls it again.
    fn execute(&self, params: &mut dyn Params, context: &Context, storage: Option<&mut NodeStorage>);
    fn init_storage(&self) -> Option<NodeStorage> {
        None
    }
    fn destruct_storage(&self, _storage: NodeStorage) {}
    fn to_any(self) -> AnyLazyFunction;
}

impl<T: LazyFunction> From<T> for AnyLazyFunction {
    fn from(value: T) -> Self {
        value.to_any()
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub enum AnyLazyFunction {
    Reroute(RerouteFunction),
    MultiInput(MultiInputFunction),
    Muted(MutedFunction),
    Conversion(ConversionFunction),
    MultiFunctionNode(MultiFunctionNodeFunction),
    GeometryNode(GeometryNodeFunction),
    ComplexInput(ComplexInputFunction),
    Group(GroupFunction),
}

impl AnyLazyFunction {
    pub fn interface(&self) -> &FunctionInterface {
        match self {
            AnyLazyFunction::Reroute(x) => x.interface(),
            AnyLazyFunction::MultiInput(x) => x.interface(),
            AnyLazyFunction::Muted(x) => x.interface(),
            AnyLazyFunction::Conversion(x) => x.interface(),
            AnyLazyFunction::MultiFunctionNode(x) => x.interface(),
            AnyLazyFunction::GeometryNode(x) => x.interface(),
            AnyLazyFunction::ComplexInput(x) => x.interface(),
            AnyLazyFunction::Group(x) => x.interface(),
        }
    }

    pub fn name(&self) -> &str {
        &self.interface().name
    }

    pub fn execute(&self, params: &mut dyn Params, context: &Context, storage: Option<&mut NodeStorage>) {
        match self {
            AnyLazyFunction::Reroute(x) => x.execute(params, context, storage),
            AnyLazyFunction::MultiInput(x) => x.execute(params, context, storage),
            AnyLazyFunction::Muted(x) => x.execute(params, context, storage),
            AnyLazyFunction::Conversion(x) => x.execute(params, context, storage),
            AnyLazyFunction::MultiFunctionNode(x) => x.execute(params, context, storage),
            AnyLazyFunction::GeometryNode(x) => x.execute(params, context, storage),
            AnyLazyFunction::ComplexInput(x) => x.execute(params, context, storage),
            AnyLazyFunction::Group(x) => x.execute(params, context, storage),
        }
    }

    pub fn init_storage(&self) -> Option<NodeStorage> {
        match self {
            AnyLazyFunction::Group(x) => x.init_storage(),
            _ => None,
        }
    }

    pub fn destruct_storage(&self, storage: NodeStorage) {
        match self {
            AnyLazyFunction::Group(x) => x.destruct_storage(storage),
            _ => log::warn!("{} was handed storage it never created", self.name()),
        }
    }
}
