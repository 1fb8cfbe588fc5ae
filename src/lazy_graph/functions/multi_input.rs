use crate::lazy_graph::ValueUsage;
use crate::lazy_graph::functions::{
    AnyLazyFunction, FunctionInput, FunctionInterface, FunctionOutput, LazyFunction, NodeStorage,
};
use crate::lazy_graph::params::{Context, Params};
use crate::types::ResolvedType;
use crate::value::SocketValue;

/// Collects the values of all links into a multi-input socket into one list,
/// in link order. Field and value elements are kept as they arrive.
#[derive(Debug, Clone)]
pub struct MultiInputFunction {
    interface: FunctionInterface,
    element: ResolvedType,
}

impl MultiInputFunction {
    pub fn new(element: ResolvedType, list_type: ResolvedType, link_count: usize) -> Self {
        let inputs = (0..link_count)
            .map(|i| FunctionInput::new(format!("Link {i}"), element.clone(), ValueUsage::Used))
            .collect();
        Self {
            interface: FunctionInterface {
                name: "Multi Input".to_string(),
                inputs,
                outputs: vec![FunctionOutput::new("Values", list_type)],
            },
            element,
        }
    }
}

impl LazyFunction for MultiInputFunction {
    fn interface(&self) -> &FunctionInterface {
        &self.interface
    }

    fn execute(&self, params: &mut dyn Params, _context: &Context, _storage: Option<&mut NodeStorage>) {
        let items = (0..self.interface.inputs.len())
            .map(|i| params.take_input(i).unwrap_or_else(|| self.element.value_initialize()))
            .collect();
        params.set_output(
            0,
            SocketValue::List {
                element: self.element.runtime_type().clone(),
                items,
            },
        );
    }

    fn to_any(self) -> AnyLazyFunction {
        AnyLazyFunction::MultiInput(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldInput, ValueOrField};
    use crate::lazy_graph::functions::test_params::TestParams;
    use crate::lazy_graph::params::{ContextStack, UserData};
    use crate::types::{BaseType, TypeRegistry};
    use crate::value::Value;

    #[test]
    fn test_collects_in_link_order_and_keeps_fields() {
        let registry = TypeRegistry::builtin();
        let element = ResolvedType::value_or_field(BaseType::Int);
        let function = MultiInputFunction::new(element.clone(), registry.list_type(&element), 3);
        let field = Field::input(FieldInput::Index);
        let mut params = TestParams::new(
            vec![
                Some(SocketValue::from(5)),
                Some(SocketValue::from(ValueOrField::Field(field.clone()))),
                Some(SocketValue::from(7)),
            ],
            1,
        );
        let stack = ContextStack::root("test");
        let user_data = UserData::new(&(), &stack);
        function.execute(&mut params, &Context::new(&user_data), None);

        let output = params.outputs[0].take().unwrap();
        assert!(output.is_field());
        let items = output.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_value(), Some(&Value::Int(5)));
        assert_eq!(items[1], SocketValue::from(ValueOrField::Field(field)));
        assert_eq!(items[2].as_value(), Some(&Value::Int(7)));
    }
}
