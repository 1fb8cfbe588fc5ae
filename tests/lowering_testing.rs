use nodegraph_lazy::lazy_graph::functions::AnyLazyFunction;
use nodegraph_lazy::{GroupStrategy, LoweringOptions, NodeTypeRegistry, TypeRegistry, build_lazy_graph};
use paste::paste;
mod lowering_tests;
use lowering_tests::basic::*;
use lowering_tests::geometry::*;
use lowering_tests::groups::*;

fn run_opaque_test(test: impl FnOnce(&LoweringOptions)) {
    test(&LoweringOptions {
        group_strategy: GroupStrategy::Opaque,
    })
}

fn run_inline_test(test: impl FnOnce(&LoweringOptions)) {
    test(&LoweringOptions {
        group_strategy: GroupStrategy::Inline,
    })
}

macro_rules! do_test {
    ($runner_fn:expr, $runner_name:ident, $test_name:ident) => {
        paste! {
            #[allow(non_snake_case)]
            #[test]
            fn [<$runner_name _ $test_name>]() {
                $runner_fn($test_name);
            }
        }
    };
}

macro_rules! do_tests {
    ($runner_fn:expr, $runner_name:ident) => {
        do_test!($runner_fn, $runner_name, test_reroute_then_add);
        do_test!($runner_fn, $runner_name, test_reroute_chain_is_identity);
        do_test!($runner_fn, $runner_name, test_muted_node_converts_passed_value);
        do_test!($runner_fn, $runner_name, test_muted_node_without_internal_link_gives_default);
        do_test!($runner_fn, $runner_name, test_unconvertible_link_uses_type_default);
        do_test!($runner_fn, $runner_name, test_ineligible_sockets_are_skipped);
        do_test!($runner_fn, $runner_name, test_conversions_are_shared_per_target_type);
        do_test!($runner_fn, $runner_name, test_conversion_count_is_stable_across_builds);
        do_test!($runner_fn, $runner_name, test_unlinked_implicit_input_of_function_node_is_a_field);
        do_test!($runner_fn, $runner_name, test_input_count_mismatch);
        do_test!($runner_fn, $runner_name, test_unlinked_output_uses_interface_default);
        do_test!($runner_fn, $runner_name, test_join_keeps_link_order);
        do_test!($runner_fn, $runner_name, test_set_position_uses_implicit_position);
        do_test!($runner_fn, $runner_name, test_set_position_with_linked_constant);
        do_test!($runner_fn, $runner_name, test_switch_skips_unselected_branch);
        do_test!($runner_fn, $runner_name, test_muted_switch_passes_false_branch);
        do_test!($runner_fn, $runner_name, test_nested_groups);
        do_test!($runner_fn, $runner_name, test_group_of_groups);
        do_test!($runner_fn, $runner_name, test_group_passes_input_through);
        do_test!($runner_fn, $runner_name, test_group_without_output_node);
        do_test!($runner_fn, $runner_name, test_unused_group_output_is_not_computed);
        do_test!($runner_fn, $runner_name, test_conversion_shared_across_group_boundary);
    };
}

do_tests!(run_opaque_test, opaque);
do_tests!(run_inline_test, inline);
do_test!(run_opaque_test, opaque, test_opaque_group_contexts);
do_test!(run_inline_test, inline, test_inline_group_contexts);

#[test]
fn test_group_node_count_per_strategy() {
    let types = TypeRegistry::builtin();
    let node_types = NodeTypeRegistry::builtin();
    let mut builder = nodegraph_lazy::NodeTreeBuilder::new("Outer");
    let inner = std::sync::Arc::new(nodegraph_lazy::NodeTreeBuilder::new("Inner").build());
    builder.add_group_node("A", inner.clone());
    builder.add_group_node("B", inner);
    let tree = builder.build();

    let is_group = |function: &AnyLazyFunction| matches!(function, AnyLazyFunction::Group(_));
    let opaque = build_lazy_graph(&tree, &types, &node_types, &LoweringOptions::default()).unwrap();
    assert_eq!(opaque.count_functions(is_group), 2);
    let inline = build_lazy_graph(
        &tree,
        &types,
        &node_types,
        &LoweringOptions {
            group_strategy: GroupStrategy::Inline,
        },
    )
    .unwrap();
    assert_eq!(inline.count_functions(is_group), 0);
}
