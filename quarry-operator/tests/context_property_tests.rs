//! Property-Based Tests for Operator Contexts and Cache Keys
//!
//! **Property 1: Stable symbolic naming**
//!
//! For any parameter list and arguments, argument i SHALL be bound under its
//! alias when it has one and under its 1-based position otherwise, and the
//! global table SHALL be bound under `table` exactly when one is declared.
//!
//! **Property 2: Pure context construction**
//!
//! Building a context twice from the same inputs SHALL give equal contexts,
//! and the type and runtime contexts SHALL expose the same names.
//!
//! **Property 3: Digit aliases collide by binding order**
//!
//! When a digit alias spells the positional name of another unaliased
//! argument, the argument bound later SHALL own that name.
//!
//! **Property 4: Exactly one cache key source**
//!
//! On a cached type, any method whose number of cache-key designations is
//! not one SHALL fail to resolve, reporting the number found.

use proptest::prelude::*;
use quarry_operator::{
    MethodMetadata, Operator, ParameterMetadata, SqlType, TypeMetadata, Value, ValueType,
};
use quarry_test_utils::assertions::{assert_cache_key_arity, assert_symbolic_bindings};
use quarry_test_utils::generators::{
    arb_expire_policy, arb_parameters, arb_scalar_value, arb_sql_type, arb_table, arb_value,
};
use quarry_test_utils::mocks::MockDataSourceFactory;
use quarry_test_utils::{CacheMetadata, DbMetadata};
use std::collections::HashSet;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn uncached_type(table: &str) -> TypeMetadata {
    TypeMetadata {
        db: Some(DbMetadata {
            data_source: "main".to_string(),
            table: table.to_string(),
        }),
        cache: None,
    }
}

fn method_with(parameters: Vec<ParameterMetadata>) -> MethodMetadata {
    MethodMetadata {
        name: "find".to_string(),
        sql_type: SqlType::Read,
        cache_ignored: false,
        parameters,
    }
}

/// Parameters together with one argument value per parameter.
fn arb_call() -> impl Strategy<Value = (Vec<ParameterMetadata>, Vec<Value>)> {
    arb_parameters(6).prop_flat_map(|parameters| {
        let len = parameters.len();
        (Just(parameters), prop::collection::vec(arb_value(), len))
    })
}

/// Argument count, the position carrying a digit alias, and the position
/// whose 1-based name that alias spells.
fn arb_digit_alias_call() -> impl Strategy<Value = (usize, usize, usize)> {
    (2usize..7).prop_flat_map(|len| (Just(len), 0..len, 0..len))
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_arguments_bound_under_alias_or_position(
        (parameters, arguments) in arb_call(),
        table in arb_table(),
    ) {
        let aliases: Vec<Option<String>> =
            parameters.iter().map(|p| p.rename.clone()).collect();
        let op = Operator::new(&uncached_type(&table), &method_with(parameters)).unwrap();
        let ctx = op.build_runtime_context(arguments.clone());

        assert_symbolic_bindings(&ctx, &aliases, &arguments);

        if table.is_empty() {
            prop_assert_eq!(ctx.len(), arguments.len());
            prop_assert!(ctx.get("table").is_none());
        } else {
            prop_assert_eq!(ctx.len(), arguments.len() + 1);
            prop_assert_eq!(ctx.get("table"), Some(&Value::Text(table.clone())));
        }
    }

    #[test]
    fn prop_context_construction_is_pure(
        (parameters, arguments) in arb_call(),
        table in arb_table(),
    ) {
        let op = Operator::new(&uncached_type(&table), &method_with(parameters)).unwrap();

        let first = op.build_runtime_context(arguments.clone());
        let second = op.build_runtime_context(arguments);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(op.type_context(), op.type_context());
    }

    #[test]
    fn prop_type_and_runtime_contexts_share_names(
        (parameters, arguments) in arb_call(),
        table in arb_table(),
    ) {
        let op = Operator::new(&uncached_type(&table), &method_with(parameters)).unwrap();

        let runtime = op.build_runtime_context(arguments);
        let types = op.type_context();
        let runtime_names: HashSet<&str> = runtime.names().collect();
        let type_names: HashSet<&str> = types.names().collect();
        prop_assert_eq!(runtime_names, type_names);

        if !table.is_empty() {
            prop_assert_eq!(types.get("table"), Some(&ValueType::Text));
        }
    }

    #[test]
    fn prop_cache_key_arity_other_than_one_fails(
        designations in prop_oneof![Just(0usize), 2usize..5],
        extra in 0usize..3,
        expire in arb_expire_policy(),
    ) {
        let cached = TypeMetadata {
            db: None,
            cache: Some(CacheMetadata::new("k:", expire)),
        };
        let mut method = MethodMetadata::new("lookup", SqlType::Read);
        for _ in 0..designations {
            method = method.with_parameter(ParameterMetadata::new(ValueType::Int).cache_by(""));
        }
        for _ in 0..extra {
            method = method.with_parameter(ParameterMetadata::new(ValueType::Text));
        }

        assert_cache_key_arity(&Operator::new(&cached, &method), designations);
    }

    #[test]
    fn prop_cache_key_is_prefix_then_display(
        key in arb_scalar_value(),
        prefix in "[a-z]{0,6}:?",
        expire in arb_expire_policy(),
    ) {
        let cached = TypeMetadata {
            db: None,
            cache: Some(CacheMetadata::new(prefix.clone(), expire)),
        };
        let method = MethodMetadata::new("get", SqlType::Read)
            .with_parameter(ParameterMetadata::new(ValueType::Any).cache_by(""));
        let op = Operator::new(&cached, &method).unwrap();

        let ctx = op.build_runtime_context(vec![key.clone()]);
        prop_assert_eq!(op.single_key(&ctx).unwrap(), format!("{}{}", prefix, key));
        prop_assert_eq!(op.cache_descriptor().expire(), Some(expire));
    }

    #[test]
    fn prop_digit_alias_later_binding_wins(
        (len, aliased, target) in arb_digit_alias_call(),
    ) {
        let name = (target + 1).to_string();
        let mut method = MethodMetadata::new("find", SqlType::Read);
        for i in 0..len {
            let parameter = ParameterMetadata::new(ValueType::Int);
            method = method.with_parameter(if i == aliased {
                parameter.renamed(name.clone())
            } else {
                parameter
            });
        }
        let op = Operator::new(&uncached_type(""), &method).unwrap();
        let ctx = op.build_runtime_context((0..len as i64).map(Value::Int).collect());

        prop_assert_eq!(ctx.get(&name), Some(&Value::Int(aliased.max(target) as i64)));

        let shadowing = op.aliases().shadowing_aliases();
        if aliased == target {
            prop_assert!(shadowing.is_empty());
            prop_assert_eq!(ctx.len(), len);
        } else {
            prop_assert_eq!(shadowing, vec![(aliased, name.as_str())]);
            prop_assert_eq!(ctx.len(), len - 1);
        }
    }

    #[test]
    fn prop_data_source_request_carries_sql_type(
        sql_type in arb_sql_type(),
        data_source in prop_oneof![Just(String::new()), "[a-z]{1,8}"],
    ) {
        let type_meta = TypeMetadata {
            db: Some(DbMetadata {
                data_source: data_source.clone(),
                table: String::new(),
            }),
            cache: None,
        };
        let op = Operator::new(&type_meta, &MethodMetadata::new("run", sql_type)).unwrap();
        let factory = MockDataSourceFactory::new([data_source.clone()]);

        let handle = op.data_source(&factory).unwrap();
        prop_assert_eq!(handle.sql_type, sql_type);
        prop_assert_eq!(factory.requests(), vec![(data_source, sql_type)]);
    }
}
