//! QUARRY Test Utilities
//!
//! Centralized test infrastructure for the QUARRY workspace:
//! - Proptest generators for values, types and parameter metadata
//! - Mock collaborators (cache handler, data source factory)
//! - Test fixtures for a typical cached repository
//! - Custom assertions for QUARRY-specific errors

// Re-export core types for convenience
pub use quarry_core::{
    CacheDescriptor, CacheKeySource, CacheMetadata, ConfigError, DaoDefinition, DbDescriptor,
    DbMetadata, ExpirePolicy, MethodMetadata, ParameterAliasTable, ParameterMetadata,
    QuarryError, QuarryResult, ResolutionError, RuntimeContext, SqlType, TypeContext,
    TypeMetadata, Value, ValueType,
};
pub use quarry_operator::{CacheHandler, DataSourceFactory, Operator, OperatorRegistry};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Install a tracing subscriber for tests, honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// MOCK COLLABORATORS
// ============================================================================

pub mod mocks {
    //! In-memory stand-ins for the collaborators an operator talks to.

    use super::*;
    use quarry_core::{CacheError, DataSourceError};

    /// In-memory cache handler.
    #[derive(Debug, Default)]
    pub struct MockCacheHandler {
        entries: RwLock<HashMap<String, (Value, ExpirePolicy)>>,
        fail_on: RwLock<Option<String>>,
    }

    impl MockCacheHandler {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every operation on `key` fail with a backend error.
        pub fn fail_on(&self, key: impl Into<String>) {
            *self.fail_on.write().unwrap() = Some(key.into());
        }

        pub fn len(&self) -> usize {
            self.entries.read().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Expiration a key was stored with.
        pub fn expire_of(&self, key: &str) -> Option<ExpirePolicy> {
            self.entries.read().unwrap().get(key).map(|(_, e)| *e)
        }

        fn check(&self, key: &str) -> QuarryResult<()> {
            match self.fail_on.read().unwrap().as_deref() {
                Some(failing) if failing == key => Err(CacheError::Backend {
                    key: key.to_string(),
                    reason: "injected failure".to_string(),
                }
                .into()),
                _ => Ok(()),
            }
        }
    }

    impl CacheHandler for MockCacheHandler {
        fn get(&self, key: &str) -> QuarryResult<Option<Value>> {
            self.check(key)?;
            Ok(self.entries.read().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        fn set(&self, key: &str, value: Value, expire: ExpirePolicy) -> QuarryResult<()> {
            self.check(key)?;
            self.entries
                .write()
                .unwrap()
                .insert(key.to_string(), (value, expire));
            Ok(())
        }

        fn delete(&self, key: &str) -> QuarryResult<()> {
            self.check(key)?;
            self.entries.write().unwrap().remove(key);
            Ok(())
        }
    }

    /// Handle returned by [`MockDataSourceFactory`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MockDataSource {
        pub name: String,
        pub sql_type: SqlType,
    }

    /// Data source factory that records every lookup.
    ///
    /// Names listed as known resolve; an empty name resolves to `"default"`.
    #[derive(Debug, Default)]
    pub struct MockDataSourceFactory {
        known: Vec<String>,
        requests: RwLock<Vec<(String, SqlType)>>,
    }

    impl MockDataSourceFactory {
        pub fn new<I, S>(known: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                known: known.into_iter().map(Into::into).collect(),
                requests: RwLock::new(Vec::new()),
            }
        }

        /// Every `(name, sql_type)` asked for, in order.
        pub fn requests(&self) -> Vec<(String, SqlType)> {
            self.requests.read().unwrap().clone()
        }
    }

    impl DataSourceFactory for MockDataSourceFactory {
        type DataSource = MockDataSource;

        fn get_data_source(
            &self,
            name: &str,
            sql_type: SqlType,
        ) -> Result<MockDataSource, DataSourceError> {
            self.requests
                .write()
                .unwrap()
                .push((name.to_string(), sql_type));
            let resolved = if name.is_empty() { "default" } else { name };
            if resolved == "default" || self.known.iter().any(|k| k == resolved) {
                Ok(MockDataSource {
                    name: resolved.to_string(),
                    sql_type,
                })
            } else {
                Err(DataSourceError::NotFound {
                    name: resolved.to_string(),
                    sql_type,
                })
            }
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating QUARRY values and metadata.

    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1577836800i64..1893456000i64)
            .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    /// Generate an alias: a lowercase identifier that is never a digit
    /// string and never the reserved `table` name.
    pub fn arb_alias() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}".prop_filter("reserved name", |s| s != "table")
    }

    /// Generate a field name for records.
    pub fn arb_field_name() -> impl Strategy<Value = String> {
        "[a-z][a-z_]{0,6}"
    }

    /// Generate a scalar value.
    pub fn arb_scalar_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            (-1.0e6f64..1.0e6).prop_map(Value::Float),
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::Text),
            arb_uuid().prop_map(Value::Uuid),
            arb_timestamp().prop_map(Value::Timestamp),
        ]
    }

    /// Generate a value, possibly nested lists and records.
    pub fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar_value().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map(arb_field_name(), inner, 0..4).prop_map(Value::Record),
            ]
        })
    }

    /// Generate a static type, possibly nested.
    pub fn arb_value_type() -> impl Strategy<Value = ValueType> {
        let leaf = prop_oneof![
            Just(ValueType::Any),
            Just(ValueType::Bool),
            Just(ValueType::Int),
            Just(ValueType::Float),
            Just(ValueType::Text),
            Just(ValueType::Uuid),
            Just(ValueType::Timestamp),
        ];
        leaf.prop_recursive(2, 12, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(|t| ValueType::List(Box::new(t))),
                prop::collection::btree_map(arb_field_name(), inner, 0..3)
                    .prop_map(ValueType::Record),
            ]
        })
    }

    /// Generate an ExpirePolicy.
    pub fn arb_expire_policy() -> impl Strategy<Value = ExpirePolicy> {
        prop_oneof![
            (1u32..3600).prop_map(ExpirePolicy::Second),
            (1u32..1440).prop_map(ExpirePolicy::Minute),
            (1u32..48).prop_map(ExpirePolicy::Hour),
            (1u32..30).prop_map(ExpirePolicy::Day),
        ]
    }

    /// Generate a SqlType.
    pub fn arb_sql_type() -> impl Strategy<Value = SqlType> {
        prop_oneof![Just(SqlType::Read), Just(SqlType::Write)]
    }

    /// Generate an alias column of `0..max_len` positions; aliases are
    /// unique, about half the positions are unaliased.
    pub fn arb_aliases(max_len: usize) -> impl Strategy<Value = Vec<Option<String>>> {
        prop::collection::vec(prop::option::of(arb_alias()), 0..max_len).prop_filter(
            "aliases must be unique",
            |aliases| {
                let mut seen = HashSet::new();
                aliases.iter().flatten().all(|a| seen.insert(a.clone()))
            },
        )
    }

    /// Generate parameter metadata without cache designations.
    pub fn arb_parameters(max_len: usize) -> impl Strategy<Value = Vec<ParameterMetadata>> {
        arb_aliases(max_len).prop_flat_map(|aliases| {
            let len = aliases.len();
            prop::collection::vec(arb_value_type(), len).prop_map(move |types| {
                aliases
                    .iter()
                    .zip(types)
                    .map(|(alias, ty)| ParameterMetadata {
                        rename: alias.clone(),
                        cache_by: None,
                        value_type: ty,
                    })
                    .collect()
            })
        })
    }

    /// Generate an optional global table name (empty means none).
    pub fn arb_table() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[a-z]{1,10}"]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for a cached `UserDao` repository.

    use super::*;

    /// TOML declaration of the `UserDao` fixture.
    pub const USER_DAO_TOML: &str = r#"
name = "UserDao"

[db]
data_source = "users_db"
table = "users"

[cache]
prefix = "user:"
expire = { unit = "minute", amount = 15 }
num = 4

[[methods]]
name = "get_user"
parameters = [{ rename = "uid", cache_by = "", type = "int" }]

[[methods]]
name = "get_by_profile"
parameters = [{ cache_by = "id", type = { record = { id = "int", name = "text" } } }]

[[methods]]
name = "get_users"
parameters = [{ rename = "uids", cache_by = "", type = { list = "int" } }]

[[methods]]
name = "rename_user"
sql_type = "write"
cache_ignored = true
parameters = [{ rename = "uid", type = "int" }, { type = "text" }]
"#;

    /// Type metadata of the `UserDao` fixture.
    pub fn user_type_metadata() -> TypeMetadata {
        TypeMetadata {
            db: Some(DbMetadata {
                data_source: "users_db".to_string(),
                table: "users".to_string(),
            }),
            cache: Some(CacheMetadata::new("user:", ExpirePolicy::Minute(15)).with_num(4)),
        }
    }

    /// Type metadata with no db or cache declarations.
    pub fn bare_type_metadata() -> TypeMetadata {
        TypeMetadata::default()
    }

    /// `get_user(uid)` keyed by the whole argument.
    pub fn get_user_method() -> MethodMetadata {
        MethodMetadata::new("get_user", SqlType::Read).with_parameter(
            ParameterMetadata::new(ValueType::Int)
                .renamed("uid")
                .cache_by(""),
        )
    }

    /// A user record `{id, name}`.
    pub fn user_record(id: i64, name: &str) -> Value {
        Value::record([("id", Value::Int(id)), ("name", Value::from(name))])
    }

    /// Parsed `UserDao` definition.
    pub fn user_dao_definition() -> DaoDefinition {
        DaoDefinition::from_toml_str(USER_DAO_TOML)
            .unwrap_or_else(|e| panic!("UserDao fixture must parse: {e}"))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for QUARRY-specific validation.

    use super::*;

    /// Assert that a QuarryResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &QuarryResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a result is a cache-key arity error with `count` matches.
    #[track_caller]
    pub fn assert_cache_key_arity<T: std::fmt::Debug>(result: &QuarryResult<T>, count: usize) {
        match result {
            Err(QuarryError::Config(ConfigError::CacheKeyArity { count: c, .. })) => {
                assert_eq!(*c, count, "Wrong count in CacheKeyArity error");
            }
            other => panic!("Expected CacheKeyArity({}) error, got: {:?}", count, other),
        }
    }

    /// Assert that a result is a property resolution error at `segment`.
    #[track_caller]
    pub fn assert_property_resolution<T: std::fmt::Debug>(
        result: &QuarryResult<T>,
        segment: &str,
    ) {
        match result {
            Err(QuarryError::Resolution(ResolutionError::PropertyResolution {
                segment: s, ..
            })) => {
                assert_eq!(s, segment, "Wrong segment in PropertyResolution error");
            }
            other => panic!(
                "Expected PropertyResolution error at {:?}, got: {:?}",
                segment, other
            ),
        }
    }

    /// Assert that every argument is bound under its alias or its 1-based
    /// position.
    #[track_caller]
    pub fn assert_symbolic_bindings(
        context: &RuntimeContext,
        aliases: &[Option<String>],
        arguments: &[Value],
    ) {
        for (i, (alias, argument)) in aliases.iter().zip(arguments).enumerate() {
            let name = alias.clone().unwrap_or_else(|| (i + 1).to_string());
            assert_eq!(
                context.get(&name),
                Some(argument),
                "Argument {} not bound under {:?}",
                i,
                name
            );
        }
    }
}
