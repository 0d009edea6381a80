//! The resolved, reusable form of one data-access method.

use crate::traits::DataSourceFactory;
use quarry_core::{
    build_runtime_context, build_type_context, resolve_cache_descriptor, resolve_db_descriptor,
    CacheDescriptor, DbDescriptor, MethodMetadata, ParameterAliasTable, QuarryResult,
    ResolutionError, RuntimeContext, SqlType, TypeContext, TypeMetadata, Value, ValueType,
};
use tracing::{debug, trace, warn};

/// One data-access method after metadata resolution.
///
/// All fields are fixed by [`Operator::new`]; afterwards the operator is
/// read-only and can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct Operator {
    name: String,
    sql_type: SqlType,
    aliases: ParameterAliasTable,
    parameter_types: Vec<ValueType>,
    db: DbDescriptor,
    cache: CacheDescriptor,
}

impl Operator {
    /// Resolve `method`, declared on a type carrying `type_meta`.
    ///
    /// Fails with a configuration error when the method's cache-key
    /// designation is invalid; such an operator is never created.
    pub fn new(type_meta: &TypeMetadata, method: &MethodMetadata) -> QuarryResult<Self> {
        let aliases = ParameterAliasTable::from_parameters(&method.parameters);
        for (position, alias) in aliases.shadowing_aliases() {
            warn!(
                operation = %method.name,
                position,
                alias,
                "Parameter alias shadows a positional name; the later binding wins"
            );
        }

        let db = resolve_db_descriptor(type_meta);
        let cache = resolve_cache_descriptor(type_meta, method, &aliases)?;

        debug!(
            operation = %method.name,
            sql_type = ?method.sql_type,
            data_source = db.data_source_name(),
            table = db.table(),
            use_cache = cache.use_cache(),
            "Operator resolved"
        );

        Ok(Self {
            name: method.name.clone(),
            sql_type: method.sql_type,
            parameter_types: method
                .parameters
                .iter()
                .map(|p| p.value_type.clone())
                .collect(),
            aliases,
            db,
            cache,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn aliases(&self) -> &ParameterAliasTable {
        &self.aliases
    }

    pub fn db_descriptor(&self) -> &DbDescriptor {
        &self.db
    }

    pub fn cache_descriptor(&self) -> &CacheDescriptor {
        &self.cache
    }

    pub fn uses_cache(&self) -> bool {
        self.cache.use_cache()
    }

    // ========================================================================
    // CONTEXTS
    // ========================================================================

    /// Type context from the declared parameter types.
    pub fn type_context(&self) -> TypeContext {
        self.build_type_context(&self.parameter_types)
    }

    /// Type context from explicit argument types.
    pub fn build_type_context(&self, argument_types: &[ValueType]) -> TypeContext {
        build_type_context(argument_types, &self.db, &self.aliases)
    }

    /// Value context for one invocation.
    pub fn build_runtime_context(&self, argument_values: Vec<Value>) -> RuntimeContext {
        build_runtime_context(argument_values, &self.db, &self.aliases)
    }

    // ========================================================================
    // CACHE KEYS
    // ========================================================================

    /// The value the cache key is derived from: the key-source argument,
    /// followed along its property path.
    pub fn cache_key_object<'a>(&self, context: &'a RuntimeContext) -> QuarryResult<&'a Value> {
        let source = self
            .cache
            .key_source()
            .ok_or_else(|| ResolutionError::CacheDisabled {
                operation: self.name.clone(),
            })?;
        Ok(context.property_value(&source.parameter_name, &source.property_path)?)
    }

    /// Prefix the string form of `key_obj`.
    pub fn cache_key(&self, key_obj: &Value) -> String {
        self.cache.key_for(key_obj)
    }

    /// Cache key for a call that reads a single entry.
    pub fn single_key(&self, context: &RuntimeContext) -> QuarryResult<String> {
        let key = self.cache_key(self.cache_key_object(context)?);
        trace!(operation = %self.name, key = %key, "Derived cache key");
        Ok(key)
    }

    /// Cache keys for a batch call: one per element when the key object is a
    /// list, otherwise a single key.
    pub fn multiple_keys(&self, context: &RuntimeContext) -> QuarryResult<Vec<String>> {
        let keys = match self.cache_key_object(context)? {
            Value::List(items) => items.iter().map(|item| self.cache_key(item)).collect(),
            other => vec![self.cache_key(other)],
        };
        trace!(operation = %self.name, count = keys.len(), "Derived cache keys");
        Ok(keys)
    }

    // ========================================================================
    // DATA SOURCE
    // ========================================================================

    /// Ask `factory` for the data source this operation runs against.
    pub fn data_source<F: DataSourceFactory>(&self, factory: &F) -> QuarryResult<F::DataSource> {
        Ok(factory.get_data_source(self.db.data_source_name(), self.sql_type)?)
    }
}
