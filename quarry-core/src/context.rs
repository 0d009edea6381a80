//! Binding contexts: symbolic name to static type, and symbolic name to
//! runtime value.
//!
//! Both are built by the same routine. The global table (when configured) is
//! bound first under [`TABLE_KEY`], then each argument under its alias or its
//! 1-based position. A later binding for the same name replaces an earlier
//! one.

use crate::{DbDescriptor, ParameterAliasTable, PathError, ResolutionError, Value, ValueType};
use std::collections::HashMap;

/// Reserved name the global table is bound under.
pub const TABLE_KEY: &str = "table";

fn bind_arguments<T>(
    arguments: impl IntoIterator<Item = T>,
    db: &DbDescriptor,
    aliases: &ParameterAliasTable,
    table_binding: impl FnOnce(&str) -> T,
) -> HashMap<String, T> {
    let mut bindings = HashMap::with_capacity(aliases.len() + 1);
    if let Some(table) = db.global_table() {
        bindings.insert(TABLE_KEY.to_string(), table_binding(table));
    }
    for (index, argument) in arguments.into_iter().enumerate() {
        bindings.insert(aliases.name_at(index).into_owned(), argument);
    }
    bindings
}

fn path_failure(parameter: &str, path: &str, err: PathError) -> ResolutionError {
    ResolutionError::PropertyResolution {
        parameter: parameter.to_string(),
        path: path.to_string(),
        segment: err.segment,
        reason: err.reason,
    }
}

// ============================================================================
// TYPE CONTEXT
// ============================================================================

/// Symbolic name → static type, consumed by the query-template compiler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeContext {
    types: HashMap<String, ValueType>,
}

impl TypeContext {
    pub fn new(types: HashMap<String, ValueType>) -> Self {
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&ValueType> {
        self.types.get(name)
    }

    /// Static type reached by following `path` from the parameter `name`.
    pub fn property_type(&self, name: &str, path: &str) -> Result<&ValueType, ResolutionError> {
        let root = self
            .types
            .get(name)
            .ok_or_else(|| ResolutionError::UnknownParameter {
                name: name.to_string(),
            })?;
        root.resolve_path(path)
            .map_err(|err| path_failure(name, path, err))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, ValueType> {
        self.types
    }
}

/// Bind the static argument types of an operation.
pub fn build_type_context(
    argument_types: &[ValueType],
    db: &DbDescriptor,
    aliases: &ParameterAliasTable,
) -> TypeContext {
    TypeContext::new(bind_arguments(
        argument_types.iter().cloned(),
        db,
        aliases,
        |_| ValueType::Text,
    ))
}

// ============================================================================
// RUNTIME CONTEXT
// ============================================================================

/// Symbolic name → value for one invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuntimeContext {
    values: HashMap<String, Value>,
}

impl RuntimeContext {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Value reached by following `path` from the parameter `name`.
    ///
    /// Fails when `name` is unbound or any segment of `path` does not match
    /// the shape of the actual value.
    pub fn property_value(&self, name: &str, path: &str) -> Result<&Value, ResolutionError> {
        let root = self
            .values
            .get(name)
            .ok_or_else(|| ResolutionError::UnknownParameter {
                name: name.to_string(),
            })?;
        root.resolve_path(path)
            .map_err(|err| path_failure(name, path, err))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, Value> {
        self.values
    }
}

/// Bind the argument values of one invocation.
pub fn build_runtime_context(
    argument_values: Vec<Value>,
    db: &DbDescriptor,
    aliases: &ParameterAliasTable,
) -> RuntimeContext {
    RuntimeContext::new(bind_arguments(argument_values, db, aliases, |table| {
        Value::Text(table.to_string())
    }))
}
