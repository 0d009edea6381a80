//! Build-then-publish assembly of every operator declared by one repository
//! type.

use crate::Operator;
use quarry_core::{ConfigError, DaoDefinition, QuarryError, QuarryResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// All operators of one repository type, keyed by method name.
///
/// Assembly resolves every method before anything is returned, so a
/// registry either holds every operator of its definition or does not exist.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    dao: String,
    operators: HashMap<String, Arc<Operator>>,
}

impl OperatorRegistry {
    /// Resolve every method of `definition`, failing on the first
    /// configuration error.
    pub fn assemble(definition: &DaoDefinition) -> QuarryResult<Self> {
        if let Err(e) = definition.validate() {
            error!(dao = %definition.name, error = %e, "Invalid DAO definition");
            return Err(e.into());
        }

        let mut operators = HashMap::with_capacity(definition.methods.len());
        for method in &definition.methods {
            let operator = Operator::new(&definition.metadata, method).map_err(|e| {
                error!(
                    dao = %definition.name,
                    operation = %method.name,
                    error = %e,
                    "Failed to assemble operator"
                );
                e
            })?;
            operators.insert(method.name.clone(), Arc::new(operator));
        }

        info!(
            dao = %definition.name,
            operators = operators.len(),
            "Operator registry assembled"
        );

        Ok(Self {
            dao: definition.name.clone(),
            operators,
        })
    }

    /// Parse a TOML definition and assemble it.
    pub fn from_toml_str(input: &str) -> QuarryResult<Self> {
        let definition = DaoDefinition::parse_toml_str(input).map_err(Self::parse_failure)?;
        Self::assemble(&definition)
    }

    /// Parse a JSON definition and assemble it.
    pub fn from_json_str(input: &str) -> QuarryResult<Self> {
        let definition = DaoDefinition::parse_json_str(input).map_err(Self::parse_failure)?;
        Self::assemble(&definition)
    }

    fn parse_failure(e: ConfigError) -> QuarryError {
        error!(error = %e, "Failed to parse DAO definition");
        e.into()
    }

    /// Name of the repository type this registry was assembled from.
    pub fn dao_name(&self) -> &str {
        &self.dao
    }

    pub fn get(&self, operation: &str) -> Option<Arc<Operator>> {
        self.operators.get(operation).cloned()
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
