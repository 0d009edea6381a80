//! Configuration types
//!
//! A [`DaoDefinition`] declares one repository type and its methods in a
//! file instead of in code. It deserializes from JSON or TOML:
//!
//! ```toml
//! name = "UserDao"
//!
//! [db]
//! data_source = "users_db"
//! table = "users"
//!
//! [cache]
//! prefix = "user:"
//! expire = { unit = "hour", amount = 2 }
//! num = 4
//!
//! [[methods]]
//! name = "get_user"
//! sql_type = "read"
//! parameters = [{ rename = "uid", cache_by = "", type = "int" }]
//! ```

use crate::{ConfigError, MethodMetadata, TypeMetadata};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Names, aliases and path segments: letters, digits and underscores.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid identifier regex"));

/// Method names must not start with a digit.
static METHOD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid method name regex"));

/// Declaration of one repository type and all of its data-access methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoDefinition {
    pub name: String,
    #[serde(flatten)]
    pub metadata: TypeMetadata,
    #[serde(default)]
    pub methods: Vec<MethodMetadata>,
}

impl DaoDefinition {
    /// Parse and validate a JSON definition.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let definition = Self::parse_json_str(input)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Parse and validate a TOML definition.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let definition = Self::parse_toml_str(input)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Parse a JSON definition without validating it.
    pub fn parse_json_str(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Parse {
            format: "json".to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a TOML definition without validating it.
    pub fn parse_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse {
            format: "toml".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate the definition.
    ///
    /// Validates:
    /// - name is non-empty
    /// - method names are identifiers and unique
    /// - aliases and cache_by path segments are identifiers
    /// - cache shard count is at least 1
    ///
    /// Cache-key arity is not checked here; it is resolved per method when
    /// the operator is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "name".to_string(),
            });
        }

        if let Some(cache) = &self.metadata.cache {
            if cache.num == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "cache.num".to_string(),
                    value: cache.num.to_string(),
                    reason: "num must be at least 1".to_string(),
                });
            }
        }

        let mut seen = HashSet::with_capacity(self.methods.len());
        for method in &self.methods {
            if !METHOD_NAME.is_match(&method.name) {
                return Err(ConfigError::InvalidValue {
                    field: "methods.name".to_string(),
                    value: method.name.clone(),
                    reason: "method name must be an identifier".to_string(),
                });
            }
            if !seen.insert(method.name.as_str()) {
                return Err(ConfigError::DuplicateOperation {
                    operation: method.name.clone(),
                });
            }

            for (index, parameter) in method.parameters.iter().enumerate() {
                if let Some(alias) = &parameter.rename {
                    if !IDENTIFIER.is_match(alias) {
                        return Err(ConfigError::InvalidValue {
                            field: format!("{}.parameters[{}].rename", method.name, index),
                            value: alias.clone(),
                            reason: "alias must contain only letters, digits and '_'".to_string(),
                        });
                    }
                }
                if let Some(path) = &parameter.cache_by {
                    if !path.is_empty() && !path.split('.').all(|s| IDENTIFIER.is_match(s)) {
                        return Err(ConfigError::InvalidValue {
                            field: format!("{}.parameters[{}].cache_by", method.name, index),
                            value: path.clone(),
                            reason: "property path must be dot-separated identifiers".to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Look up a method declaration by name.
    pub fn method(&self, name: &str) -> Option<&MethodMetadata> {
        self.methods.iter().find(|m| m.name == name)
    }
}
