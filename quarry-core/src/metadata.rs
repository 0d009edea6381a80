//! Declarative metadata for repository types and their methods.
//!
//! These structs are the resolved shape of whatever declares a data-access
//! operation: written in code, or loaded from a
//! [`DaoDefinition`](crate::DaoDefinition). Absent metadata is `None` or
//! `Default`, never an error.

use crate::ValueType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// OPERATION KIND
// ============================================================================

/// Kind of statement an operation issues. Datasource routing uses it to pick
/// a primary or replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    #[default]
    Read,
    Write,
}

// ============================================================================
// EXPIRATION POLICY
// ============================================================================

/// How long a cached result stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum ExpirePolicy {
    Second(u32),
    Minute(u32),
    Hour(u32),
    Day(u32),
}

impl ExpirePolicy {
    /// Expiration as a whole number of seconds.
    pub fn expire_seconds(&self) -> u64 {
        let (amount, unit) = match *self {
            ExpirePolicy::Second(n) => (n, 1),
            ExpirePolicy::Minute(n) => (n, 60),
            ExpirePolicy::Hour(n) => (n, 60 * 60),
            ExpirePolicy::Day(n) => (n, 24 * 60 * 60),
        };
        u64::from(amount) * unit
    }

    /// Expiration as a [`Duration`].
    pub fn expire_time(&self) -> Duration {
        Duration::from_secs(self.expire_seconds())
    }
}

impl Default for ExpirePolicy {
    fn default() -> Self {
        ExpirePolicy::Day(1)
    }
}

// ============================================================================
// TYPE-LEVEL METADATA
// ============================================================================

/// Datastore placement declared on a repository type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbMetadata {
    /// Named data source; empty means the default one
    pub data_source: String,
    /// Global table name exposed to templates as `table`; empty means none
    pub table: String,
}

/// Caching policy declared on a repository type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Prepended to every cache key of the type's operations
    pub prefix: String,
    #[serde(default)]
    pub expire: ExpirePolicy,
    /// Number of cache shards
    #[serde(default = "default_cache_num")]
    pub num: u32,
}

fn default_cache_num() -> u32 {
    1
}

impl CacheMetadata {
    pub fn new(prefix: impl Into<String>, expire: ExpirePolicy) -> Self {
        Self {
            prefix: prefix.into(),
            expire,
            num: default_cache_num(),
        }
    }

    pub fn with_num(mut self, num: u32) -> Self {
        self.num = num;
        self
    }
}

/// Everything declared on the repository type itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMetadata {
    pub db: Option<DbMetadata>,
    pub cache: Option<CacheMetadata>,
}

// ============================================================================
// METHOD-LEVEL METADATA
// ============================================================================

/// Metadata attached to one argument position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterMetadata {
    /// Alias the argument is bound under instead of its 1-based position
    pub rename: Option<String>,
    /// Marks this argument as the cache key source; the string is a property
    /// path into it, empty for the whole argument
    pub cache_by: Option<String>,
    /// Declared static type
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl ParameterMetadata {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Self::default()
        }
    }

    pub fn renamed(mut self, alias: impl Into<String>) -> Self {
        self.rename = Some(alias.into());
        self
    }

    pub fn cache_by(mut self, property_path: impl Into<String>) -> Self {
        self.cache_by = Some(property_path.into());
        self
    }
}

/// Metadata attached to one data-access method.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub name: String,
    #[serde(default)]
    pub sql_type: SqlType,
    /// Opts this method out of its type's caching policy
    #[serde(default)]
    pub cache_ignored: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterMetadata>,
}

impl MethodMetadata {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterMetadata) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn ignoring_cache(mut self) -> Self {
        self.cache_ignored = true;
        self
    }
}
