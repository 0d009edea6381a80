//! Resolved datastore and caching descriptors.
//!
//! Both descriptors are computed once, when an operator is assembled, and are
//! read-only afterwards. Resolution is the only place a cache configuration
//! error can surface.

use crate::{ConfigError, ExpirePolicy, MethodMetadata, ParameterAliasTable, TypeMetadata};
use serde::{Deserialize, Serialize};

// ============================================================================
// DB DESCRIPTOR
// ============================================================================

/// Where an operation's statements run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DbDescriptor {
    data_source_name: String,
    table: String,
}

impl DbDescriptor {
    pub fn new(data_source_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            data_source_name: data_source_name.into(),
            table: table.into(),
        }
    }

    /// Named data source; empty selects the default.
    pub fn data_source_name(&self) -> &str {
        &self.data_source_name
    }

    /// Global table name; empty when none is configured.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The global table name, if one is configured.
    pub fn global_table(&self) -> Option<&str> {
        Some(self.table.as_str()).filter(|t| !t.is_empty())
    }
}

/// Read the datastore placement off the type metadata.
pub fn resolve_db_descriptor(type_meta: &TypeMetadata) -> DbDescriptor {
    match &type_meta.db {
        Some(db) => DbDescriptor::new(db.data_source.clone(), db.table.clone()),
        None => DbDescriptor::default(),
    }
}

// ============================================================================
// CACHE DESCRIPTOR
// ============================================================================

/// The argument (and path inside it) whose value keys the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeySource {
    /// Symbolic name of the argument in the runtime context
    pub parameter_name: String,
    /// Dotted path into the argument; empty for the whole argument
    pub property_path: String,
}

impl CacheKeySource {
    pub fn new(parameter_name: impl Into<String>, property_path: impl Into<String>) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            property_path: property_path.into(),
        }
    }
}

/// Caching policy of one operation.
///
/// When `use_cache` is set, `expire` and `key_source` are always present.
/// Deserialization enforces the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "CacheDescriptorFields")]
pub struct CacheDescriptor {
    use_cache: bool,
    prefix: String,
    expire: Option<ExpirePolicy>,
    num: u32,
    key_source: Option<CacheKeySource>,
}

/// Unchecked wire form of [`CacheDescriptor`].
#[derive(Deserialize)]
struct CacheDescriptorFields {
    use_cache: bool,
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    expire: Option<ExpirePolicy>,
    #[serde(default)]
    num: u32,
    #[serde(default)]
    key_source: Option<CacheKeySource>,
}

impl TryFrom<CacheDescriptorFields> for CacheDescriptor {
    type Error = ConfigError;

    fn try_from(fields: CacheDescriptorFields) -> Result<Self, Self::Error> {
        if fields.use_cache {
            if fields.expire.is_none() {
                return Err(ConfigError::MissingRequired {
                    field: "expire".to_string(),
                });
            }
            if fields.key_source.is_none() {
                return Err(ConfigError::MissingRequired {
                    field: "key_source".to_string(),
                });
            }
        }
        Ok(fields.into_unchecked())
    }
}

impl CacheDescriptorFields {
    fn into_unchecked(self) -> CacheDescriptor {
        CacheDescriptor {
            use_cache: self.use_cache,
            prefix: self.prefix,
            expire: self.expire,
            num: self.num,
            key_source: self.key_source,
        }
    }
}

impl CacheDescriptor {
    /// Descriptor for an operation that bypasses the cache.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Descriptor for a cached operation.
    pub fn enabled(
        prefix: impl Into<String>,
        expire: ExpirePolicy,
        num: u32,
        key_source: CacheKeySource,
    ) -> Self {
        Self {
            use_cache: true,
            prefix: prefix.into(),
            expire: Some(expire),
            num,
            key_source: Some(key_source),
        }
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn expire(&self) -> Option<ExpirePolicy> {
        self.expire
    }

    /// Shard count.
    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn key_source(&self) -> Option<&CacheKeySource> {
        self.key_source.as_ref()
    }

    /// Prefix the string form of a key object.
    pub fn key_for(&self, key_obj: &impl std::fmt::Display) -> String {
        format!("{}{}", self.prefix, key_obj)
    }
}

/// Resolve the caching policy of `method` declared on a type with
/// `type_meta`.
///
/// Caching applies only when the type declares a cache policy and the method
/// does not opt out. In that case exactly one parameter must carry a
/// `cache_by` designation.
pub fn resolve_cache_descriptor(
    type_meta: &TypeMetadata,
    method: &MethodMetadata,
    aliases: &ParameterAliasTable,
) -> Result<CacheDescriptor, ConfigError> {
    let cache = match &type_meta.cache {
        Some(cache) if !method.cache_ignored => cache,
        _ => return Ok(CacheDescriptor::disabled()),
    };

    let designated: Vec<(usize, &str)> = method
        .parameters
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.cache_by.as_deref().map(|path| (i, path)))
        .collect();

    match designated.as_slice() {
        [(position, path)] => Ok(CacheDescriptor::enabled(
            cache.prefix.clone(),
            cache.expire,
            cache.num,
            CacheKeySource::new(aliases.name_at(*position), *path),
        )),
        _ => Err(ConfigError::CacheKeyArity {
            operation: method.name.clone(),
            count: designated.len(),
        }),
    }
}
