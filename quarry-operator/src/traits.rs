//! Collaborator traits an operator hands its resolved metadata to.
//!
//! Statement execution and cache storage live outside this workspace. These
//! traits are the seams they plug into.

use quarry_core::{DataSourceError, ExpirePolicy, QuarryResult, SqlType, Value};
use std::collections::HashMap;

/// Environment variable naming the data source an empty name routes to.
pub const DEFAULT_DATA_SOURCE_ENV: &str = "QUARRY_DEFAULT_DATA_SOURCE";

/// Routing key used when neither the descriptor nor the environment names one.
pub const DEFAULT_DATA_SOURCE_NAME: &str = "default";

// ============================================================================
// DATA SOURCE ROUTING
// ============================================================================

/// Picks the physical data source for an operation.
///
/// An empty `name` asks for the default data source.
pub trait DataSourceFactory: Send + Sync {
    /// Handle to whatever executes statements (pool, connection, client).
    type DataSource;

    fn get_data_source(
        &self,
        name: &str,
        sql_type: SqlType,
    ) -> Result<Self::DataSource, DataSourceError>;
}

/// Fixed routing table from data source name to handle.
///
/// Writes go to the primary registered under a name. Reads prefer a replica
/// registered under the same name and fall back to the primary.
#[derive(Debug, Clone)]
pub struct StaticDataSourceFactory<D> {
    default_name: String,
    primaries: HashMap<String, D>,
    replicas: HashMap<String, D>,
}

impl<D> StaticDataSourceFactory<D> {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            default_name: default_name.into(),
            primaries: HashMap::new(),
            replicas: HashMap::new(),
        }
    }

    /// Create a factory whose default name comes from
    /// `QUARRY_DEFAULT_DATA_SOURCE`, falling back to `"default"`.
    pub fn from_env() -> Self {
        let default_name = std::env::var(DEFAULT_DATA_SOURCE_ENV)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_SOURCE_NAME.to_string());
        Self::new(default_name)
    }

    pub fn with_primary(mut self, name: impl Into<String>, data_source: D) -> Self {
        self.primaries.insert(name.into(), data_source);
        self
    }

    pub fn with_replica(mut self, name: impl Into<String>, data_source: D) -> Self {
        self.replicas.insert(name.into(), data_source);
        self
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }
}

impl<D> Default for StaticDataSourceFactory<D> {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_SOURCE_NAME)
    }
}

impl<D: Clone + Send + Sync> DataSourceFactory for StaticDataSourceFactory<D> {
    type DataSource = D;

    fn get_data_source(&self, name: &str, sql_type: SqlType) -> Result<D, DataSourceError> {
        let name = if name.is_empty() {
            self.default_name.as_str()
        } else {
            name
        };
        let found = match sql_type {
            SqlType::Read => self
                .replicas
                .get(name)
                .or_else(|| self.primaries.get(name)),
            SqlType::Write => self.primaries.get(name),
        };
        found.cloned().ok_or_else(|| DataSourceError::NotFound {
            name: name.to_string(),
            sql_type,
        })
    }
}

// ============================================================================
// CACHE BACKEND
// ============================================================================

/// Key-value cache an operator's results are stored in.
///
/// Keys are the strings derived by [`Operator::single_key`]; implementations
/// must not rewrite them.
///
/// [`Operator::single_key`]: crate::Operator::single_key
pub trait CacheHandler: Send + Sync {
    fn get(&self, key: &str) -> QuarryResult<Option<Value>>;

    /// Fetch several keys at once. Missing keys are absent from the result.
    fn get_bulk(&self, keys: &[String]) -> QuarryResult<HashMap<String, Value>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key)? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    fn set(&self, key: &str, value: Value, expire: ExpirePolicy) -> QuarryResult<()>;

    fn delete(&self, key: &str) -> QuarryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> StaticDataSourceFactory<&'static str> {
        StaticDataSourceFactory::new("main")
            .with_primary("main", "main-primary")
            .with_primary("users", "users-primary")
            .with_replica("users", "users-replica")
    }

    #[test]
    fn test_empty_name_routes_to_default() {
        let ds = factory().get_data_source("", SqlType::Write).unwrap();
        assert_eq!(ds, "main-primary");
    }

    #[test]
    fn test_reads_prefer_replica() {
        let factory = factory();
        assert_eq!(
            factory.get_data_source("users", SqlType::Read).unwrap(),
            "users-replica"
        );
        assert_eq!(
            factory.get_data_source("users", SqlType::Write).unwrap(),
            "users-primary"
        );
    }

    #[test]
    fn test_reads_fall_back_to_primary() {
        assert_eq!(
            factory().get_data_source("main", SqlType::Read).unwrap(),
            "main-primary"
        );
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = factory()
            .get_data_source("reports", SqlType::Read)
            .unwrap_err();
        assert_eq!(
            err,
            DataSourceError::NotFound {
                name: "reports".to_string(),
                sql_type: SqlType::Read,
            }
        );
    }

    #[test]
    fn test_default_factory_name() {
        let factory: StaticDataSourceFactory<u8> = StaticDataSourceFactory::default();
        assert_eq!(factory.default_name(), DEFAULT_DATA_SOURCE_NAME);
    }
}
