//! Error types for QUARRY operations

use crate::SqlType;
use thiserror::Error;

/// Configuration errors.
///
/// Raised while an operator is being assembled. An operator that fails with
/// one of these is never published.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Operation {operation} needs exactly 1 cache_by parameter but found {count}")]
    CacheKeyArity { operation: String, count: usize },

    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Operation declared more than once: {operation}")]
    DuplicateOperation { operation: String },

    #[error("Failed to parse {format} definition: {reason}")]
    Parse { format: String, reason: String },
}

/// Call-time resolution errors.
///
/// Scoped to a single invocation; the operator stays usable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Parameter not bound in context: {name}")]
    UnknownParameter { name: String },

    #[error("Cannot resolve property path {path} on parameter {parameter} at segment {segment}: {reason}")]
    PropertyResolution {
        parameter: String,
        path: String,
        segment: String,
        reason: String,
    },

    #[error("Operation {operation} does not use the cache")]
    CacheDisabled { operation: String },
}

/// Datasource lookup errors, reported by `DataSourceFactory` implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("No data source named {name:?} for {sql_type:?} operations")]
    NotFound { name: String, sql_type: SqlType },
}

/// Cache backend errors, reported by `CacheHandler` implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failed for key {key}: {reason}")]
    Backend { key: String, reason: String },
}

/// Master error type for all QUARRY errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuarryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for QUARRY operations.
pub type QuarryResult<T> = Result<T, QuarryError>;

// =============================================================================
// TESTS
// =============================================================================
