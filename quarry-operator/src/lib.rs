//! QUARRY Operator - Resolved Data-Access Operators
//!
//! An [`Operator`] is built once per data-access method from declarative
//! metadata and then shared by every call. It hands binding contexts to the
//! statement layer, cache keys to the cache layer, and a data source name to
//! the routing layer. Those layers plug in through the traits in [`traits`].

pub mod operator;
pub mod registry;
pub mod traits;

pub use operator::Operator;
pub use registry::OperatorRegistry;
pub use traits::{
    CacheHandler, DataSourceFactory, StaticDataSourceFactory, DEFAULT_DATA_SOURCE_ENV,
    DEFAULT_DATA_SOURCE_NAME,
};

// Re-export core types for convenience
pub use quarry_core::{
    CacheDescriptor, CacheKeySource, DbDescriptor, MethodMetadata, ParameterMetadata, QuarryError,
    QuarryResult, RuntimeContext, SqlType, TypeContext, TypeMetadata, Value, ValueType,
};
