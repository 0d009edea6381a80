//! QUARRY Core - Operator Metadata Types
//!
//! Pure data structures and pure functions. All other crates depend on this.
//! Declarative metadata for a data-access method is resolved here, once, into
//! immutable descriptors; per-call binding contexts are built here too. No
//! I/O, no logging, no shared mutable state.

pub mod alias;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod metadata;
pub mod value;

pub use alias::{positional_name, ParameterAliasTable};
pub use config::DaoDefinition;
pub use context::{
    build_runtime_context, build_type_context, RuntimeContext, TypeContext, TABLE_KEY,
};
pub use descriptor::{
    resolve_cache_descriptor, resolve_db_descriptor, CacheDescriptor, CacheKeySource,
    DbDescriptor,
};
pub use error::{
    CacheError, ConfigError, DataSourceError, QuarryError, QuarryResult, ResolutionError,
};
pub use metadata::{
    CacheMetadata, DbMetadata, ExpirePolicy, MethodMetadata, ParameterMetadata, SqlType,
    TypeMetadata,
};
pub use value::{PathError, Value, ValueType, PATH_SEPARATOR};
