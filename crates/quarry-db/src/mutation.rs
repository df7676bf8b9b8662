//! Entity writes with optimistic locking.
//!
//! A [`TableMapping`] describes how an entity type maps to its table. The
//! [`MutationExecutor`] turns mappings into batched statements and checks
//! every affected row count, raising [`QueryError::OptimisticLock`] when a
//! versioned row was changed concurrently.
//!
//! [`QueryError::OptimisticLock`]: crate::error::QueryError::OptimisticLock

mod executor;
mod mapping;

pub use executor::MutationExecutor;
pub use mapping::{ColumnMapping, Getter, Setter, TableMapping, VersionType, decode_value};
