//! Execution backends.
//!
//! A backend turns [`QueryStructure`](quarry_query::QueryStructure)s into rows.
//! [`SqlRenderer`] produces parameterized SQL for a [`Dialect`](crate::settings::Dialect),
//! [`SqlQueryExecutor`] and [`ConnectionExecutor`] run that SQL over a
//! [`Connection`], and [`MemoryExecutor`] evaluates structures directly
//! against rows held in memory.

mod connection;
mod executor;
mod memory;
mod sql;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use connection::{Connection, ConnectionProvider};
pub use executor::{ConnectionExecutor, SqlQueryExecutor};
pub use memory::MemoryExecutor;
pub use sql::SqlRenderer;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteProvider};
