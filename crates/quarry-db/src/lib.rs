//! # quarry-db
//!
//! Typed query builders, executors and optimistic-locking mutations.
//!
//! ## Architecture
//!
//! - [`orm`]: models, typed fields, the fluent [`QueryBuilder`](orm::QueryBuilder)
//!   and its terminal operations
//! - [`backends`]: SQL rendering, connection traits, the SQLite adapter and
//!   an in-memory executor
//! - [`mutation`]: batched insert, update and delete with version checks
//! - [`settings`]: dialect, batch size and connection settings
//! - [`error`]: the shared [`QueryError`](error::QueryError)
//!
//! ## Example
//!
//! ```rust
//! use quarry_db::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl User {
//!     const NAME: Field<User, String> = Field::new("name");
//!     const AGE: Field<User, i32> = Field::new("age");
//! }
//!
//! impl Model for User {
//!     fn table_name() -> &'static str {
//!         "users"
//!     }
//! }
//!
//! # tokio_test_block(async {
//! let executor = MemoryExecutor::new();
//! executor
//!     .insert(&[
//!         User { name: "ann".into(), age: 31 },
//!         User { name: "bob".into(), age: 17 },
//!     ])
//!     .unwrap();
//!
//! let adults = QueryBuilder::<User>::new().filter(User::AGE).ge(18);
//! assert_eq!(adults.count(&executor).await.unwrap(), 1);
//!
//! let names: Vec<String> = adults.select(User::NAME).list(&executor).await.unwrap();
//! assert_eq!(names, vec!["ann".to_string()]);
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod backends;
pub mod error;
pub mod mutation;
pub mod orm;
pub mod settings;

pub mod prelude {
	pub use crate::backends::{
		Connection, ConnectionExecutor, ConnectionProvider, MemoryExecutor, SqlQueryExecutor,
		SqlRenderer,
	};
	#[cfg(feature = "sqlite")]
	pub use crate::backends::{SqliteConnection, SqliteProvider};
	pub use crate::error::{QueryError, Result};
	pub use crate::mutation::{MutationExecutor, TableMapping};
	pub use crate::orm::{Field, Model, Predicate, QueryBuilder, QueryExecutor, Slice, Typed};
	pub use crate::settings::{Dialect, QuarrySettings};
	pub use quarry_query::{LockMode, Ordering};
}
