//! # Quarry
//!
//! A type-checked query construction library with optimistic-locking
//! mutations.
//!
//! Quarry splits into two crates, re-exported here:
//!
//! - [`query`] (`quarry-query`): the backend-independent expression algebra
//!   and immutable [`QueryStructure`](query::QueryStructure) snapshots
//! - [`db`] (`quarry-db`): models and typed fields, the fluent
//!   [`QueryBuilder`](db::orm::QueryBuilder), executors, SQL rendering and
//!   the batched mutation executor
//!
//! ## Feature Flags
//!
//! - `sqlite` (default): the sqlx-backed SQLite connection adapter
//!
//! ## Quick Example
//!
//! ```rust
//! use quarry::prelude::*;
//!
//! struct User;
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
//! let adults = QueryBuilder::<User>::new()
//!     .filter(User::AGE)
//!     .ge(18)
//!     .and(User::NAME)
//!     .starts_with("a")
//!     .order_by(User::AGE.desc())
//!     .limit(10);
//!
//! let (sql, params) = SqlRenderer::new(Dialect::Postgres)
//!     .render(&adults.structure())
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM \"users\" WHERE \"age\" >= 18 AND \"name\" LIKE $1 \
//!      ORDER BY \"age\" DESC LIMIT 10"
//! );
//! assert_eq!(params, vec![Value::from("a%")]);
//! ```

pub mod db;
pub mod query;

pub mod prelude {
	pub use quarry_db::prelude::*;
	pub use quarry_query::prelude::*;
}
