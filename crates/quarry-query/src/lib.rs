//! # quarry-query
//!
//! Expression algebra and immutable query structures for quarry.
//!
//! This crate holds the backend-independent half of the library: a small
//! expression AST, the smart constructors that keep it normalized, and the
//! [`QueryStructure`] record that fluent builders derive snapshots of.
//!
//! ## Architecture
//!
//! - [`value`]: scalar values carried by constants and bind parameters
//! - [`operator`]: the operator catalog (sign, priority, flags)
//! - [`expr`]: [`Expression`], [`FieldPath`] and [`Operation`]
//! - [`ordering`]: sort directions attached to `ORDER BY`
//! - [`lock`]: lock modes requested by a query
//! - [`query`]: [`QueryStructure`] and its terminal derivations
//!
//! ## Expression Examples
//!
//! ```rust
//! use quarry_query::prelude::*;
//!
//! let a = Expression::path_of(["a"]).unwrap();
//! let b = Expression::path_of(["b"]).unwrap();
//! let c = Expression::path_of(["c"]).unwrap();
//!
//! let a_or_b = Expression::operate(
//!     Expression::operate(a, Operator::Eq, vec![Expression::constant(1)]),
//!     Operator::Or,
//!     vec![Expression::operate(b, Operator::Eq, vec![Expression::constant(2)])],
//! );
//! let both = Expression::operate(
//!     a_or_b.clone(),
//!     Operator::And,
//!     vec![Expression::operate(c, Operator::Eq, vec![Expression::constant(3)])],
//! );
//!
//! assert_eq!(a_or_b.to_string(), "a = 1 OR b = 2");
//! assert_eq!(both.to_string(), "(a = 1 OR b = 2) AND c = 3");
//! ```
//!
//! ## Query Structure Examples
//!
//! ```rust
//! use quarry_query::prelude::*;
//!
//! let age = Expression::path_of(["age"]).unwrap();
//! let base = QueryStructure::from_table("users")
//!     .and_where(Expression::operate(age.clone(), Operator::Gt, vec![Expression::constant(18)]))
//!     .add_order_by(Ordering::desc(age));
//!
//! assert_eq!(
//!     base.to_string(),
//!     "select * from users where age > 18 orderBy age desc"
//! );
//! assert_eq!(
//!     base.count_query().to_string(),
//!     "select COUNT(1) from users where age > 18"
//! );
//! ```

pub mod error;
pub mod expr;
pub mod lock;
pub mod operator;
pub mod ordering;
pub mod query;
pub mod value;

pub mod prelude {
	pub use crate::error::ExpressionError;
	pub use crate::expr::{Expression, FieldPath, Operation};
	pub use crate::lock::LockMode;
	pub use crate::operator::{Notation, Operator};
	pub use crate::ordering::{Direction, Ordering};
	pub use crate::query::{QueryStructure, Select, Selection, Source};
	pub use crate::value::Value;
}

pub use prelude::*;
