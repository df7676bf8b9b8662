//! Expression algebra and query structures.
//!
//! # Examples
//!
//! ```rust
//! use quarry::query::{Expression, Operator, QueryStructure};
//!
//! let age = Expression::path_of(["age"]).unwrap();
//! let query = QueryStructure::from_table("users")
//!     .and_where(Expression::operate(age, Operator::Ge, vec![Expression::constant(21)]));
//! assert_eq!(query.to_string(), "select * from users where age >= 21");
//! ```

pub use quarry_query::*;
