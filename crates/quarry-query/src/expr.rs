//! Expression system for query structures.
//!
//! - [`Expression`]: the closed AST (constant, field path, operation)
//! - [`FieldPath`]: a non-empty dotted path of field names
//! - [`Operation`]: an operator applied to an operand and its arguments
//!
//! Operations can only be created through [`Expression::operate`], which
//! keeps AND/OR/IN chains flat and cancels double negations.

mod display;
mod expression;

pub use expression::{Expression, FieldPath, Operation};
