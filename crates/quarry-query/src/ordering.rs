//! Sort orderings attached to `ORDER BY`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expression;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
	#[default]
	Asc,
	Desc,
}

impl Direction {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

/// An expression paired with a sort direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
	expression: Expression,
	direction: Direction,
}

impl Ordering {
	pub fn new(expression: impl Into<Expression>, direction: Direction) -> Self {
		Self {
			expression: expression.into(),
			direction,
		}
	}

	pub fn asc(expression: impl Into<Expression>) -> Self {
		Self::new(expression, Direction::Asc)
	}

	pub fn desc(expression: impl Into<Expression>) -> Self {
		Self::new(expression, Direction::Desc)
	}

	pub fn expression(&self) -> &Expression {
		&self.expression
	}

	pub fn direction(&self) -> Direction {
		self.direction
	}
}

impl fmt::Display for Ordering {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.expression, self.direction.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expr::FieldPath;
	use rstest::rstest;

	#[rstest]
	#[case(Ordering::asc(FieldPath::single("age")), "age asc")]
	#[case(Ordering::desc(FieldPath::single("age")), "age desc")]
	fn test_display(#[case] ordering: Ordering, #[case] expected: &str) {
		assert_eq!(ordering.to_string(), expected);
	}

	#[rstest]
	fn test_default_direction_is_ascending() {
		assert_eq!(Direction::default(), Direction::Asc);
	}
}
