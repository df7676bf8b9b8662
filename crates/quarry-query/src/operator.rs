//! Operator catalog.
//!
//! Every operator carries a printable sign, a binding priority (smaller
//! binds tighter) and a handful of flags that the expression algebra and
//! the renderers consult.

use serde::{Deserialize, Serialize};

/// How an operator is laid out around its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
	/// `NOT x`, `-x`
	Prefix,
	/// `x IS NULL`
	Postfix,
	/// `a = b`, `a AND b AND c`
	Infix,
	/// `LOWER(x)`, `COALESCE(a, b)`
	Function,
	/// `x IN (a, b, c)`
	InList,
	/// `x BETWEEN a AND b`
	Between,
}

/// Operators understood by the expression algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
	// Logical
	Not,
	And,
	Or,
	// Comparison
	Eq,
	Ne,
	Gt,
	Ge,
	Lt,
	Le,
	Like,
	NotLike,
	In,
	NotIn,
	Between,
	IsNull,
	IsNotNull,
	// Arithmetic
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Neg,
	// Scalar functions
	Lower,
	Upper,
	Trim,
	Length,
	Substring,
	Concat,
	Coalesce,
	// Aggregates
	Count,
	Sum,
	Avg,
	Min,
	Max,
}

impl Operator {
	/// Printable sign or function name.
	pub fn sign(&self) -> &'static str {
		match self {
			Self::Not => "NOT",
			Self::And => "AND",
			Self::Or => "OR",
			Self::Eq => "=",
			Self::Ne => "<>",
			Self::Gt => ">",
			Self::Ge => ">=",
			Self::Lt => "<",
			Self::Le => "<=",
			Self::Like => "LIKE",
			Self::NotLike => "NOT LIKE",
			Self::In => "IN",
			Self::NotIn => "NOT IN",
			Self::Between => "BETWEEN",
			Self::IsNull => "IS NULL",
			Self::IsNotNull => "IS NOT NULL",
			Self::Add => "+",
			Self::Sub => "-",
			Self::Mul => "*",
			Self::Div => "/",
			Self::Rem => "%",
			Self::Neg => "-",
			Self::Lower => "LOWER",
			Self::Upper => "UPPER",
			Self::Trim => "TRIM",
			Self::Length => "LENGTH",
			Self::Substring => "SUBSTR",
			Self::Concat => "CONCAT",
			Self::Coalesce => "COALESCE",
			Self::Count => "COUNT",
			Self::Sum => "SUM",
			Self::Avg => "AVG",
			Self::Min => "MIN",
			Self::Max => "MAX",
		}
	}

	/// Binding priority. Smaller values bind tighter.
	pub fn priority(&self) -> u8 {
		match self {
			Self::Neg => 2,
			Self::Mul | Self::Div | Self::Rem => 3,
			Self::Add | Self::Sub => 4,
			Self::Gt | Self::Ge | Self::Lt | Self::Le => 6,
			Self::Eq | Self::Ne => 7,
			Self::Like
			| Self::NotLike
			| Self::In
			| Self::NotIn
			| Self::Between
			| Self::IsNull
			| Self::IsNotNull => 8,
			Self::Not => 10,
			Self::And => 11,
			Self::Or => 13,
			_ => 0,
		}
	}

	/// Whether nested applications of this operator may be flattened into a
	/// single n-ary node.
	pub fn is_multivalued(&self) -> bool {
		matches!(self, Self::And | Self::Or | Self::In)
	}

	pub fn is_aggregate(&self) -> bool {
		matches!(
			self,
			Self::Count | Self::Sum | Self::Avg | Self::Min | Self::Max
		)
	}

	pub fn notation(&self) -> Notation {
		match self {
			Self::Not | Self::Neg => Notation::Prefix,
			Self::IsNull | Self::IsNotNull => Notation::Postfix,
			Self::In | Self::NotIn => Notation::InList,
			Self::Between => Notation::Between,
			op if op.priority() == 0 => Notation::Function,
			_ => Notation::Infix,
		}
	}

	/// Whether this operator compares its operands: the relational,
	/// equality, pattern, membership, range and null tests.
	pub fn is_comparison(&self) -> bool {
		(6..=8).contains(&self.priority())
	}

	/// Whether applying this operator produces a boolean.
	pub fn yields_boolean(&self) -> bool {
		matches!(
			self,
			Self::Not
				| Self::And | Self::Or
				| Self::Eq | Self::Ne
				| Self::Gt | Self::Ge
				| Self::Lt | Self::Le
				| Self::Like | Self::NotLike
				| Self::In | Self::NotIn
				| Self::Between
				| Self::IsNull | Self::IsNotNull
		)
	}

	/// Whether a child operation applying `child` must be parenthesized when
	/// it appears under this operator.
	///
	/// A child is wrapped when it binds looser than its parent. For a
	/// non-flattening infix parent an equally binding argument is wrapped as
	/// well, so `a - (b - c)` keeps its grouping. Comparisons do not
	/// associate, so a comparison under a comparison is always wrapped.
	/// Function arguments and IN list members are delimited already and
	/// never wrapped.
	pub fn wraps(&self, child: Operator, as_argument: bool) -> bool {
		match self.notation() {
			Notation::Function => return false,
			Notation::InList if as_argument => return false,
			_ => {}
		}
		if child.priority() > self.priority() || (self.is_comparison() && child.is_comparison()) {
			return true;
		}
		as_argument
			&& child.priority() == self.priority()
			&& self.notation() == Notation::Infix
			&& !self.is_multivalued()
	}

	/// The operator that tests the opposite condition, if any.
	pub fn negated(&self) -> Option<Self> {
		match self {
			Self::Eq => Some(Self::Ne),
			Self::Ne => Some(Self::Eq),
			Self::Like => Some(Self::NotLike),
			Self::NotLike => Some(Self::Like),
			Self::In => Some(Self::NotIn),
			Self::NotIn => Some(Self::In),
			Self::IsNull => Some(Self::IsNotNull),
			Self::IsNotNull => Some(Self::IsNull),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Operator::Mul, Operator::Add)]
	#[case(Operator::Add, Operator::Gt)]
	#[case(Operator::Gt, Operator::Eq)]
	#[case(Operator::Eq, Operator::Not)]
	#[case(Operator::Not, Operator::And)]
	#[case(Operator::And, Operator::Or)]
	fn test_priority_ordering(#[case] tighter: Operator, #[case] looser: Operator) {
		assert!(tighter.priority() < looser.priority());
	}

	#[rstest]
	#[case(Operator::And, true)]
	#[case(Operator::Or, true)]
	#[case(Operator::In, true)]
	#[case(Operator::NotIn, false)]
	#[case(Operator::Eq, false)]
	fn test_multivalued(#[case] op: Operator, #[case] expected: bool) {
		assert_eq!(op.is_multivalued(), expected);
	}

	#[rstest]
	#[case(Operator::Count, Notation::Function)]
	#[case(Operator::Lower, Notation::Function)]
	#[case(Operator::IsNull, Notation::Postfix)]
	#[case(Operator::Not, Notation::Prefix)]
	#[case(Operator::Between, Notation::Between)]
	#[case(Operator::Or, Notation::Infix)]
	fn test_notation(#[case] op: Operator, #[case] expected: Notation) {
		assert_eq!(op.notation(), expected);
	}

	#[rstest]
	#[case(Operator::And, Operator::Or, false, true)]
	#[case(Operator::Or, Operator::And, false, false)]
	#[case(Operator::Sub, Operator::Sub, true, true)]
	#[case(Operator::Sub, Operator::Sub, false, false)]
	#[case(Operator::And, Operator::And, true, false)]
	#[case(Operator::Lower, Operator::Add, false, false)]
	#[case(Operator::Not, Operator::And, false, true)]
	fn test_wraps(
		#[case] parent: Operator,
		#[case] child: Operator,
		#[case] as_argument: bool,
		#[case] expected: bool,
	) {
		assert_eq!(parent.wraps(child, as_argument), expected);
	}

	#[rstest]
	fn test_aggregates_are_functions() {
		for op in [Operator::Count, Operator::Sum, Operator::Avg, Operator::Min, Operator::Max] {
			assert!(op.is_aggregate());
			assert_eq!(op.priority(), 0);
			assert!(!op.yields_boolean());
		}
	}
}
