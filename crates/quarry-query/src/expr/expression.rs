//! Expression - the core AST and its smart constructors.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::ExpressionError;
use crate::operator::Operator;
use crate::value::Value;

/// An ordered, non-empty list of field names such as `author.name`.
///
/// Equality and hashing use the dot-joined identity string, which is
/// computed once and shared between clones.
#[derive(Debug, Clone)]
pub struct FieldPath {
	names: Arc<[String]>,
	identity: Arc<str>,
}

impl FieldPath {
	/// Create a path from a sequence of field names.
	///
	/// # Errors
	///
	/// Returns [`ExpressionError::EmptyPath`] when `names` is empty.
	pub fn new<I, S>(names: I) -> Result<Self, ExpressionError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let names: Vec<String> = names.into_iter().map(Into::into).collect();
		if names.is_empty() {
			return Err(ExpressionError::EmptyPath);
		}
		Ok(Self::from_vec(names))
	}

	/// A single-segment path.
	pub fn single(name: impl Into<String>) -> Self {
		Self::from_vec(vec![name.into()])
	}

	fn from_vec(names: Vec<String>) -> Self {
		let identity: Arc<str> = Arc::from(names.join("."));
		Self {
			names: Arc::from(names),
			identity,
		}
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	/// The dot-joined form, e.g. `"author.name"`.
	pub fn identity(&self) -> &str {
		&self.identity
	}

	/// The last segment.
	pub fn leaf(&self) -> &str {
		// non-empty by construction
		self.names.last().map(String::as_str).unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Always `false`; paths are never empty.
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// The path without its last segment, or `None` for a single segment.
	pub fn parent(&self) -> Option<Self> {
		if self.names.len() < 2 {
			return None;
		}
		Some(Self::from_vec(self.names[..self.names.len() - 1].to_vec()))
	}

	/// Append the segments of `other` to this path.
	pub fn concat(&self, other: &FieldPath) -> Self {
		let mut names = self.names.to_vec();
		names.extend(other.names.iter().cloned());
		Self::from_vec(names)
	}
}

impl PartialEq for FieldPath {
	fn eq(&self, other: &Self) -> bool {
		self.identity == other.identity
	}
}

impl Eq for FieldPath {}

impl Hash for FieldPath {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.identity.hash(state);
	}
}

/// An operator applied to an operand and an ordered list of arguments.
///
/// Fields are private: [`Expression::operate`] is the only way to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
	operand: Expression,
	operator: Operator,
	args: Vec<Expression>,
}

impl Operation {
	pub fn operand(&self) -> &Expression {
		&self.operand
	}

	pub fn operator(&self) -> Operator {
		self.operator
	}

	pub fn args(&self) -> &[Expression] {
		&self.args
	}
}

/// A node of the expression tree.
///
/// Nodes are immutable. Operations are reference counted, so cloning an
/// expression is cheap and branches of a builder can share sub-trees.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
	/// A literal value
	Constant(Value),
	/// A (possibly nested) field reference
	Path(FieldPath),
	/// An operator application
	Operation(Arc<Operation>),
}

impl Expression {
	/// The literal `true`, used as the empty WHERE/HAVING clause.
	pub const TRUE: Expression = Expression::Constant(Value::Bool(true));

	pub fn constant(value: impl Into<Value>) -> Self {
		Self::Constant(value.into())
	}

	/// Build a field path expression.
	///
	/// # Errors
	///
	/// Returns [`ExpressionError::EmptyPath`] when `names` is empty.
	pub fn path_of<I, S>(names: I) -> Result<Self, ExpressionError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		FieldPath::new(names).map(Self::Path)
	}

	pub fn path(path: FieldPath) -> Self {
		Self::Path(path)
	}

	/// Apply `operator` to `operand` and `args`.
	///
	/// - `NOT` applied to `NOT x` yields `x`.
	/// - For multivalued operators (AND, OR, IN), an operand that already
	///   applies the same operator is extended with `args` instead of being
	///   nested.
	///
	/// # Example
	///
	/// ```rust
	/// use quarry_query::{Expression, Operator};
	///
	/// let x = Expression::path_of(["x"]).unwrap();
	/// let listed = Expression::operate(x, Operator::In, vec![Expression::constant(1)]);
	/// let listed = Expression::operate(listed, Operator::In, vec![Expression::constant(2)]);
	///
	/// assert_eq!(listed.as_operation().unwrap().args().len(), 2);
	/// assert_eq!(listed.to_string(), "x IN (1, 2)");
	/// ```
	pub fn operate(operand: Expression, operator: Operator, args: Vec<Expression>) -> Self {
		if let Self::Operation(inner) = &operand {
			if operator == Operator::Not && inner.operator == Operator::Not && inner.args.is_empty()
			{
				return inner.operand.clone();
			}
			if operator.is_multivalued() && inner.operator == operator {
				let mut merged = inner.args.clone();
				merged.extend(args);
				return Self::Operation(Arc::new(Operation {
					operand: inner.operand.clone(),
					operator,
					args: merged,
				}));
			}
		}
		Self::Operation(Arc::new(Operation {
			operand,
			operator,
			args,
		}))
	}

	/// Returns `true` iff this is the constant `true`.
	pub fn is_true_literal(&self) -> bool {
		matches!(self, Self::Constant(Value::Bool(true)))
	}

	/// Conjunction. A true literal on either side stands for an absent
	/// clause and is elided.
	pub fn and(self, other: Expression) -> Self {
		if self.is_true_literal() {
			return other;
		}
		if other.is_true_literal() {
			return self;
		}
		Self::operate(self, Operator::And, vec![other])
	}

	pub fn or(self, other: Expression) -> Self {
		Self::operate(self, Operator::Or, vec![other])
	}

	pub fn not(self) -> Self {
		Self::operate(self, Operator::Not, Vec::new())
	}

	pub fn as_constant(&self) -> Option<&Value> {
		match self {
			Self::Constant(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_path(&self) -> Option<&FieldPath> {
		match self {
			Self::Path(path) => Some(path),
			_ => None,
		}
	}

	pub fn as_operation(&self) -> Option<&Operation> {
		match self {
			Self::Operation(op) => Some(op),
			_ => None,
		}
	}

	/// Whether an aggregate operator appears anywhere in this tree.
	pub fn contains_aggregate(&self) -> bool {
		match self {
			Self::Operation(op) => {
				op.operator.is_aggregate()
					|| op.operand.contains_aggregate()
					|| op.args.iter().any(Expression::contains_aggregate)
			}
			_ => false,
		}
	}

	/// Whether this expression can stand as a boolean condition.
	///
	/// Field paths are accepted since their type is not known here.
	pub fn yields_boolean(&self) -> bool {
		match self {
			Self::Constant(value) => matches!(value, Value::Bool(_)),
			Self::Path(_) => true,
			Self::Operation(op) => op.operator.yields_boolean(),
		}
	}
}

impl From<FieldPath> for Expression {
	fn from(path: FieldPath) -> Self {
		Self::Path(path)
	}
}

impl From<Value> for Expression {
	fn from(value: Value) -> Self {
		Self::Constant(value)
	}
}
