//! Filter chain state machine.
//!
//! A chain such as `filter(a).gt(1).and(b).eq(2).or(c).lt(3)` is
//! accumulated in a [`Metadata`] value:
//!
//! - `right` is the expression the current operator stage is shaping
//! - `left` is the AND-group the current sub-predicate joins
//! - `expressions` holds the AND-groups already closed by `or`
//!
//! Connectives are applied in the order they were written: `and` extends
//! the open AND-group and `or` closes it. `a AND b OR c` means
//! `(a AND b) OR c`, and `a OR b AND c` means `a OR (b AND c)`. Explicit
//! grouping goes through [`Predicate::and_where`] and
//! [`Predicate::or_where`].

use std::marker::PhantomData;

use quarry_query::{Expression, FieldPath, Operator};

use super::fields::{Comparable, Field, IntoOperand, NumericType, Selector, StringType};
use super::model::Model;
use crate::error::{QueryError, Result};

/// Transient accumulator of a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
	expressions: Vec<Expression>,
	left: Expression,
	right: Expression,
}

impl Metadata {
	/// A fresh chain whose first operand is `right`.
	pub fn start(right: Expression) -> Self {
		Self {
			expressions: Vec::new(),
			left: Expression::TRUE,
			right,
		}
	}

	pub fn right(&self) -> &Expression {
		&self.right
	}

	/// The AND-group currently being built.
	fn group(&self) -> Expression {
		self.left.clone().and(self.right.clone())
	}

	/// Apply `operator` to the expression being shaped.
	pub fn apply(self, operator: Operator, args: Vec<Expression>) -> Self {
		Self {
			right: Expression::operate(self.right, operator, args),
			..self
		}
	}

	/// Join `next` to the current AND-group.
	pub fn and(self, next: Expression) -> Self {
		Self {
			left: self.group(),
			right: next,
			expressions: self.expressions,
		}
	}

	/// Close the current AND-group and start a new one with `next`.
	///
	/// An empty group (the true literal) is dropped instead of closed.
	pub fn or(self, next: Expression) -> Self {
		let group = self.group();
		let mut expressions = self.expressions;
		if !group.is_true_literal() {
			expressions.push(group);
		}
		Self {
			expressions,
			left: Expression::TRUE,
			right: next,
		}
	}

	/// A chain holding the negation of everything accumulated so far.
	pub fn negate(self) -> Self {
		Self::start(self.merge().not())
	}

	/// Extend the field path in `right` with `name`.
	///
	/// # Errors
	///
	/// Returns [`QueryError::IllegalState`] when `right` is not a field path.
	pub fn navigate(self, name: &str) -> Result<Self> {
		let path = match &self.right {
			Expression::Path(path) => path.concat(&FieldPath::single(name)),
			other => {
				return Err(QueryError::illegal_state(format!(
					"cannot navigate to `{}` from non-path expression `{}`",
					name, other
				)));
			}
		};
		Ok(Self {
			right: Expression::path(path),
			..self
		})
	}

	/// The single expression this chain stands for.
	pub fn merge(&self) -> Expression {
		self.expressions
			.iter()
			.cloned()
			.chain(std::iter::once(self.group()))
			.reduce(|acc, branch| Expression::operate(acc, Operator::Or, vec![branch]))
			.unwrap_or(Expression::TRUE)
	}
}

/// The owner of a filter chain, resumed once an operator completes a
/// sub-predicate.
pub trait StageHost: Sized {
	type Next;

	fn resume(self, meta: Metadata) -> Self::Next;
}

/// An operator stage over values of type `T`.
///
/// Boolean operators (`eq`, `gt`, `like`, ...) complete the current
/// sub-predicate and hand control back to the host. Value operators (`add`,
/// `lower`, `count`, ...) reshape the operand and stay in a stage.
#[must_use = "a stage does nothing until an operator completes it"]
pub struct Stage<H, T> {
	host: H,
	meta: Metadata,
	_value: PhantomData<fn() -> T>,
}

impl<H: StageHost, T> Stage<H, T> {
	pub fn new(host: H, meta: Metadata) -> Self {
		Self {
			host,
			meta,
			_value: PhantomData,
		}
	}

	pub fn metadata(&self) -> &Metadata {
		&self.meta
	}

	fn complete(self, operator: Operator, args: Vec<Expression>) -> H::Next {
		self.host.resume(self.meta.apply(operator, args))
	}

	fn reshape<U>(self, operator: Operator, args: Vec<Expression>) -> Stage<H, U> {
		Stage::new(self.host, self.meta.apply(operator, args))
	}

	pub fn eq(self, value: impl IntoOperand<T>) -> H::Next {
		self.complete(Operator::Eq, vec![value.into_operand()])
	}

	pub fn ne(self, value: impl IntoOperand<T>) -> H::Next {
		self.complete(Operator::Ne, vec![value.into_operand()])
	}

	pub fn in_list<I, V>(self, values: I) -> H::Next
	where
		I: IntoIterator<Item = V>,
		V: IntoOperand<T>,
	{
		let args = values.into_iter().map(IntoOperand::into_operand).collect();
		self.complete(Operator::In, args)
	}

	pub fn not_in<I, V>(self, values: I) -> H::Next
	where
		I: IntoIterator<Item = V>,
		V: IntoOperand<T>,
	{
		let args = values.into_iter().map(IntoOperand::into_operand).collect();
		self.complete(Operator::NotIn, args)
	}

	pub fn is_null(self) -> H::Next {
		self.complete(Operator::IsNull, Vec::new())
	}

	pub fn is_not_null(self) -> H::Next {
		self.complete(Operator::IsNotNull, Vec::new())
	}

	pub fn count(self) -> Stage<H, i64> {
		self.reshape(Operator::Count, Vec::new())
	}

	pub fn coalesce(self, fallback: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Coalesce, vec![fallback.into_operand()])
	}
}

impl<H: StageHost, T: Comparable> Stage<H, T> {
	pub fn gt(self, value: impl IntoOperand<T>) -> H::Next {
		self.complete(Operator::Gt, vec![value.into_operand()])
	}

	pub fn ge(self, value: impl IntoOperand<T>) -> H::Next {
		self.complete(Operator::Ge, vec![value.into_operand()])
	}

	pub fn lt(self, value: impl IntoOperand<T>) -> H::Next {
		self.complete(Operator::Lt, vec![value.into_operand()])
	}

	pub fn le(self, value: impl IntoOperand<T>) -> H::Next {
		self.complete(Operator::Le, vec![value.into_operand()])
	}

	pub fn between(self, low: impl IntoOperand<T>, high: impl IntoOperand<T>) -> H::Next {
		self.complete(
			Operator::Between,
			vec![low.into_operand(), high.into_operand()],
		)
	}

	pub fn min(self) -> Stage<H, T> {
		self.reshape(Operator::Min, Vec::new())
	}

	pub fn max(self) -> Stage<H, T> {
		self.reshape(Operator::Max, Vec::new())
	}
}

impl<H: StageHost, T: NumericType> Stage<H, T> {
	pub fn add(self, value: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Add, vec![value.into_operand()])
	}

	pub fn sub(self, value: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Sub, vec![value.into_operand()])
	}

	pub fn mul(self, value: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Mul, vec![value.into_operand()])
	}

	pub fn div(self, value: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Div, vec![value.into_operand()])
	}

	pub fn rem(self, value: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Rem, vec![value.into_operand()])
	}

	pub fn neg(self) -> Stage<H, T> {
		self.reshape(Operator::Neg, Vec::new())
	}

	pub fn sum(self) -> Stage<H, T> {
		self.reshape(Operator::Sum, Vec::new())
	}

	pub fn avg(self) -> Stage<H, f64> {
		self.reshape(Operator::Avg, Vec::new())
	}
}

impl<H: StageHost, T: StringType> Stage<H, T> {
	pub fn like(self, pattern: impl Into<String>) -> H::Next {
		self.complete(Operator::Like, vec![Expression::constant(pattern.into())])
	}

	pub fn not_like(self, pattern: impl Into<String>) -> H::Next {
		self.complete(Operator::NotLike, vec![Expression::constant(pattern.into())])
	}

	/// `LIKE 'prefix%'`. Wildcards inside `prefix` keep their meaning.
	pub fn starts_with(self, prefix: &str) -> H::Next {
		self.like(format!("{}%", prefix))
	}

	pub fn ends_with(self, suffix: &str) -> H::Next {
		self.like(format!("%{}", suffix))
	}

	pub fn contains(self, needle: &str) -> H::Next {
		self.like(format!("%{}%", needle))
	}

	pub fn lower(self) -> Stage<H, T> {
		self.reshape(Operator::Lower, Vec::new())
	}

	pub fn upper(self) -> Stage<H, T> {
		self.reshape(Operator::Upper, Vec::new())
	}

	pub fn trim(self) -> Stage<H, T> {
		self.reshape(Operator::Trim, Vec::new())
	}

	pub fn length(self) -> Stage<H, i64> {
		self.reshape(Operator::Length, Vec::new())
	}

	/// `SUBSTR(x, start, len)` with a 1-based `start`.
	pub fn substring(self, start: i64, len: i64) -> Stage<H, T> {
		self.reshape(
			Operator::Substring,
			vec![Expression::constant(start), Expression::constant(len)],
		)
	}

	pub fn concat(self, value: impl IntoOperand<T>) -> Stage<H, T> {
		self.reshape(Operator::Concat, vec![value.into_operand()])
	}
}

impl<H: StageHost, T: Model> Stage<H, T> {
	/// Navigate into a field of the related model `T`.
	///
	/// # Errors
	///
	/// Returns [`QueryError::IllegalState`] when the stage no longer holds a
	/// plain field path (for example after `coalesce`).
	pub fn get<U>(self, field: Field<T, U>) -> Result<Stage<H, U>> {
		let meta = self.meta.navigate(field.name())?;
		Ok(Stage::new(self.host, meta))
	}
}

/// Host for free-standing predicates.
pub struct PredicateHost<M> {
	_model: PhantomData<fn() -> M>,
}

impl<M> StageHost for PredicateHost<M> {
	type Next = Predicate<M>;

	fn resume(self, meta: Metadata) -> Predicate<M> {
		Predicate {
			meta,
			_model: PhantomData,
		}
	}
}

fn predicate_host<M>() -> PredicateHost<M> {
	PredicateHost {
		_model: PhantomData,
	}
}

/// A boolean expression over model `M`, built with the same chain rules as
/// query filters.
///
/// ```
/// use quarry_db::orm::{Field, Model, Predicate};
///
/// struct Task;
/// impl Task {
///     const DONE: Field<Task, bool> = Field::new("done");
///     const PRIORITY: Field<Task, i32> = Field::new("priority");
/// }
/// impl Model for Task {
///     fn table_name() -> &'static str { "tasks" }
/// }
///
/// let urgent = Predicate::of(Task::DONE).eq(false).and(Task::PRIORITY).ge(3);
/// assert_eq!(urgent.build().to_string(), "done = FALSE AND priority >= 3");
/// ```
pub struct Predicate<M> {
	meta: Metadata,
	_model: PhantomData<fn() -> M>,
}

impl<M> Predicate<M> {
	/// Start a predicate at `selector`.
	pub fn of<S: Selector<M>>(selector: S) -> Stage<PredicateHost<M>, S::Value> {
		Stage::new(predicate_host(), Metadata::start(selector.into_expression()))
	}

	pub fn and<S: Selector<M>>(self, selector: S) -> Stage<PredicateHost<M>, S::Value> {
		Stage::new(predicate_host(), self.meta.and(selector.into_expression()))
	}

	pub fn or<S: Selector<M>>(self, selector: S) -> Stage<PredicateHost<M>, S::Value> {
		Stage::new(predicate_host(), self.meta.or(selector.into_expression()))
	}

	/// AND a complete predicate, kept as one group.
	pub fn and_where(self, other: Predicate<M>) -> Self {
		predicate_host().resume(self.meta.and(other.build()))
	}

	/// OR a complete predicate, kept as one group.
	pub fn or_where(self, other: Predicate<M>) -> Self {
		predicate_host().resume(self.meta.or(other.build()))
	}

	pub fn not(self) -> Self {
		predicate_host().resume(self.meta.negate())
	}

	pub fn build(&self) -> Expression {
		self.meta.merge()
	}
}

impl<M> Clone for Predicate<M> {
	fn clone(&self) -> Self {
		predicate_host().resume(self.meta.clone())
	}
}

impl<M> std::fmt::Debug for Predicate<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Predicate").field(&self.build()).finish()
	}
}

impl<M> TryFrom<Expression> for Predicate<M> {
	type Error = QueryError;

	/// Wrap an existing expression.
	///
	/// Operations that do not produce a boolean, and non-boolean constants,
	/// are rejected with [`QueryError::IllegalState`].
	fn try_from(expression: Expression) -> Result<Self> {
		if !expression.yields_boolean() {
			return Err(QueryError::illegal_state(format!(
				"`{}` is not a boolean expression",
				expression
			)));
		}
		Ok(predicate_host().resume(Metadata::start(expression)))
	}
}
