//! Field selectors and typed expressions.
//!
//! A [`Field<M, T>`] names a property of model `M` whose values have type
//! `T`. The value type decides which operators a filter stage offers: see
//! the [`Comparable`], [`NumericType`] and [`StringType`] marker traits.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quarry_query::{Expression, FieldPath, Operator, Ordering};
use uuid::Uuid;

use super::property::{self, PropertyMeta};

/// Marker trait for types that can be ordered (<, >, <=, >=, BETWEEN)
pub trait Comparable {}

/// Marker trait for numeric types (arithmetic, SUM, AVG)
pub trait NumericType: Comparable {}

/// Marker trait for string types (LIKE, LOWER, SUBSTR, ...)
pub trait StringType: Comparable {}

impl Comparable for bool {}
impl Comparable for i32 {}
impl Comparable for i64 {}
impl Comparable for f64 {}
impl Comparable for String {}
impl Comparable for DateTime<Utc> {}
impl Comparable for Uuid {}
impl<T: Comparable> Comparable for Option<T> {}

impl NumericType for i32 {}
impl NumericType for i64 {}
impl NumericType for f64 {}
impl<T: NumericType> NumericType for Option<T> {}

impl StringType for String {}
impl<T: StringType> StringType for Option<T> {}

/// A typed reference to a property of model `M`.
pub struct Field<M, T> {
	name: &'static str,
	_marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Field<M, T> {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			_marker: PhantomData,
		}
	}

	pub const fn name(&self) -> &'static str {
		self.name
	}

	pub fn path(&self) -> FieldPath {
		FieldPath::single(self.name)
	}

	pub fn expression(&self) -> Expression {
		Expression::path(self.path())
	}

	pub fn asc(&self) -> Ordering {
		Ordering::asc(self.path())
	}

	pub fn desc(&self) -> Ordering {
		Ordering::desc(self.path())
	}

	/// `COUNT(field)`, counting non-null values.
	pub fn count(&self) -> Typed<M, i64> {
		Typed::new(Expression::operate(self.expression(), Operator::Count, Vec::new()))
	}

	/// `COALESCE(field, fallback)`.
	pub fn coalesce(&self, fallback: impl IntoOperand<T>) -> Typed<M, T> {
		Typed::new(Expression::operate(
			self.expression(),
			Operator::Coalesce,
			vec![fallback.into_operand()],
		))
	}
}

impl<M: 'static, T: 'static> Field<M, T> {
	/// Resolved (and cached) property metadata.
	pub fn meta(&self) -> Arc<PropertyMeta> {
		property::resolve::<M, T>(self.name)
	}
}

impl<M, T: Comparable> Field<M, T> {
	pub fn min(&self) -> Typed<M, T> {
		Typed::new(Expression::operate(self.expression(), Operator::Min, Vec::new()))
	}

	pub fn max(&self) -> Typed<M, T> {
		Typed::new(Expression::operate(self.expression(), Operator::Max, Vec::new()))
	}
}

impl<M, T: NumericType> Field<M, T> {
	pub fn sum(&self) -> Typed<M, T> {
		Typed::new(Expression::operate(self.expression(), Operator::Sum, Vec::new()))
	}

	pub fn avg(&self) -> Typed<M, f64> {
		Typed::new(Expression::operate(self.expression(), Operator::Avg, Vec::new()))
	}
}

impl<M, T: StringType> Field<M, T> {
	pub fn lower(&self) -> Typed<M, T> {
		Typed::new(Expression::operate(self.expression(), Operator::Lower, Vec::new()))
	}

	pub fn upper(&self) -> Typed<M, T> {
		Typed::new(Expression::operate(self.expression(), Operator::Upper, Vec::new()))
	}

	pub fn length(&self) -> Typed<M, i64> {
		Typed::new(Expression::operate(self.expression(), Operator::Length, Vec::new()))
	}
}

impl<M, T> Clone for Field<M, T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<M, T> Copy for Field<M, T> {}

impl<M, T> fmt::Debug for Field<M, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Field").field(&self.name).finish()
	}
}

impl<M, T> From<Field<M, T>> for Expression {
	fn from(field: Field<M, T>) -> Self {
		field.expression()
	}
}

/// An expression over model `M` known to produce values of type `T`.
pub struct Typed<M, T> {
	expression: Expression,
	_marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Typed<M, T> {
	/// Attach a value type to an expression. The type is not checked.
	pub fn new(expression: Expression) -> Self {
		Self {
			expression,
			_marker: PhantomData,
		}
	}

	pub fn expression(&self) -> &Expression {
		&self.expression
	}

	pub fn asc(&self) -> Ordering {
		Ordering::asc(self.expression.clone())
	}

	pub fn desc(&self) -> Ordering {
		Ordering::desc(self.expression.clone())
	}
}

impl<M> Typed<M, i64> {
	/// `COUNT(1)`, counting rows.
	pub fn count_all() -> Self {
		Self::new(Expression::operate(
			Expression::constant(1),
			Operator::Count,
			Vec::new(),
		))
	}
}

impl<M, T> Clone for Typed<M, T> {
	fn clone(&self) -> Self {
		Self::new(self.expression.clone())
	}
}

impl<M, T> fmt::Debug for Typed<M, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Typed").field(&self.expression).finish()
	}
}

impl<M, T> From<Typed<M, T>> for Expression {
	fn from(typed: Typed<M, T>) -> Self {
		typed.expression
	}
}

/// Something a query over `M` can select, filter or group on.
pub trait Selector<M> {
	/// Type of the values the selector produces
	type Value;

	fn into_expression(self) -> Expression;
}

impl<M, T> Selector<M> for Field<M, T> {
	type Value = T;

	fn into_expression(self) -> Expression {
		self.expression()
	}
}

impl<M, T> Selector<M> for Typed<M, T> {
	type Value = T;

	fn into_expression(self) -> Expression {
		self.expression
	}
}

/// A right-hand operand acceptable where values of type `T` are expected.
pub trait IntoOperand<T> {
	fn into_operand(self) -> Expression;
}

macro_rules! operand_from_value {
	($target:ty => $($source:ty),+ $(,)?) => {
		$(
			impl IntoOperand<$target> for $source {
				fn into_operand(self) -> Expression {
					Expression::constant(self)
				}
			}
		)+
	};
}

operand_from_value!(bool => bool);
operand_from_value!(i32 => i32);
operand_from_value!(i64 => i64, i32);
operand_from_value!(f64 => f64, i32);
operand_from_value!(String => String, &str);
operand_from_value!(DateTime<Utc> => DateTime<Utc>);
operand_from_value!(Uuid => Uuid);
operand_from_value!(Option<bool> => bool, Option<bool>);
operand_from_value!(Option<i32> => i32, Option<i32>);
operand_from_value!(Option<i64> => i64, i32, Option<i64>);
operand_from_value!(Option<f64> => f64, Option<f64>);
operand_from_value!(Option<String> => String, &str, Option<String>);
operand_from_value!(Option<DateTime<Utc>> => DateTime<Utc>, Option<DateTime<Utc>>);
operand_from_value!(Option<Uuid> => Uuid, Option<Uuid>);

impl<N, T> IntoOperand<T> for Field<N, T> {
	fn into_operand(self) -> Expression {
		self.expression()
	}
}

impl<N, T> IntoOperand<T> for Typed<N, T> {
	fn into_operand(self) -> Expression {
		self.expression
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct Item;

	impl Item {
		const PRICE: Field<Item, f64> = Field::new("price");
		const NAME: Field<Item, Option<String>> = Field::new("name");
		const QTY: Field<Item, i32> = Field::new("qty");
	}

	#[rstest]
	fn test_field_expression_and_ordering() {
		assert_eq!(Item::PRICE.expression().to_string(), "price");
		assert_eq!(Item::PRICE.desc().to_string(), "price desc");
		assert_eq!(Item::QTY.path().identity(), "qty");
	}

	#[rstest]
	fn test_aggregate_selectors() {
		assert_eq!(Item::PRICE.sum().expression().to_string(), "SUM(price)");
		assert_eq!(Item::QTY.avg().expression().to_string(), "AVG(qty)");
		assert_eq!(Item::NAME.max().expression().to_string(), "MAX(name)");
		assert_eq!(Typed::<Item, i64>::count_all().expression().to_string(), "COUNT(1)");
		assert!(Item::QTY.count().expression().contains_aggregate());
	}

	#[rstest]
	fn test_string_functions_on_optional_field() {
		assert_eq!(Item::NAME.lower().expression().to_string(), "LOWER(name)");
		assert_eq!(
			Item::NAME.coalesce("n/a").expression().to_string(),
			"COALESCE(name, 'n/a')"
		);
	}

	#[rstest]
	fn test_operands() {
		assert_eq!(IntoOperand::<i64>::into_operand(5i32), Expression::constant(5));
		assert_eq!(
			IntoOperand::<f64>::into_operand(Item::PRICE).to_string(),
			"price"
		);
		assert_eq!(
			IntoOperand::<Option<String>>::into_operand(None::<String>),
			Expression::constant(quarry_query::Value::Null)
		);
	}

	#[rstest]
	fn test_meta_resolves_declared_type() {
		let meta = Item::QTY.meta();
		assert_eq!(meta.name, "qty");
		assert!(meta.is::<i32>());
	}
}
