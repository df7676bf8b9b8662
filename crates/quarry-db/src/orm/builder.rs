//! Copy-on-write query builder.
//!
//! Every method takes `&self` and returns a new builder, so a partially
//! built query can be branched freely:
//!
//! ```
//! use quarry_db::orm::{Field, Model, QueryBuilder};
//!
//! struct User;
//! impl User {
//!     const AGE: Field<User, i32> = Field::new("age");
//!     const NAME: Field<User, String> = Field::new("name");
//! }
//! impl Model for User {
//!     fn table_name() -> &'static str { "users" }
//! }
//!
//! let adults = QueryBuilder::<User>::new().filter(User::AGE).ge(18);
//! let named = adults.and(User::NAME).starts_with("a");
//!
//! assert_eq!(adults.structure().to_string(), "select * from users where age >= 18");
//! assert_eq!(
//!     named.structure().to_string(),
//!     "select * from users where age >= 18 AND name LIKE 'a%'"
//! );
//! ```

use std::fmt;
use std::marker::PhantomData;

use quarry_query::{Expression, LockMode, Ordering, QueryStructure, Select};

use super::fields::{Field, Selector, Typed};
use super::model::Model;
use super::stage::{Metadata, Predicate, Stage, StageHost};

/// The clause a filter chain is accumulating into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
	Where,
	Having,
}

#[derive(Debug, Clone)]
struct Pending {
	clause: Clause,
	meta: Metadata,
}

/// Builder for queries over model `M` returning rows of type `R`.
///
/// `R` is `M` until a projection is selected.
pub struct QueryBuilder<M, R = M> {
	structure: QueryStructure,
	pending: Option<Pending>,
	_marker: PhantomData<fn() -> (M, R)>,
}

/// Stage returned by [`QueryBuilder::filter`] and friends.
pub type FilterStage<M, R, T> = Stage<BuilderHost<M, R>, T>;

impl<M: Model> QueryBuilder<M> {
	/// A `select *` over `M`'s table.
	pub fn new() -> Self {
		Self::from_structure(QueryStructure::from_table(M::table_name()))
	}
}

impl<M: Model> Default for QueryBuilder<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M, R> QueryBuilder<M, R> {
	/// Wrap an existing structure. The row type is not checked.
	pub fn from_structure(structure: QueryStructure) -> Self {
		Self {
			structure,
			pending: None,
			_marker: PhantomData,
		}
	}

	fn rebuild<S>(
		&self,
		structure: QueryStructure,
		pending: Option<Pending>,
	) -> QueryBuilder<M, S> {
		QueryBuilder {
			structure,
			pending,
			_marker: PhantomData,
		}
	}

	fn map_structure(&self, update: impl FnOnce(&QueryStructure) -> QueryStructure) -> Self {
		self.rebuild(update(&self.structure), self.pending.clone())
	}

	/// The structure with any open filter chain folded in.
	pub fn structure(&self) -> QueryStructure {
		match &self.pending {
			None => self.structure.clone(),
			Some(Pending {
				clause: Clause::Where,
				meta,
			}) => self.structure.and_where(meta.merge()),
			Some(Pending {
				clause: Clause::Having,
				meta,
			}) => self.structure.and_having(meta.merge()),
		}
	}

	/// Which clause the open filter chain writes to, if any.
	pub fn pending_clause(&self) -> Option<Clause> {
		self.pending.as_ref().map(|p| p.clause)
	}

	fn stage<T>(
		&self,
		structure: QueryStructure,
		clause: Clause,
		meta: Metadata,
	) -> FilterStage<M, R, T> {
		Stage::new(
			BuilderHost {
				structure,
				clause,
				_marker: PhantomData,
			},
			meta,
		)
	}

	/// Open a new filter chain ANDed onto the where clause.
	pub fn filter<S: Selector<M>>(&self, selector: S) -> FilterStage<M, R, S::Value> {
		self.stage(
			self.structure(),
			Clause::Where,
			Metadata::start(selector.into_expression()),
		)
	}

	/// Open a new filter chain ANDed onto the having clause.
	pub fn having<S: Selector<M>>(&self, selector: S) -> FilterStage<M, R, S::Value> {
		self.stage(
			self.structure(),
			Clause::Having,
			Metadata::start(selector.into_expression()),
		)
	}

	/// Split off the open chain, or seed one from the current where clause.
	fn continuation(&self) -> (QueryStructure, Clause, Metadata) {
		match &self.pending {
			Some(pending) => (self.structure.clone(), pending.clause, pending.meta.clone()),
			None => (
				self.structure.with_where(Expression::TRUE),
				Clause::Where,
				Metadata::start(self.structure.where_clause().clone()),
			),
		}
	}

	/// Continue the open chain in the current AND-group.
	pub fn and<S: Selector<M>>(&self, selector: S) -> FilterStage<M, R, S::Value> {
		let (structure, clause, meta) = self.continuation();
		self.stage(structure, clause, meta.and(selector.into_expression()))
	}

	/// Close the current AND-group and continue in a new one.
	pub fn or<S: Selector<M>>(&self, selector: S) -> FilterStage<M, R, S::Value> {
		let (structure, clause, meta) = self.continuation();
		self.stage(structure, clause, meta.or(selector.into_expression()))
	}

	/// AND a complete predicate into the open chain as one group.
	pub fn and_where(&self, predicate: &Predicate<M>) -> Self {
		let (structure, clause, meta) = self.continuation();
		self.rebuild(
			structure,
			Some(Pending {
				clause,
				meta: meta.and(predicate.build()),
			}),
		)
	}

	/// OR a complete predicate into the open chain as one group.
	pub fn or_where(&self, predicate: &Predicate<M>) -> Self {
		let (structure, clause, meta) = self.continuation();
		self.rebuild(
			structure,
			Some(Pending {
				clause,
				meta: meta.or(predicate.build()),
			}),
		)
	}

	/// Negate the open chain, or the where clause when no chain is open.
	///
	/// A builder without any filter is returned unchanged: an empty where
	/// clause matches every row and stays that way.
	pub fn not(&self) -> Self {
		if self.pending.is_none() && self.structure.where_clause().is_true_literal() {
			return self.clone();
		}
		let (structure, clause, meta) = self.continuation();
		self.rebuild(
			structure,
			Some(Pending {
				clause,
				meta: meta.negate(),
			}),
		)
	}

	/// AND a free-standing predicate onto the where clause.
	pub fn filter_by(&self, predicate: &Predicate<M>) -> Self {
		self.rebuild(self.structure().and_where(predicate.build()), None)
	}

	/// Replace the selection, changing the row type.
	pub fn select<P: Projection<M>>(&self, projection: P) -> QueryBuilder<M, P::Output> {
		self.rebuild(
			self.structure.with_select(projection.into_select()),
			self.pending.clone(),
		)
	}

	pub fn select_distinct<P: Projection<M>>(&self, projection: P) -> QueryBuilder<M, P::Output> {
		self.rebuild(
			self.structure.with_select(projection.into_select().distinct()),
			self.pending.clone(),
		)
	}

	pub fn group_by<S: Selector<M>>(&self, selector: S) -> Self {
		self.map_structure(|q| q.add_group_by(selector.into_expression()))
	}

	pub fn order_by(&self, ordering: Ordering) -> Self {
		self.map_structure(|q| q.add_order_by(ordering))
	}

	/// Eagerly load the related model behind `field`.
	pub fn fetch<U: Model>(&self, field: Field<M, U>) -> Self {
		self.map_structure(|q| q.add_fetch(field.path()))
	}

	pub fn offset(&self, offset: u64) -> Self {
		self.map_structure(|q| q.with_offset(Some(offset)))
	}

	pub fn limit(&self, limit: u64) -> Self {
		self.map_structure(|q| q.with_limit(Some(limit)))
	}

	pub fn lock(&self, lock_mode: LockMode) -> Self {
		self.map_structure(|q| q.with_lock_mode(lock_mode))
	}
}

impl<M, R> Clone for QueryBuilder<M, R> {
	fn clone(&self) -> Self {
		self.rebuild(self.structure.clone(), self.pending.clone())
	}
}

impl<M, R> fmt::Debug for QueryBuilder<M, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QueryBuilder")
			.field("structure", &self.structure)
			.field("pending", &self.pending)
			.finish()
	}
}

/// Stage host that resumes into a [`QueryBuilder`] with the chain open.
pub struct BuilderHost<M, R> {
	structure: QueryStructure,
	clause: Clause,
	_marker: PhantomData<fn() -> (M, R)>,
}

impl<M, R> StageHost for BuilderHost<M, R> {
	type Next = QueryBuilder<M, R>;

	fn resume(self, meta: Metadata) -> QueryBuilder<M, R> {
		QueryBuilder {
			structure: self.structure,
			pending: Some(Pending {
				clause: self.clause,
				meta,
			}),
			_marker: PhantomData,
		}
	}
}

/// What [`QueryBuilder::select`] accepts: a selector or a tuple of up to
/// four selectors.
pub trait Projection<M> {
	/// Row type produced by the projection
	type Output;

	fn into_select(self) -> Select;
}

impl<M, T> Projection<M> for Field<M, T> {
	type Output = T;

	fn into_select(self) -> Select {
		Select::scalar(self.expression())
	}
}

impl<M, T> Projection<M> for Typed<M, T> {
	type Output = T;

	fn into_select(self) -> Select {
		Select::scalar(self.into_expression())
	}
}

macro_rules! tuple_projection {
	($($name:ident),+) => {
		impl<M, $($name: Selector<M>),+> Projection<M> for ($($name,)+) {
			type Output = ($($name::Value,)+);

			#[allow(non_snake_case)]
			fn into_select(self) -> Select {
				let ($($name,)+) = self;
				Select::tuple(vec![$($name.into_expression()),+])
			}
		}
	};
}

tuple_projection!(A, B);
tuple_projection!(A, B, C);
tuple_projection!(A, B, C, D);

#[cfg(test)]
mod tests;
