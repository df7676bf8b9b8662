//! Immutable query structures.
//!
//! A [`QueryStructure`] describes a complete query: what to select, where
//! from, filtering, grouping, ordering, eager fetches, paging and locking.
//! Every `with_*`/`add_*` method returns a new structure and leaves the
//! receiver untouched, so one partially built query can be branched into
//! count, list and exist variants.

use std::fmt;

use crate::expr::{Expression, FieldPath};
use crate::lock::LockMode;
use crate::operator::Operator;
use crate::ordering::Ordering;

#[cfg(test)]
mod tests;

/// What a query returns per row.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
	/// The whole record
	Entity,
	/// A single expression
	Scalar(Expression),
	/// Several expressions, returned positionally
	Tuple(Vec<Expression>),
}

/// The select clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
	pub selection: Selection,
	pub distinct: bool,
}

impl Select {
	pub fn entity() -> Self {
		Self {
			selection: Selection::Entity,
			distinct: false,
		}
	}

	pub fn scalar(expression: Expression) -> Self {
		Self {
			selection: Selection::Scalar(expression),
			distinct: false,
		}
	}

	pub fn tuple(expressions: Vec<Expression>) -> Self {
		Self {
			selection: Selection::Tuple(expressions),
			distinct: false,
		}
	}

	pub fn distinct(mut self) -> Self {
		self.distinct = true;
		self
	}

	/// The selected expressions, empty for a whole-entity selection.
	pub fn expressions(&self) -> &[Expression] {
		match &self.selection {
			Selection::Entity => &[],
			Selection::Scalar(expr) => std::slice::from_ref(expr),
			Selection::Tuple(exprs) => exprs,
		}
	}
}

impl Default for Select {
	fn default() -> Self {
		Self::entity()
	}
}

/// Where rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
	Table(String),
	SubQuery(Box<QueryStructure>),
}

/// The complete, immutable description of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStructure {
	select: Select,
	source: Source,
	where_clause: Expression,
	group_by: Vec<Expression>,
	having: Expression,
	order_by: Vec<Ordering>,
	fetch: Vec<FieldPath>,
	offset: Option<u64>,
	limit: Option<u64>,
	lock_mode: LockMode,
}

fn count_one() -> Expression {
	Expression::operate(Expression::constant(1), Operator::Count, Vec::new())
}

impl QueryStructure {
	fn with_source(source: Source) -> Self {
		Self {
			select: Select::entity(),
			source,
			where_clause: Expression::TRUE,
			group_by: Vec::new(),
			having: Expression::TRUE,
			order_by: Vec::new(),
			fetch: Vec::new(),
			offset: None,
			limit: None,
			lock_mode: LockMode::None,
		}
	}

	/// A `select *` over `table` with every other clause empty.
	pub fn from_table(table: impl Into<String>) -> Self {
		Self::with_source(Source::Table(table.into()))
	}

	/// A `select *` over the rows produced by `inner`.
	pub fn from_sub_query(inner: QueryStructure) -> Self {
		Self::with_source(Source::SubQuery(Box::new(inner)))
	}

	pub fn select(&self) -> &Select {
		&self.select
	}

	pub fn source(&self) -> &Source {
		&self.source
	}

	pub fn where_clause(&self) -> &Expression {
		&self.where_clause
	}

	pub fn group_by(&self) -> &[Expression] {
		&self.group_by
	}

	pub fn having(&self) -> &Expression {
		&self.having
	}

	pub fn order_by(&self) -> &[Ordering] {
		&self.order_by
	}

	pub fn fetch(&self) -> &[FieldPath] {
		&self.fetch
	}

	pub fn offset(&self) -> Option<u64> {
		self.offset
	}

	pub fn limit(&self) -> Option<u64> {
		self.limit
	}

	pub fn lock_mode(&self) -> LockMode {
		self.lock_mode
	}

	/// The innermost table this query reads from.
	pub fn root_table(&self) -> &str {
		match &self.source {
			Source::Table(name) => name,
			Source::SubQuery(inner) => inner.root_table(),
		}
	}

	// =========================================================================
	// Copy-on-write updates
	// =========================================================================

	fn derive(&self, update: impl FnOnce(&mut Self)) -> Self {
		let mut next = self.clone();
		update(&mut next);
		next
	}

	pub fn with_select(&self, select: Select) -> Self {
		self.derive(|q| q.select = select)
	}

	pub fn with_where(&self, expression: Expression) -> Self {
		self.derive(|q| q.where_clause = expression)
	}

	/// AND `expression` onto the current where clause.
	pub fn and_where(&self, expression: Expression) -> Self {
		self.derive(|q| q.where_clause = q.where_clause.clone().and(expression))
	}

	pub fn with_group_by(&self, expressions: Vec<Expression>) -> Self {
		self.derive(|q| q.group_by = expressions)
	}

	pub fn add_group_by(&self, expression: Expression) -> Self {
		self.derive(|q| q.group_by.push(expression))
	}

	pub fn with_having(&self, expression: Expression) -> Self {
		self.derive(|q| q.having = expression)
	}

	pub fn and_having(&self, expression: Expression) -> Self {
		self.derive(|q| q.having = q.having.clone().and(expression))
	}

	pub fn with_order_by(&self, orderings: Vec<Ordering>) -> Self {
		self.derive(|q| q.order_by = orderings)
	}

	pub fn add_order_by(&self, ordering: Ordering) -> Self {
		self.derive(|q| q.order_by.push(ordering))
	}

	/// Request an eager fetch of `path`. Paths already requested are ignored.
	pub fn add_fetch(&self, path: FieldPath) -> Self {
		self.derive(|q| {
			if !q.fetch.contains(&path) {
				q.fetch.push(path);
			}
		})
	}

	pub fn with_offset(&self, offset: Option<u64>) -> Self {
		self.derive(|q| q.offset = offset)
	}

	pub fn with_limit(&self, limit: Option<u64>) -> Self {
		self.derive(|q| q.limit = limit)
	}

	pub fn with_lock_mode(&self, lock_mode: LockMode) -> Self {
		self.derive(|q| q.lock_mode = lock_mode)
	}

	// =========================================================================
	// Terminal derivations
	// =========================================================================

	/// Whether counting rows must wrap this query as a sub-query.
	///
	/// True when the select is distinct or holds an aggregate, when the
	/// having clause holds an aggregate, or when the query is grouped.
	pub fn requires_sub_query_count(&self) -> bool {
		self.select.distinct
			|| !self.group_by.is_empty()
			|| self.having.contains_aggregate()
			|| self
				.select
				.expressions()
				.iter()
				.any(Expression::contains_aggregate)
	}

	/// The query counting the rows this query would return, ignoring paging.
	pub fn count_query(&self) -> Self {
		if self.requires_sub_query_count() {
			return Self::from_sub_query(self.unpaged()).with_select(Select::scalar(count_one()));
		}
		self.derive(|q| {
			q.select = Select::scalar(count_one());
			q.order_by.clear();
			q.fetch.clear();
			q.offset = None;
			q.limit = None;
			q.lock_mode = LockMode::None;
		})
	}

	/// The query looking for at least one row past `offset`.
	///
	/// An offset of zero is normalized to no offset. Queries whose row count
	/// differs from their source's are wrapped as a sub-query first, so the
	/// offset skips the rows this query would actually return.
	pub fn exist_query(&self, offset: u64) -> Self {
		let source = if self.requires_sub_query_count() {
			Self::from_sub_query(self.unpaged())
		} else {
			self.clone()
		};
		source.derive(|q| {
			q.select = Select::scalar(Expression::constant(1));
			q.order_by.clear();
			q.fetch.clear();
			q.offset = (offset > 0).then_some(offset);
			q.limit = Some(1);
			q.lock_mode = LockMode::None;
		})
	}

	/// This query without ordering, fetches, paging or lock.
	fn unpaged(&self) -> Self {
		self.derive(|q| {
			q.order_by.clear();
			q.fetch.clear();
			q.offset = None;
			q.limit = None;
			q.lock_mode = LockMode::None;
		})
	}

	/// This query with paging and locking replaced.
	pub fn list_query(&self, offset: Option<u64>, limit: Option<u64>, lock_mode: LockMode) -> Self {
		self.derive(|q| {
			q.offset = offset;
			q.limit = limit;
			q.lock_mode = lock_mode;
		})
	}
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		write!(f, "{}", item)?;
	}
	Ok(())
}

impl fmt::Display for Select {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.distinct {
			f.write_str("distinct ")?;
		}
		match &self.selection {
			Selection::Entity => f.write_str("*"),
			Selection::Scalar(expr) => write!(f, "{}", expr),
			Selection::Tuple(exprs) => write_joined(f, exprs),
		}
	}
}

impl fmt::Display for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Source::Table(name) => f.write_str(name),
			Source::SubQuery(inner) => write!(f, "({})", inner),
		}
	}
}

impl fmt::Display for QueryStructure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "select {}", self.select)?;
		if !self.fetch.is_empty() {
			f.write_str(" fetch ")?;
			write_joined(f, &self.fetch)?;
		}
		write!(f, " from {}", self.source)?;
		if !self.where_clause.is_true_literal() {
			write!(f, " where {}", self.where_clause)?;
		}
		if !self.group_by.is_empty() {
			f.write_str(" group by ")?;
			write_joined(f, &self.group_by)?;
		}
		if !self.having.is_true_literal() {
			write!(f, " having {}", self.having)?;
		}
		if !self.order_by.is_empty() {
			f.write_str(" orderBy ")?;
			write_joined(f, &self.order_by)?;
		}
		if let Some(offset) = self.offset {
			write!(f, " offset {}", offset)?;
		}
		if let Some(limit) = self.limit {
			write!(f, " limit {}", limit)?;
		}
		if self.lock_mode != LockMode::None {
			write!(f, " lock({})", self.lock_mode)?;
		}
		Ok(())
	}
}
