//! Terminal operations: run a builder's structure and collect typed rows.

use quarry_query::{LockMode, QueryStructure};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::builder::QueryBuilder;
use super::executor::QueryExecutor;
use crate::error::{QueryError, Result};

/// One page of results together with the total row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice<T> {
	pub total: u64,
	pub offset: u64,
	pub limit: u64,
	pub data: Vec<T>,
}

impl<T> Slice<T> {
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Whether rows exist past this page.
	pub fn has_next(&self) -> bool {
		self.offset + (self.data.len() as u64) < self.total
	}
}

async fn collect<R, E>(executor: &E, query: &QueryStructure) -> Result<Vec<R>>
where
	R: DeserializeOwned,
	E: QueryExecutor + ?Sized,
{
	debug!(query = %query, "collecting rows");
	let selection = &query.select().selection;
	executor
		.get_list(query)
		.await?
		.iter()
		.map(|row| row.decode(selection))
		.collect()
}

impl<M, R: DeserializeOwned> QueryBuilder<M, R> {
	/// All rows, with the builder's own paging and lock.
	pub async fn list<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Vec<R>> {
		collect(executor, &self.structure()).await
	}

	/// Rows with paging and lock replaced.
	pub async fn get_list<E: QueryExecutor + ?Sized>(
		&self,
		executor: &E,
		offset: Option<u64>,
		limit: Option<u64>,
		lock_mode: LockMode,
	) -> Result<Vec<R>> {
		let query = self.structure().list_query(offset, limit, lock_mode);
		collect(executor, &query).await
	}

	/// The first row, if any.
	pub async fn first<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Option<R>> {
		let query = self.structure().with_limit(Some(1));
		Ok(collect(executor, &query).await?.into_iter().next())
	}

	/// The only row, if any.
	///
	/// # Errors
	///
	/// [`QueryError::MultipleResults`] when more than one row matches.
	pub async fn single<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<Option<R>> {
		let query = self.structure().with_limit(Some(2));
		let mut rows: Vec<R> = collect(executor, &query).await?;
		if rows.len() > 1 {
			return Err(QueryError::MultipleResults(rows.len()));
		}
		Ok(rows.pop())
	}
}

impl<M, R> QueryBuilder<M, R> {
	/// Whether at least one row exists past `offset`.
	pub async fn exist<E: QueryExecutor + ?Sized>(
		&self,
		executor: &E,
		offset: u64,
	) -> Result<bool> {
		let query = self.structure().exist_query(offset);
		debug!(query = %query, "checking for rows");
		Ok(!executor.get_list(&query).await?.is_empty())
	}

	/// Number of rows the query matches, ignoring paging.
	///
	/// # Errors
	///
	/// [`QueryError::InvariantViolation`] when the count query returns no
	/// row or a value that is not a non-negative integer.
	pub async fn count<E: QueryExecutor + ?Sized>(&self, executor: &E) -> Result<u64> {
		let query = self.structure().count_query();
		debug!(query = %query, "counting rows");
		let rows = executor.get_list(&query).await?;
		let value = rows
			.first()
			.and_then(|row| row.value(0))
			.ok_or_else(|| QueryError::InvariantViolation("count query returned no row".into()))?;
		value
			.as_i64()
			.and_then(|n| u64::try_from(n).ok())
			.ok_or_else(|| {
				QueryError::InvariantViolation(format!("count query returned {}", value))
			})
	}
}

impl<M, R: DeserializeOwned> QueryBuilder<M, R> {
	/// A page of `limit` rows starting at `offset`, with the total count.
	///
	/// The count runs first. When it shows that nothing lies past `offset`,
	/// the list query is skipped.
	pub async fn slice<E: QueryExecutor + ?Sized>(
		&self,
		executor: &E,
		offset: u64,
		limit: u64,
	) -> Result<Slice<R>> {
		let total = self.count(executor).await?;
		if total <= offset {
			debug!(total, offset, "page is past the end, skipping list query");
			return Ok(Slice {
				total,
				offset,
				limit,
				data: Vec::new(),
			});
		}
		let lock_mode = self.structure().lock_mode();
		let data = self
			.get_list(executor, Some(offset), Some(limit), lock_mode)
			.await?;
		Ok(Slice {
			total,
			offset,
			limit,
			data,
		})
	}
}
