//! Batched inserts, optimistic-locking updates and deletes.

use quarry_query::Value;
use tracing::{debug, warn};

use super::mapping::{ColumnMapping, TableMapping};
use crate::backends::Connection;
use crate::error::{QueryError, Result};
use crate::orm::Model;
use crate::settings::{Dialect, QuarrySettings};

/// Numbers bind placeholders for one statement.
struct Placeholders {
	dialect: Dialect,
	next: usize,
}

impl Placeholders {
	fn new(dialect: Dialect) -> Self {
		Self { dialect, next: 0 }
	}

	fn next(&mut self) -> String {
		self.next += 1;
		self.dialect.placeholder(self.next)
	}
}

/// Runs entity writes on a caller-provided transactional connection.
///
/// Every operation refuses to run on a connection in auto-commit mode, so
/// a failed batch can always be rolled back as a whole by the caller.
#[derive(Debug, Clone, Default)]
pub struct MutationExecutor {
	settings: QuarrySettings,
}

impl MutationExecutor {
	pub fn new(settings: QuarrySettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &QuarrySettings {
		&self.settings
	}

	fn prepare<C: Connection + ?Sized>(&self, conn: &C) -> Result<Dialect> {
		if !conn.is_auto_commit_disabled() {
			return Err(QueryError::TransactionRequired);
		}
		if conn.dialect() != self.settings.dialect {
			return Err(QueryError::Configuration(format!(
				"connection speaks {:?} but settings expect {:?}",
				conn.dialect(),
				self.settings.dialect
			)));
		}
		Ok(self.settings.dialect)
	}

	fn log_statement(&self, sql: &str, rows: usize) {
		if self.settings.log_sql {
			debug!(sql = %sql, rows, "executing batch");
		}
	}

	/// Insert `entities`, in batches of `batch_size`.
	///
	/// Generated keys are read back in batch order and written into the
	/// entities. A null version is initialized to zero.
	pub async fn insert<C, E>(
		&self,
		conn: &mut C,
		mapping: &TableMapping<E>,
		entities: &mut [E],
	) -> Result<()>
	where
		C: Connection + ?Sized,
		E: Model,
	{
		let dialect = self.prepare(conn)?;
		let versioning = mapping.versioning()?;
		let generated = mapping.is_id_generated();
		if generated && !dialect.supports_returning() {
			return Err(QueryError::Unsupported(format!(
				"generated keys for {} need RETURNING, which {:?} lacks",
				mapping.table(),
				dialect
			)));
		}

		let columns = mapping.insert_columns();
		let mut placeholders = Placeholders::new(dialect);
		let mut sql = format!(
			"INSERT INTO {} ({}) VALUES ({})",
			dialect.quote_identifier(mapping.table()),
			columns
				.iter()
				.map(|c| dialect.quote_identifier(c.name()))
				.collect::<Vec<_>>()
				.join(", "),
			columns
				.iter()
				.map(|_| placeholders.next())
				.collect::<Vec<_>>()
				.join(", ")
		);
		if generated {
			sql.push_str(" RETURNING ");
			sql.push_str(&dialect.quote_identifier(mapping.id()?.name()));
		}

		let version_name = versioning.map(|(column, _)| column.name());
		for chunk in entities.chunks_mut(self.settings.batch_size.max(1)) {
			let batch: Vec<Vec<Value>> = chunk
				.iter()
				.map(|entity| {
					columns
						.iter()
						.map(|column| match (column.get(entity), versioning) {
							(Value::Null, Some((_, ty))) if Some(column.name()) == version_name => {
								ty.initial()
							}
							(value, _) => value,
						})
						.collect()
				})
				.collect();
			self.log_statement(&sql, batch.len());

			if generated {
				let keys = conn.fetch_batch(&sql, &batch).await?;
				if keys.len() != chunk.len() {
					return Err(QueryError::InvariantViolation(format!(
						"inserted {} rows into {} but read back {} keys",
						chunk.len(),
						mapping.table(),
						keys.len()
					)));
				}
				let id = mapping.id()?;
				for (entity, key) in chunk.iter_mut().zip(keys) {
					let value = key.value(0).cloned().ok_or_else(|| {
						QueryError::InvariantViolation("generated key row is empty".into())
					})?;
					id.set(entity, value)?;
				}
			} else {
				let counts = conn.execute_batch(&sql, &batch).await?;
				if counts.len() != chunk.len() || counts.iter().any(|&n| n != 1) {
					return Err(QueryError::InvariantViolation(format!(
						"insert into {} reported counts {:?}",
						mapping.table(),
						counts
					)));
				}
			}

			if let Some((column, ty)) = versioning {
				for entity in chunk.iter_mut() {
					if column.get(entity).is_null() {
						column.set(entity, ty.initial())?;
					}
				}
			}
		}
		Ok(())
	}

	/// Update all mapped columns of `entities` by primary key.
	///
	/// On a versioned table each statement also checks and bumps the
	/// version. In-memory versions only change once every row succeeded.
	///
	/// # Errors
	///
	/// - [`QueryError::OptimisticLock`] when a versioned row was not matched
	/// - [`QueryError::NotFound`] when an unversioned row was not matched
	/// - [`QueryError::InvariantViolation`] when a statement matched several rows
	pub async fn update<C, E>(
		&self,
		conn: &mut C,
		mapping: &TableMapping<E>,
		entities: &mut [E],
	) -> Result<()>
	where
		C: Connection + ?Sized,
		E: Model,
	{
		let dialect = self.prepare(conn)?;
		let versioning = mapping.versioning()?;
		let id = mapping.id()?;
		let columns: Vec<&ColumnMapping<E>> = mapping.columns().iter().collect();
		let sql = update_sql(dialect, mapping.table(), &columns, id, versioning.map(|(c, _)| c));

		let mut batch = Vec::with_capacity(entities.len());
		let mut next_versions = Vec::with_capacity(entities.len());
		for entity in entities.iter() {
			let mut params: Vec<Value> = columns.iter().map(|c| c.get(entity)).collect();
			if let Some((column, ty)) = versioning {
				let current = column.get(entity);
				let next = ty.increment(&current)?;
				params.push(next.clone());
				params.push(id.get(entity));
				params.push(current);
				next_versions.push(next);
			} else {
				params.push(id.get(entity));
			}
			batch.push(params);
		}

		for (chunk_idx, chunk) in batch.chunks(self.settings.batch_size.max(1)).enumerate() {
			self.log_statement(&sql, chunk.len());
			let counts = conn.execute_batch(&sql, chunk).await?;
			let base = chunk_idx * self.settings.batch_size.max(1);
			check_counts(
				mapping,
				&entities[base..base + chunk.len()],
				&counts,
				versioning.is_some(),
			)?;
		}

		if let Some((column, _)) = versioning {
			for (entity, next) in entities.iter_mut().zip(next_versions) {
				column.set(entity, next)?;
			}
		}
		Ok(())
	}

	/// Update only the non-null columns of `entity`.
	///
	/// Returns `false` without touching the database when every updatable
	/// column is null.
	///
	/// # Errors
	///
	/// [`QueryError::IllegalState`] when the table is versioned and the
	/// entity's version is null, otherwise as [`MutationExecutor::update`].
	pub async fn update_non_null_columns<C, E>(
		&self,
		conn: &mut C,
		mapping: &TableMapping<E>,
		entity: &mut E,
	) -> Result<bool>
	where
		C: Connection + ?Sized,
		E: Model,
	{
		let dialect = self.prepare(conn)?;
		let versioning = mapping.versioning()?;
		let id = mapping.id()?;

		let (columns, mut params): (Vec<&ColumnMapping<E>>, Vec<Value>) = mapping
			.columns()
			.iter()
			.map(|c| (c, c.get(entity)))
			.filter(|(_, value)| !value.is_null())
			.unzip();
		if columns.is_empty() {
			warn!(table = mapping.table(), "no non-null columns to update, skipping");
			return Ok(false);
		}

		let next_version = match versioning {
			Some((column, ty)) => {
				let current = column.get(entity);
				if current.is_null() {
					return Err(QueryError::illegal_state(format!(
						"version of {} row {} is null",
						mapping.table(),
						id.get(entity)
					)));
				}
				let next = ty.increment(&current)?;
				params.push(next.clone());
				params.push(id.get(entity));
				params.push(current);
				Some(next)
			}
			None => {
				params.push(id.get(entity));
				None
			}
		};

		let sql = update_sql(dialect, mapping.table(), &columns, id, versioning.map(|(c, _)| c));
		self.log_statement(&sql, 1);
		let counts = conn.execute_batch(&sql, &[params]).await?;
		check_counts(mapping, std::slice::from_ref(entity), &counts, versioning.is_some())?;

		if let (Some((column, _)), Some(next)) = (versioning, next_version) {
			column.set(entity, next)?;
		}
		Ok(true)
	}

	/// Delete `entities` by primary key and return the number of rows
	/// removed. Versions are not checked.
	pub async fn delete<C, E>(
		&self,
		conn: &mut C,
		mapping: &TableMapping<E>,
		entities: &[E],
	) -> Result<u64>
	where
		C: Connection + ?Sized,
		E: Model,
	{
		let dialect = self.prepare(conn)?;
		let id = mapping.id()?;
		let sql = format!(
			"DELETE FROM {} WHERE {} = {}",
			dialect.quote_identifier(mapping.table()),
			dialect.quote_identifier(id.name()),
			dialect.placeholder(1)
		);

		let mut total = 0;
		for chunk in entities.chunks(self.settings.batch_size.max(1)) {
			let batch: Vec<Vec<Value>> = chunk.iter().map(|e| vec![id.get(e)]).collect();
			self.log_statement(&sql, batch.len());
			total += conn.execute_batch(&sql, &batch).await?.iter().sum::<u64>();
		}
		Ok(total)
	}
}

fn update_sql<E>(
	dialect: Dialect,
	table: &str,
	columns: &[&ColumnMapping<E>],
	id: &ColumnMapping<E>,
	version: Option<&ColumnMapping<E>>,
) -> String {
	let mut placeholders = Placeholders::new(dialect);
	let mut assignments: Vec<String> = columns
		.iter()
		.map(|c| format!("{} = {}", dialect.quote_identifier(c.name()), placeholders.next()))
		.collect();
	if let Some(version) = version {
		assignments.push(format!(
			"{} = {}",
			dialect.quote_identifier(version.name()),
			placeholders.next()
		));
	}
	let mut sql = format!(
		"UPDATE {} SET {} WHERE {} = {}",
		dialect.quote_identifier(table),
		assignments.join(", "),
		dialect.quote_identifier(id.name()),
		placeholders.next()
	);
	if let Some(version) = version {
		sql.push_str(&format!(
			" AND {} = {}",
			dialect.quote_identifier(version.name()),
			placeholders.next()
		));
	}
	sql
}

fn check_counts<E>(
	mapping: &TableMapping<E>,
	entities: &[E],
	counts: &[u64],
	versioned: bool,
) -> Result<()> {
	if counts.len() != entities.len() {
		return Err(QueryError::InvariantViolation(format!(
			"sent {} statements to {} but got {} counts",
			entities.len(),
			mapping.table(),
			counts.len()
		)));
	}
	let id = mapping.id()?;
	for (entity, &count) in entities.iter().zip(counts) {
		match count {
			1 => {}
			0 if versioned => {
				return Err(QueryError::OptimisticLock {
					table: mapping.table().to_string(),
					id: id.get(entity).to_string(),
				});
			}
			0 => {
				return Err(QueryError::NotFound {
					table: mapping.table().to_string(),
					id: id.get(entity).to_string(),
				});
			}
			n => {
				return Err(QueryError::InvariantViolation(format!(
					"update of {} row {} matched {} rows",
					mapping.table(),
					id.get(entity),
					n
				)));
			}
		}
	}
	Ok(())
}
