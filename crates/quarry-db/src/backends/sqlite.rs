//! SQLite adapter built on sqlx.

use async_trait::async_trait;
use quarry_query::Value;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as SqlxRow, Sqlite, Transaction, TypeInfo, ValueRef};
use tracing::debug;

use super::connection::{Connection, ConnectionProvider};
use crate::error::{QueryError, Result};
use crate::orm::Row;
use crate::settings::{Dialect, QuarrySettings};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
	match value {
		Value::Null => query.bind(None::<i64>),
		Value::Bool(b) => query.bind(b),
		Value::Int(i) => query.bind(i),
		Value::BigInt(i) => query.bind(i),
		Value::Double(f) => query.bind(f),
		Value::String(s) => query.bind(s),
		Value::Bytes(b) => query.bind(b),
		Value::Timestamp(dt) => query.bind(dt),
		// stored as TEXT
		Value::Uuid(u) => query.bind(u.to_string()),
	}
}

fn bind_all<'q>(sql: &'q str, params: &'q [Value]) -> SqliteQuery<'q> {
	params
		.iter()
		.fold(sqlx::query(sql), |query, value| bind_value(query, value))
}

fn convert_row(sqlite_row: &SqliteRow) -> Result<Row> {
	let mut row = Row::default();
	for (idx, column) in sqlite_row.columns().iter().enumerate() {
		let raw = sqlite_row.try_get_raw(idx)?;
		if raw.is_null() {
			row.push(column.name(), Value::Null);
			continue;
		}
		// SQLite stores booleans as 0/1; only the declared type tells them apart.
		let declared = column.type_info().name().to_uppercase();
		let storage = raw.type_info().name().to_uppercase();
		let value = if declared.contains("BOOL") {
			Value::Bool(sqlite_row.try_get::<i64, _>(idx)? != 0)
		} else {
			match storage.as_str() {
				"INTEGER" => Value::BigInt(sqlite_row.try_get::<i64, _>(idx)?),
				"REAL" => Value::Double(sqlite_row.try_get::<f64, _>(idx)?),
				"BLOB" => Value::Bytes(sqlite_row.try_get::<Vec<u8>, _>(idx)?),
				_ => Value::String(sqlite_row.try_get::<String, _>(idx)?),
			}
		};
		row.push(column.name(), value);
	}
	Ok(row)
}

fn is_memory_url(url: &str) -> bool {
	url.contains(":memory:") || url.contains("mode=memory")
}

/// Pooled SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
	pool: SqlitePool,
}

impl SqliteProvider {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Open a pool for `url`.
	///
	/// An in-memory database lives only as long as its connection, so such
	/// pools hold exactly one connection that never expires.
	pub async fn connect(url: &str) -> Result<Self> {
		let options = if is_memory_url(url) {
			SqlitePoolOptions::new()
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
		} else {
			SqlitePoolOptions::new()
		};
		debug!(url, "opening sqlite pool");
		Ok(Self::new(options.connect(url).await?))
	}

	/// Open a pool from `database_url` in `settings`.
	pub async fn from_settings(settings: &QuarrySettings) -> Result<Self> {
		settings.validate()?;
		if settings.dialect != Dialect::Sqlite {
			return Err(QueryError::Configuration(format!(
				"settings target {:?}, not sqlite",
				settings.dialect
			)));
		}
		let url = settings
			.database_url
			.as_deref()
			.ok_or_else(|| QueryError::Configuration("database_url is not set".into()))?;
		Self::connect(url).await
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Start a transaction on a pooled connection.
	pub async fn begin(&self) -> Result<SqliteConnection> {
		Ok(SqliteConnection::Transaction(self.pool.begin().await?))
	}
}

#[async_trait]
impl ConnectionProvider for SqliteProvider {
	type Conn = SqliteConnection;

	async fn acquire(&self) -> Result<SqliteConnection> {
		Ok(SqliteConnection::Pooled(self.pool.acquire().await?))
	}
}

/// A pooled connection in auto-commit mode, or an open transaction.
pub enum SqliteConnection {
	Pooled(PoolConnection<Sqlite>),
	Transaction(Transaction<'static, Sqlite>),
}

impl SqliteConnection {
	fn raw(&mut self) -> &mut sqlx::SqliteConnection {
		match self {
			Self::Pooled(conn) => &mut **conn,
			Self::Transaction(tx) => &mut **tx,
		}
	}

	/// Run a statement that needs no parameters, such as DDL.
	pub async fn execute_raw(&mut self, sql: &str) -> Result<u64> {
		Ok(sqlx::query(sql).execute(self.raw()).await?.rows_affected())
	}

	pub async fn commit(self) -> Result<()> {
		match self {
			Self::Transaction(tx) => Ok(tx.commit().await?),
			Self::Pooled(_) => Err(QueryError::illegal_state("commit outside a transaction")),
		}
	}

	pub async fn rollback(self) -> Result<()> {
		match self {
			Self::Transaction(tx) => Ok(tx.rollback().await?),
			Self::Pooled(_) => Err(QueryError::illegal_state("rollback outside a transaction")),
		}
	}
}

#[async_trait]
impl Connection for SqliteConnection {
	fn dialect(&self) -> Dialect {
		Dialect::Sqlite
	}

	fn is_auto_commit_disabled(&self) -> bool {
		matches!(self, Self::Transaction(_))
	}

	async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
		let rows = bind_all(sql, params).fetch_all(self.raw()).await?;
		rows.iter().map(convert_row).collect()
	}

	async fn execute_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<Vec<u64>> {
		let mut counts = Vec::with_capacity(batch.len());
		for params in batch {
			let result = bind_all(sql, params).execute(self.raw()).await?;
			counts.push(result.rows_affected());
		}
		Ok(counts)
	}

	async fn fetch_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<Vec<Row>> {
		let mut rows = Vec::with_capacity(batch.len());
		for params in batch {
			for row in bind_all(sql, params).fetch_all(self.raw()).await? {
				rows.push(convert_row(&row)?);
			}
		}
		Ok(rows)
	}
}
