//! Connection traits implemented by database adapters.

use async_trait::async_trait;
use quarry_query::Value;

use crate::error::Result;
use crate::orm::Row;
use crate::settings::Dialect;

/// A single database connection, either in auto-commit mode or inside a
/// transaction.
#[async_trait]
pub trait Connection: Send {
	fn dialect(&self) -> Dialect;

	/// `true` while the connection is inside an explicit transaction.
	fn is_auto_commit_disabled(&self) -> bool;

	/// Run a statement and return its rows.
	async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

	/// Run `sql` once per parameter set and return each affected row count,
	/// in order.
	async fn execute_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<Vec<u64>>;

	/// Like [`Connection::execute_batch`], returning the rows each execution
	/// produced (for example through `RETURNING`), in order.
	async fn fetch_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<Vec<Row>>;
}

/// Source of connections for read queries.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
	type Conn: Connection;

	async fn acquire(&self) -> Result<Self::Conn>;
}
