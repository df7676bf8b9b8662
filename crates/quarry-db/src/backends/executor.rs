//! [`QueryExecutor`] implementations over SQL connections.

use async_trait::async_trait;
use quarry_query::QueryStructure;
use tokio::sync::Mutex;
use tracing::debug;

use super::connection::{Connection, ConnectionProvider};
use super::sql::SqlRenderer;
use crate::error::{QueryError, Result};
use crate::orm::{QueryExecutor, Row};
use crate::settings::QuarrySettings;

fn check_dialect<C: Connection + ?Sized>(conn: &C, renderer: &SqlRenderer) -> Result<()> {
	if conn.dialect() != renderer.dialect() {
		return Err(QueryError::Configuration(format!(
			"connection speaks {:?} but queries are rendered for {:?}",
			conn.dialect(),
			renderer.dialect()
		)));
	}
	Ok(())
}

/// Renders each query and runs it on a freshly acquired connection.
pub struct SqlQueryExecutor<P> {
	provider: P,
	renderer: SqlRenderer,
	log_sql: bool,
}

impl<P: ConnectionProvider> SqlQueryExecutor<P> {
	pub fn new(provider: P, settings: &QuarrySettings) -> Self {
		Self {
			provider,
			renderer: SqlRenderer::new(settings.dialect),
			log_sql: settings.log_sql,
		}
	}

	pub fn provider(&self) -> &P {
		&self.provider
	}
}

#[async_trait]
impl<P: ConnectionProvider> QueryExecutor for SqlQueryExecutor<P> {
	async fn get_list(&self, query: &QueryStructure) -> Result<Vec<Row>> {
		let (sql, params) = self.renderer.render(query)?;
		if self.log_sql {
			debug!(sql = %sql, params = params.len(), "running query");
		}
		let mut conn = self.provider.acquire().await?;
		check_dialect(&conn, &self.renderer)?;
		conn.query(&sql, &params).await
	}
}

/// Runs queries on one borrowed connection, typically a transaction, so
/// reads see the caller's uncommitted writes.
pub struct ConnectionExecutor<C> {
	conn: Mutex<C>,
	renderer: SqlRenderer,
	log_sql: bool,
}

impl<C: Connection> ConnectionExecutor<C> {
	pub fn new(conn: C, settings: &QuarrySettings) -> Self {
		Self {
			conn: Mutex::new(conn),
			renderer: SqlRenderer::new(settings.dialect),
			log_sql: settings.log_sql,
		}
	}

	/// Exclusive access to the connection, for writes between reads.
	pub async fn connection(&self) -> tokio::sync::MutexGuard<'_, C> {
		self.conn.lock().await
	}

	pub fn into_inner(self) -> C {
		self.conn.into_inner()
	}
}

#[async_trait]
impl<C: Connection> QueryExecutor for ConnectionExecutor<C> {
	async fn get_list(&self, query: &QueryStructure) -> Result<Vec<Row>> {
		let (sql, params) = self.renderer.render(query)?;
		if self.log_sql {
			debug!(sql = %sql, params = params.len(), "running query");
		}
		let mut conn = self.conn.lock().await;
		check_dialect(&*conn, &self.renderer)?;
		conn.query(&sql, &params).await
	}
}
