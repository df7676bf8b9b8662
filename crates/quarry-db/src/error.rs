//! Error types for query building, execution and mutation.

use quarry_query::ExpressionError;

/// Errors raised by builders, executors and the mutation executor.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
	/// A builder method was called in a state that does not allow it
	#[error("Illegal state: {0}")]
	IllegalState(String),

	/// A versioned update matched no row
	#[error("Optimistic lock conflict on {table} (id = {id})")]
	OptimisticLock { table: String, id: String },

	/// An unversioned update matched no row
	#[error("Row not found in {table} (id = {id})")]
	NotFound { table: String, id: String },

	/// A mutation was attempted while auto-commit is enabled
	#[error("Mutations require an active transaction with auto-commit disabled")]
	TransactionRequired,

	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A result broke an invariant the caller relies on
	#[error("Invariant violation: {0}")]
	InvariantViolation(String),

	#[error("Expected at most one row, got {0}")]
	MultipleResults(usize),

	/// The backend cannot express the requested construct
	#[error("Unsupported: {0}")]
	Unsupported(String),

	/// The backend failed to run a statement
	#[error("Execution failed: {0}")]
	Execution(#[source] Box<dyn std::error::Error + Send + Sync>),

	#[error("Failed to decode row: {0}")]
	Decode(#[from] serde_json::Error),

	#[error(transparent)]
	Expression(#[from] ExpressionError),
}

impl QueryError {
	/// Wrap a backend failure.
	pub fn execution(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		Self::Execution(err.into())
	}

	pub fn illegal_state(message: impl Into<String>) -> Self {
		Self::IllegalState(message.into())
	}

	/// Whether this error reports a concurrent modification.
	pub fn is_optimistic_lock(&self) -> bool {
		matches!(self, Self::OptimisticLock { .. })
	}
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for QueryError {
	fn from(err: sqlx::Error) -> Self {
		Self::Execution(Box::new(err))
	}
}

pub type Result<T> = std::result::Result<T, QueryError>;
