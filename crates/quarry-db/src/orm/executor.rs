//! The boundary between query structures and whatever runs them.

use async_trait::async_trait;
use quarry_query::{QueryStructure, Selection, Value};
use serde::de::DeserializeOwned;

use crate::error::{QueryError, Result};

/// Runs a [`QueryStructure`] and returns its raw rows.
///
/// Implementations decide how the structure is executed: the SQL executor
/// renders it, the memory executor evaluates it directly.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
	async fn get_list(&self, query: &QueryStructure) -> Result<Vec<Row>>;
}

/// One result row with ordered, named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
	columns: Vec<String>,
	values: Vec<Value>,
}

impl Row {
	pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
		Self { columns, values }
	}

	pub fn push(&mut self, column: impl Into<String>, value: Value) {
		self.columns.push(column.into());
		self.values.push(value);
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn values(&self) -> &[Value] {
		&self.values
	}

	/// Value of the first column named `column`.
	pub fn get(&self, column: &str) -> Option<&Value> {
		self.columns
			.iter()
			.position(|c| c == column)
			.and_then(|idx| self.values.get(idx))
	}

	pub fn value(&self, idx: usize) -> Option<&Value> {
		self.values.get(idx)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Decode this row according to the selection that produced it.
	///
	/// Entities are decoded from a JSON object keyed by column name, scalars
	/// from the first column, and tuples from a JSON array.
	///
	/// # Errors
	///
	/// [`QueryError::InvariantViolation`] when a scalar row has no column,
	/// [`QueryError::Decode`] when the values do not fit `T`.
	pub fn decode<T: DeserializeOwned>(&self, selection: &Selection) -> Result<T> {
		let json = match selection {
			Selection::Entity => serde_json::Value::Object(
				self.columns
					.iter()
					.cloned()
					.zip(self.values.iter().map(Value::to_json))
					.collect(),
			),
			Selection::Scalar(_) => self
				.values
				.first()
				.map(Value::to_json)
				.ok_or_else(|| QueryError::InvariantViolation("scalar row has no column".into()))?,
			Selection::Tuple(_) => {
				serde_json::Value::Array(self.values.iter().map(Value::to_json).collect())
			}
		};
		Ok(serde_json::from_value(json)?)
	}
}
