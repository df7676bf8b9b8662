//! Scalar values carried by constants and bind parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// A scalar value.
///
/// Values appear as [`Expression::Constant`](crate::Expression::Constant)
/// leaves and as bind parameters produced by renderers.
///
/// ## Example
///
/// ```rust
/// use quarry_query::Value;
///
/// assert_eq!(Value::from(42).to_sql_literal(), "42");
/// assert_eq!(Value::from("it's").to_sql_literal(), "'it''s'");
/// assert_eq!(Value::from(None::<i32>), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Null,
	Bool(bool),
	/// 32-bit signed integer
	Int(i32),
	/// 64-bit signed integer
	BigInt(i64),
	Double(f64),
	String(String),
	Bytes(Vec<u8>),
	Timestamp(DateTime<Utc>),
	Uuid(Uuid),
}

impl Value {
	/// Returns `true` if this value is null.
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Widen any integer variant to `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(i64::from(*v)),
			Self::BigInt(v) => Some(*v),
			_ => None,
		}
	}

	/// Numeric view used for cross-type comparisons and arithmetic.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Int(v) => Some(f64::from(*v)),
			Self::BigInt(v) => Some(*v as f64),
			Self::Double(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(v) => Some(v),
			_ => None,
		}
	}

	/// Compare two values with SQL-like semantics.
	///
	/// Integers and doubles compare numerically across variants. `NULL`
	/// compares to nothing, and mismatched kinds are incomparable.
	pub fn compare(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Self::Null, _) | (_, Self::Null) => None,
			(Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
			(Self::String(a), Self::String(b)) => Some(a.cmp(b)),
			(Self::Bytes(a), Self::Bytes(b)) => Some(a.cmp(b)),
			(Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
			(Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
			(a, b) => match (a.as_i64(), b.as_i64()) {
				(Some(x), Some(y)) => Some(x.cmp(&y)),
				_ => a.as_f64()?.partial_cmp(&b.as_f64()?),
			},
		}
	}

	/// Convert this value to a SQL literal suitable for inlining into
	/// debug output.
	#[must_use]
	pub fn to_sql_literal(&self) -> String {
		match self {
			Self::Null => "NULL".to_string(),
			Self::Bool(true) => "TRUE".to_string(),
			Self::Bool(false) => "FALSE".to_string(),
			Self::Int(v) => v.to_string(),
			Self::BigInt(v) => v.to_string(),
			Self::Double(v) => v.to_string(),
			// Escape single quotes by doubling them
			Self::String(v) => format!("'{}'", v.replace('\'', "''")),
			Self::Bytes(v) => {
				let hex: String = v.iter().map(|b| format!("{:02X}", b)).collect();
				format!("X'{}'", hex)
			}
			Self::Timestamp(v) => format!("'{}'", v.to_rfc3339()),
			Self::Uuid(v) => format!("'{}'", v),
		}
	}

	/// Convert a JSON scalar. Integers become [`Value::BigInt`]; arrays and
	/// objects are kept as their JSON text.
	pub fn from_json(json: &serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(v) => Self::Bool(*v),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Self::BigInt(i),
				None => n.as_f64().map_or(Self::Null, Self::Double),
			},
			serde_json::Value::String(v) => Self::String(v.clone()),
			other => Self::String(other.to_string()),
		}
	}

	/// JSON view used when decoding rows into typed results.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::Null => serde_json::Value::Null,
			Self::Bool(v) => serde_json::Value::Bool(*v),
			Self::Int(v) => serde_json::Value::from(*v),
			Self::BigInt(v) => serde_json::Value::from(*v),
			Self::Double(v) => serde_json::Number::from_f64(*v)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			Self::String(v) => serde_json::Value::String(v.clone()),
			Self::Bytes(v) => serde_json::Value::from(v.clone()),
			Self::Timestamp(v) => serde_json::Value::String(v.to_rfc3339()),
			Self::Uuid(v) => serde_json::Value::String(v.to_string()),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_sql_literal())
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Self::Int(i)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::BigInt(i)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Self::Double(f)
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::String(s)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::String(s.to_string())
	}
}

impl From<Vec<u8>> for Value {
	fn from(b: Vec<u8>) -> Self {
		Self::Bytes(b)
	}
}

impl From<DateTime<Utc>> for Value {
	fn from(dt: DateTime<Utc>) -> Self {
		Self::Timestamp(dt)
	}
}

impl From<Uuid> for Value {
	fn from(u: Uuid) -> Self {
		Self::Uuid(u)
	}
}

impl<T> From<Option<T>> for Value
where
	T: Into<Value>,
{
	fn from(v: Option<T>) -> Self {
		v.map_or(Self::Null, Into::into)
	}
}
