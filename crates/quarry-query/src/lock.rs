//! Lock modes a query may request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Row locking requested by a query.
///
/// Optimistic modes are enforced by the mutation layer through version
/// columns; pessimistic modes are rendered as row locks by backends that
/// support them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockMode {
	#[default]
	None,
	Optimistic,
	OptimisticForceIncrement,
	PessimisticRead,
	PessimisticWrite,
	PessimisticForceIncrement,
}

impl LockMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::None => "NONE",
			Self::Optimistic => "OPTIMISTIC",
			Self::OptimisticForceIncrement => "OPTIMISTIC_FORCE_INCREMENT",
			Self::PessimisticRead => "PESSIMISTIC_READ",
			Self::PessimisticWrite => "PESSIMISTIC_WRITE",
			Self::PessimisticForceIncrement => "PESSIMISTIC_FORCE_INCREMENT",
		}
	}

	/// Whether this mode asks the backend for a row lock.
	pub fn is_pessimistic(&self) -> bool {
		matches!(
			self,
			Self::PessimisticRead | Self::PessimisticWrite | Self::PessimisticForceIncrement
		)
	}
}

impl fmt::Display for LockMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
