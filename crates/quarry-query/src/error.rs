//! Errors raised while constructing expressions.

/// Errors that can occur while building expression trees
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
	/// A field path needs at least one field name
	#[error("Field path must contain at least one field name")]
	EmptyPath,
}
