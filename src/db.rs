//! Typed builders, executors and mutations.

pub use quarry_db::*;
