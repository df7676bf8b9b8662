//! Typed, fluent query building.
//!
//! - [`Model`]: a record type bound to a table
//! - [`Field`] and [`Typed`]: compile-time field selectors and typed expressions
//! - [`QueryBuilder`]: copy-on-write builder producing [`QueryStructure`] snapshots
//! - [`Stage`] and [`Predicate`]: the operator stages of a filter chain
//! - [`QueryExecutor`]: the boundary backends implement
//!
//! [`QueryStructure`]: quarry_query::QueryStructure

mod builder;
mod collector;
mod executor;
mod fields;
mod model;
pub mod property;
mod stage;

pub use builder::{BuilderHost, Clause, FilterStage, Projection, QueryBuilder};
pub use collector::Slice;
pub use executor::{QueryExecutor, Row};
pub use fields::{Comparable, Field, IntoOperand, NumericType, Selector, StringType, Typed};
pub use model::Model;
pub use property::PropertyMeta;
pub use stage::{Metadata, Predicate, PredicateHost, Stage, StageHost};
