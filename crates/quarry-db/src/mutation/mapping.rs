//! Entity to table mappings used by the mutation executor.

use std::fmt;
use std::sync::Arc;

use quarry_query::Value;
use serde::de::DeserializeOwned;

use crate::error::{QueryError, Result};
use crate::orm::{Field, Model, PropertyMeta};

/// Reads a column value out of an entity.
pub type Getter<E> = fn(&E) -> Value;

/// Writes a column value (a generated key, a new version) into an entity.
pub type Setter<E> = fn(&mut E, Value) -> Result<()>;

/// Decode a column value into a Rust type, for use inside setters.
///
/// ```
/// use quarry_db::mutation::decode_value;
/// use quarry_query::Value;
///
/// let id: Option<i64> = decode_value(Value::BigInt(3)).unwrap();
/// assert_eq!(id, Some(3));
/// ```
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T> {
	Ok(serde_json::from_value(value.to_json())?)
}

/// A single mapped column.
pub struct ColumnMapping<E> {
	meta: Arc<PropertyMeta>,
	getter: Getter<E>,
	setter: Setter<E>,
}

impl<E: 'static> ColumnMapping<E> {
	pub fn new<T: 'static>(field: Field<E, T>, getter: Getter<E>, setter: Setter<E>) -> Self {
		Self {
			meta: field.meta(),
			getter,
			setter,
		}
	}
}

impl<E> ColumnMapping<E> {
	pub fn name(&self) -> &'static str {
		self.meta.name
	}

	pub fn meta(&self) -> &PropertyMeta {
		&self.meta
	}

	pub fn get(&self, entity: &E) -> Value {
		(self.getter)(entity)
	}

	pub fn set(&self, entity: &mut E, value: Value) -> Result<()> {
		(self.setter)(entity, value)
	}
}

impl<E> Clone for ColumnMapping<E> {
	fn clone(&self) -> Self {
		Self {
			meta: Arc::clone(&self.meta),
			getter: self.getter,
			setter: self.setter,
		}
	}
}

impl<E> fmt::Debug for ColumnMapping<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ColumnMapping")
			.field("name", &self.meta.name)
			.field("value_type", &self.meta.value_type)
			.finish()
	}
}

/// Integer width of a version column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionType {
	Int,
	Long,
}

impl VersionType {
	/// Derive the version type from a column's declared value type.
	///
	/// # Errors
	///
	/// [`QueryError::Configuration`] for anything but `i32`, `i64` or their
	/// `Option` forms.
	pub fn of(meta: &PropertyMeta) -> Result<Self> {
		if meta.is::<i32>() || meta.is::<Option<i32>>() {
			Ok(Self::Int)
		} else if meta.is::<i64>() || meta.is::<Option<i64>>() {
			Ok(Self::Long)
		} else {
			Err(QueryError::Configuration(format!(
				"version column `{}` has unsupported type {}",
				meta.name, meta.value_type
			)))
		}
	}

	/// Version assigned on insert when the entity carries none.
	pub fn initial(&self) -> Value {
		match self {
			Self::Int => Value::Int(0),
			Self::Long => Value::BigInt(0),
		}
	}

	/// The version following `current`.
	///
	/// # Errors
	///
	/// [`QueryError::IllegalState`] when `current` is null,
	/// [`QueryError::InvariantViolation`] when it is not an integer or the
	/// increment overflows.
	pub fn increment(&self, current: &Value) -> Result<Value> {
		if current.is_null() {
			return Err(QueryError::illegal_state("version is null"));
		}
		let n = current.as_i64().ok_or_else(|| {
			QueryError::InvariantViolation(format!("version {} is not an integer", current))
		})?;
		let next = match self {
			Self::Int => i32::try_from(n)
				.ok()
				.and_then(|v| v.checked_add(1))
				.map(Value::Int),
			Self::Long => n.checked_add(1).map(Value::BigInt),
		};
		next.ok_or_else(|| QueryError::InvariantViolation(format!("version {} overflows", n)))
	}
}

/// How an entity type maps onto its table.
///
/// ```
/// use quarry_db::mutation::{TableMapping, decode_value};
/// use quarry_db::orm::{Field, Model};
/// use quarry_query::Value;
///
/// struct Note {
///     id: Option<i64>,
///     body: String,
///     version: i32,
/// }
///
/// impl Note {
///     const ID: Field<Note, Option<i64>> = Field::new("id");
///     const BODY: Field<Note, String> = Field::new("body");
///     const VERSION: Field<Note, i32> = Field::new("version");
/// }
///
/// impl Model for Note {
///     fn table_name() -> &'static str { "notes" }
/// }
///
/// let mapping = TableMapping::<Note>::new()
///     .generated_id(Note::ID, |n| Value::from(n.id), |n, v| {
///         n.id = decode_value(v)?;
///         Ok(())
///     })
///     .column(Note::BODY, |n| Value::from(n.body.clone()), |n, v| {
///         n.body = decode_value(v)?;
///         Ok(())
///     })
///     .version(Note::VERSION, |n| Value::from(n.version), |n, v| {
///         n.version = decode_value(v)?;
///         Ok(())
///     });
///
/// assert_eq!(mapping.table(), "notes");
/// assert!(mapping.is_id_generated());
/// assert_eq!(mapping.columns().len(), 1);
/// ```
pub struct TableMapping<E> {
	table: &'static str,
	id: Option<ColumnMapping<E>>,
	id_generated: bool,
	columns: Vec<ColumnMapping<E>>,
	version: Option<ColumnMapping<E>>,
}

impl<E: Model> TableMapping<E> {
	pub fn new() -> Self {
		Self {
			table: E::table_name(),
			id: None,
			id_generated: false,
			columns: Vec::new(),
			version: None,
		}
	}

	/// Identity column whose value the database assigns on insert.
	pub fn generated_id<T: 'static>(
		mut self,
		field: Field<E, T>,
		getter: Getter<E>,
		setter: Setter<E>,
	) -> Self {
		self.id = Some(ColumnMapping::new(field, getter, setter));
		self.id_generated = true;
		self
	}

	/// Identity column whose value the entity carries.
	pub fn assigned_id<T: 'static>(
		mut self,
		field: Field<E, T>,
		getter: Getter<E>,
		setter: Setter<E>,
	) -> Self {
		self.id = Some(ColumnMapping::new(field, getter, setter));
		self.id_generated = false;
		self
	}

	/// An updatable column.
	pub fn column<T: 'static>(
		mut self,
		field: Field<E, T>,
		getter: Getter<E>,
		setter: Setter<E>,
	) -> Self {
		self.columns.push(ColumnMapping::new(field, getter, setter));
		self
	}

	/// The optimistic-lock version column.
	pub fn version<T: 'static>(
		mut self,
		field: Field<E, T>,
		getter: Getter<E>,
		setter: Setter<E>,
	) -> Self {
		self.version = Some(ColumnMapping::new(field, getter, setter));
		self
	}
}

impl<E: Model> Default for TableMapping<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E> TableMapping<E> {
	pub fn table(&self) -> &'static str {
		self.table
	}

	/// The identity column.
	///
	/// # Errors
	///
	/// [`QueryError::Configuration`] when no identity column was mapped.
	pub fn id(&self) -> Result<&ColumnMapping<E>> {
		self.id.as_ref().ok_or_else(|| {
			QueryError::Configuration(format!("no identity column mapped for {}", self.table))
		})
	}

	pub fn is_id_generated(&self) -> bool {
		self.id.is_some() && self.id_generated
	}

	/// Updatable columns, excluding identity and version.
	pub fn columns(&self) -> &[ColumnMapping<E>] {
		&self.columns
	}

	pub fn version_column(&self) -> Option<&ColumnMapping<E>> {
		self.version.as_ref()
	}

	/// The version column with its integer width.
	pub fn versioning(&self) -> Result<Option<(&ColumnMapping<E>, VersionType)>> {
		self.version
			.as_ref()
			.map(|column| VersionType::of(column.meta()).map(|ty| (column, ty)))
			.transpose()
	}

	/// Columns written by an insert: an assigned identity, the updatable
	/// columns, then the version.
	pub fn insert_columns(&self) -> Vec<&ColumnMapping<E>> {
		let id = self.id.as_ref().filter(|_| !self.id_generated);
		id.into_iter()
			.chain(self.columns.iter())
			.chain(self.version.iter())
			.collect()
	}
}

impl<E> fmt::Debug for TableMapping<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TableMapping")
			.field("table", &self.table)
			.field("id", &self.id)
			.field("id_generated", &self.id_generated)
			.field("columns", &self.columns)
			.field("version", &self.version)
			.finish()
	}
}
