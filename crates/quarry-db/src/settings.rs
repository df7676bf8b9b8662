//! Runtime settings.
//!
//! Settings are plain serde structs, usually loaded from a TOML file:
//!
//! ```toml
//! dialect = "postgres"
//! batch_size = 500
//! database_url = "postgres://localhost/app"
//! log_sql = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

/// SQL dialect spoken by the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
	Postgres,
	Mysql,
	#[default]
	Sqlite,
}

impl Dialect {
	/// Bind placeholder for the 1-based parameter `index`.
	pub fn placeholder(&self, index: usize) -> String {
		match self {
			Self::Postgres => format!("${}", index),
			Self::Mysql | Self::Sqlite => "?".to_string(),
		}
	}

	/// Quote an identifier, doubling any embedded quote character.
	pub fn quote_identifier(&self, name: &str) -> String {
		match self {
			Self::Mysql => format!("`{}`", name.replace('`', "``")),
			Self::Postgres | Self::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
		}
	}

	/// Whether `INSERT ... RETURNING` is available.
	pub fn supports_returning(&self) -> bool {
		!matches!(self, Self::Mysql)
	}
}

fn default_batch_size() -> usize {
	1000
}

fn default_log_sql() -> bool {
	true
}

/// Settings shared by renderers, executors and the mutation executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarrySettings {
	#[serde(default)]
	pub dialect: Dialect,

	/// Maximum number of rows per insert statement
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,

	#[serde(default)]
	pub database_url: Option<String>,

	/// Emit rendered statements at debug level
	#[serde(default = "default_log_sql")]
	pub log_sql: bool,
}

impl Default for QuarrySettings {
	fn default() -> Self {
		Self {
			dialect: Dialect::default(),
			batch_size: default_batch_size(),
			database_url: None,
			log_sql: default_log_sql(),
		}
	}
}

impl QuarrySettings {
	pub fn new(dialect: Dialect) -> Self {
		Self {
			dialect,
			..Self::default()
		}
	}

	pub fn with_batch_size(mut self, batch_size: usize) -> Self {
		self.batch_size = batch_size;
		self
	}

	pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
		self.database_url = Some(url.into());
		self
	}

	/// Parse and validate settings from TOML text.
	///
	/// # Examples
	///
	/// ```
	/// use quarry_db::settings::{Dialect, QuarrySettings};
	///
	/// let settings = QuarrySettings::from_toml_str("dialect = \"postgres\"").unwrap();
	/// assert_eq!(settings.dialect, Dialect::Postgres);
	/// assert_eq!(settings.batch_size, 1000);
	/// assert!(settings.log_sql);
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let settings: Self = toml::from_str(source)
			.map_err(|e| QueryError::Configuration(format!("invalid settings: {}", e)))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Read, parse and validate a TOML settings file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|e| {
			QueryError::Configuration(format!("cannot read {}: {}", path.display(), e))
		})?;
		Self::from_toml_str(&source)
	}

	pub fn validate(&self) -> Result<()> {
		if self.batch_size == 0 {
			return Err(QueryError::Configuration(
				"batch_size must be greater than zero".to_string(),
			));
		}
		if let Some(url) = &self.database_url
			&& url.trim().is_empty()
		{
			return Err(QueryError::Configuration(
				"database_url must not be blank".to_string(),
			));
		}
		Ok(())
	}
}
