//! Reference SQL rendering of query structures.

use quarry_query::{
	Direction, Expression, LockMode, Notation, Operation, Operator, QueryStructure, Selection,
	Source, Value,
};
use tracing::warn;

use crate::error::{QueryError, Result};
use crate::settings::Dialect;

/// Accumulates SQL text and bind parameters.
#[derive(Debug)]
struct SqlWriter {
	dialect: Dialect,
	sql: String,
	values: Vec<Value>,
	aliases: usize,
}

impl SqlWriter {
	fn new(dialect: Dialect) -> Self {
		Self {
			dialect,
			sql: String::new(),
			values: Vec::new(),
			aliases: 0,
		}
	}

	fn push(&mut self, s: &str) {
		self.sql.push_str(s);
	}

	fn push_identifier(&mut self, ident: &str) {
		let quoted = self.dialect.quote_identifier(ident);
		self.sql.push_str(&quoted);
	}

	/// NULL, booleans and integers are inlined; everything else is bound.
	fn push_value(&mut self, value: &Value) {
		match value {
			Value::Null | Value::Bool(_) | Value::Int(_) | Value::BigInt(_) => {
				self.sql.push_str(&value.to_sql_literal());
			}
			other => {
				self.values.push(other.clone());
				let placeholder = self.dialect.placeholder(self.values.len());
				self.sql.push_str(&placeholder);
			}
		}
	}

	fn next_alias(&mut self) -> String {
		let alias = format!("q{}", self.aliases);
		self.aliases += 1;
		alias
	}
}

/// Renders [`QueryStructure`]s into parameterized SQL for one dialect.
///
/// ```
/// use quarry_db::backends::SqlRenderer;
/// use quarry_db::settings::Dialect;
/// use quarry_query::prelude::*;
///
/// let name = Expression::path_of(["name"]).unwrap();
/// let query = QueryStructure::from_table("users")
///     .and_where(Expression::operate(name, Operator::Eq, vec![Expression::constant("ann")]))
///     .with_limit(Some(10));
///
/// let (sql, params) = SqlRenderer::new(Dialect::Postgres).render(&query).unwrap();
/// assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"name\" = $1 LIMIT 10");
/// assert_eq!(params, vec![Value::from("ann")]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer {
	dialect: Dialect,
}

impl SqlRenderer {
	pub fn new(dialect: Dialect) -> Self {
		Self { dialect }
	}

	pub fn dialect(&self) -> Dialect {
		self.dialect
	}

	/// Render `query` to SQL text and its bind parameters.
	///
	/// # Errors
	///
	/// [`QueryError::Unsupported`] for eager fetches and multi-segment field
	/// paths, which need join strategies this renderer does not have.
	pub fn render(&self, query: &QueryStructure) -> Result<(String, Vec<Value>)> {
		let mut writer = SqlWriter::new(self.dialect);
		self.write_query(&mut writer, query)?;
		Ok((writer.sql, writer.values))
	}

	/// Render a single expression.
	pub fn render_expression(&self, expression: &Expression) -> Result<(String, Vec<Value>)> {
		let mut writer = SqlWriter::new(self.dialect);
		self.write_expression(&mut writer, expression)?;
		Ok((writer.sql, writer.values))
	}

	fn write_query(&self, w: &mut SqlWriter, query: &QueryStructure) -> Result<()> {
		if !query.fetch().is_empty() {
			return Err(QueryError::Unsupported(format!(
				"eager fetch of {} paths",
				query.fetch().len()
			)));
		}

		w.push("SELECT ");
		if query.select().distinct {
			w.push("DISTINCT ");
		}
		match &query.select().selection {
			Selection::Entity => w.push("*"),
			Selection::Scalar(expr) => self.write_expression(w, expr)?,
			Selection::Tuple(exprs) => self.write_list(w, exprs)?,
		}

		w.push(" FROM ");
		match query.source() {
			Source::Table(table) => w.push_identifier(table),
			Source::SubQuery(inner) => {
				let alias = w.next_alias();
				w.push("(");
				self.write_query(w, inner)?;
				w.push(") AS ");
				w.push_identifier(&alias);
			}
		}

		if !query.where_clause().is_true_literal() {
			w.push(" WHERE ");
			self.write_expression(w, query.where_clause())?;
		}
		if !query.group_by().is_empty() {
			w.push(" GROUP BY ");
			self.write_list(w, query.group_by())?;
		}
		if !query.having().is_true_literal() {
			w.push(" HAVING ");
			self.write_expression(w, query.having())?;
		}
		if !query.order_by().is_empty() {
			w.push(" ORDER BY ");
			for (i, ordering) in query.order_by().iter().enumerate() {
				if i > 0 {
					w.push(", ");
				}
				self.write_expression(w, ordering.expression())?;
				w.push(match ordering.direction() {
					Direction::Asc => " ASC",
					Direction::Desc => " DESC",
				});
			}
		}

		self.write_paging(w, query.offset(), query.limit());
		self.write_lock(w, query.lock_mode());
		Ok(())
	}

	fn write_paging(&self, w: &mut SqlWriter, offset: Option<u64>, limit: Option<u64>) {
		match (limit, offset) {
			(Some(limit), _) => w.push(&format!(" LIMIT {}", limit)),
			// OFFSET alone is not valid on SQLite and MySQL
			(None, Some(_)) => match self.dialect {
				Dialect::Sqlite => w.push(" LIMIT -1"),
				Dialect::Mysql => w.push(" LIMIT 18446744073709551615"),
				Dialect::Postgres => {}
			},
			(None, None) => {}
		}
		if let Some(offset) = offset {
			w.push(&format!(" OFFSET {}", offset));
		}
	}

	fn write_lock(&self, w: &mut SqlWriter, lock_mode: LockMode) {
		if !lock_mode.is_pessimistic() {
			return;
		}
		if self.dialect == Dialect::Sqlite {
			warn!(lock_mode = %lock_mode, "SQLite has no row locks, ignoring lock mode");
			return;
		}
		match lock_mode {
			LockMode::PessimisticRead => w.push(" FOR SHARE"),
			_ => w.push(" FOR UPDATE"),
		}
	}

	fn write_list(&self, w: &mut SqlWriter, exprs: &[Expression]) -> Result<()> {
		for (i, expr) in exprs.iter().enumerate() {
			if i > 0 {
				w.push(", ");
			}
			self.write_expression(w, expr)?;
		}
		Ok(())
	}

	fn write_expression(&self, w: &mut SqlWriter, expression: &Expression) -> Result<()> {
		match expression {
			Expression::Constant(value) => {
				w.push_value(value);
				Ok(())
			}
			Expression::Path(path) => {
				if path.len() > 1 {
					return Err(QueryError::Unsupported(format!(
						"nested path `{}` needs a join",
						path
					)));
				}
				w.push_identifier(path.leaf());
				Ok(())
			}
			Expression::Operation(op) => self.write_operation(w, op),
		}
	}

	fn write_child(
		&self,
		w: &mut SqlWriter,
		child: &Expression,
		parent: Operator,
		as_argument: bool,
	) -> Result<()> {
		let wrap = match child {
			Expression::Operation(op) => {
				parent.wraps(op.operator(), as_argument)
					|| (parent == Operator::Neg && op.operator() == Operator::Neg)
			}
			Expression::Constant(_) => parent == Operator::Neg,
			Expression::Path(_) => false,
		};
		if wrap {
			w.push("(");
			self.write_expression(w, child)?;
			w.push(")");
			Ok(())
		} else {
			self.write_expression(w, child)
		}
	}

	fn write_operation(&self, w: &mut SqlWriter, op: &Operation) -> Result<()> {
		let operator = op.operator();
		match (operator, op.args().is_empty()) {
			(Operator::In, true) => {
				w.push("1 = 0");
				return Ok(());
			}
			(Operator::NotIn, true) => {
				w.push("1 = 1");
				return Ok(());
			}
			_ => {}
		}
		if operator == Operator::Concat && self.dialect != Dialect::Mysql {
			w.push("(");
			self.write_child(w, op.operand(), operator, false)?;
			for arg in op.args() {
				w.push(" || ");
				self.write_child(w, arg, operator, true)?;
			}
			w.push(")");
			return Ok(());
		}

		match operator.notation() {
			Notation::Prefix => {
				w.push(operator.sign());
				if operator == Operator::Not {
					w.push(" ");
				}
				self.write_child(w, op.operand(), operator, false)
			}
			Notation::Postfix => {
				self.write_child(w, op.operand(), operator, false)?;
				w.push(" ");
				w.push(operator.sign());
				Ok(())
			}
			Notation::Infix => {
				self.write_child(w, op.operand(), operator, false)?;
				for arg in op.args() {
					w.push(" ");
					w.push(operator.sign());
					w.push(" ");
					self.write_child(w, arg, operator, true)?;
				}
				Ok(())
			}
			Notation::InList => {
				self.write_child(w, op.operand(), operator, false)?;
				w.push(" ");
				w.push(operator.sign());
				w.push(" (");
				for (i, arg) in op.args().iter().enumerate() {
					if i > 0 {
						w.push(", ");
					}
					self.write_child(w, arg, operator, true)?;
				}
				w.push(")");
				Ok(())
			}
			Notation::Between => {
				self.write_child(w, op.operand(), operator, false)?;
				w.push(" BETWEEN ");
				for (i, arg) in op.args().iter().enumerate() {
					if i > 0 {
						w.push(" AND ");
					}
					self.write_child(w, arg, operator, true)?;
				}
				Ok(())
			}
			Notation::Function => {
				w.push(operator.sign());
				w.push("(");
				self.write_child(w, op.operand(), operator, false)?;
				for arg in op.args() {
					w.push(", ");
					self.write_child(w, arg, operator, true)?;
				}
				w.push(")");
				Ok(())
			}
		}
	}
}

#[cfg(test)]
mod tests;
