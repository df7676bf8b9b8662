//! In-memory query evaluation.
//!
//! [`MemoryExecutor`] keeps tables as vectors of rows and evaluates query
//! structures directly, without rendering SQL. It is meant for tests: it
//! records every query it serves so callers can assert on what ran.
//!
//! Semantics follow SQL where it matters for filtering: comparisons with
//! `NULL` are unknown, `AND`/`OR`/`NOT` use three-valued logic, and only
//! rows whose condition is true are kept. `LIKE` is case-sensitive.
//! Grouping is not supported; aggregates fold the whole filtered row set.

use std::cmp::Ordering as CmpOrdering;
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use quarry_query::{Direction, Expression, Operator, QueryStructure, Selection, Source, Value};
use serde::Serialize;
use tracing::trace;

use crate::error::{QueryError, Result};
use crate::orm::{Model, QueryExecutor, Row};

/// Tables held in memory, plus a log of served queries.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
	tables: DashMap<String, Vec<Row>>,
	served: Mutex<Vec<QueryStructure>>,
}

impl MemoryExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append `records` to `M`'s table, one column per serialized field.
	///
	/// # Errors
	///
	/// [`QueryError::Decode`] when a record does not serialize to a JSON
	/// object.
	pub fn insert<M: Model + Serialize>(&self, records: &[M]) -> Result<()> {
		let rows = records
			.iter()
			.map(|record| match serde_json::to_value(record)? {
				serde_json::Value::Object(fields) => Ok(fields
					.iter()
					.fold(Row::default(), |mut row, (name, value)| {
						row.push(name.clone(), Value::from_json(value));
						row
					})),
				other => Err(QueryError::Decode(<serde_json::Error as serde::de::Error>::custom(
					format!("expected an object, got {}", other),
				))),
			})
			.collect::<Result<Vec<_>>>()?;
		self.insert_rows(M::table_name(), rows);
		Ok(())
	}

	pub fn insert_rows(&self, table: &str, rows: Vec<Row>) {
		self.tables.entry(table.to_string()).or_default().extend(rows);
	}

	/// Queries served through [`QueryExecutor::get_list`], oldest first.
	pub fn served(&self) -> Vec<QueryStructure> {
		self.served
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn clear_served(&self) {
		self.served
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clear();
	}

	/// Evaluate `query` without recording it.
	///
	/// # Errors
	///
	/// [`QueryError::Unsupported`] for grouping, `HAVING` without aggregates
	/// and nested field paths.
	pub fn evaluate(&self, query: &QueryStructure) -> Result<Vec<Row>> {
		if !query.group_by().is_empty() {
			return Err(QueryError::Unsupported("grouping in memory".into()));
		}
		let source = match query.source() {
			Source::Table(name) => self
				.tables
				.get(name)
				.map(|rows| rows.value().clone())
				.unwrap_or_default(),
			Source::SubQuery(inner) => self.evaluate(inner)?,
		};

		let mut kept = Vec::with_capacity(source.len());
		for row in source {
			if is_true(&eval(query.where_clause(), &Scope::Row(&row))?) {
				kept.push(row);
			}
		}

		let select = query.select();
		let aggregated = query.having().contains_aggregate()
			|| select.expressions().iter().any(Expression::contains_aggregate);
		let mut projected = if aggregated {
			let scope = Scope::Group(&kept);
			if is_true(&eval(query.having(), &scope)?) {
				vec![project(&select.selection, &scope)?]
			} else {
				Vec::new()
			}
		} else {
			if !query.having().is_true_literal() {
				return Err(QueryError::Unsupported("HAVING without aggregates".into()));
			}
			sort_rows(&mut kept, query)?;
			kept.iter()
				.map(|row| project(&select.selection, &Scope::Row(row)))
				.collect::<Result<Vec<_>>>()?
		};

		if select.distinct {
			let mut unique: Vec<Row> = Vec::with_capacity(projected.len());
			for row in projected {
				if !unique.contains(&row) {
					unique.push(row);
				}
			}
			projected = unique;
		}

		let offset = usize::try_from(query.offset().unwrap_or(0)).unwrap_or(usize::MAX);
		let limit = query
			.limit()
			.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
		Ok(projected.into_iter().skip(offset).take(limit).collect())
	}
}

#[async_trait::async_trait]
impl QueryExecutor for MemoryExecutor {
	async fn get_list(&self, query: &QueryStructure) -> Result<Vec<Row>> {
		trace!(query = %query, "serving query from memory");
		self.served
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(query.clone());
		self.evaluate(query)
	}
}

enum Scope<'a> {
	Row(&'a Row),
	/// All rows folded by aggregates
	Group(&'a [Row]),
}

fn column_name(expression: &Expression) -> String {
	match expression {
		Expression::Path(path) => path.leaf().to_string(),
		other => other.to_string(),
	}
}

fn project(selection: &Selection, scope: &Scope<'_>) -> Result<Row> {
	let exprs = match selection {
		Selection::Entity => {
			return match scope {
				Scope::Row(row) => Ok((*row).clone()),
				Scope::Group(_) => Err(QueryError::illegal_state(
					"cannot select entities from an aggregate query",
				)),
			};
		}
		Selection::Scalar(expr) => std::slice::from_ref(expr),
		Selection::Tuple(exprs) => exprs.as_slice(),
	};
	let mut row = Row::default();
	for expr in exprs {
		row.push(column_name(expr), eval(expr, scope)?);
	}
	Ok(row)
}

/// Nulls sort first ascending, last descending.
fn compare_for_sort(a: &Value, b: &Value) -> CmpOrdering {
	match (a.is_null(), b.is_null()) {
		(true, true) => CmpOrdering::Equal,
		(true, false) => CmpOrdering::Less,
		(false, true) => CmpOrdering::Greater,
		(false, false) => a.compare(b).unwrap_or(CmpOrdering::Equal),
	}
}

fn sort_rows(rows: &mut Vec<Row>, query: &QueryStructure) -> Result<()> {
	if query.order_by().is_empty() {
		return Ok(());
	}
	let mut keyed = Vec::with_capacity(rows.len());
	for row in rows.drain(..) {
		let keys = query
			.order_by()
			.iter()
			.map(|ordering| eval(ordering.expression(), &Scope::Row(&row)))
			.collect::<Result<Vec<_>>>()?;
		keyed.push((keys, row));
	}
	keyed.sort_by(|(a, _), (b, _)| {
		query
			.order_by()
			.iter()
			.zip(a.iter().zip(b))
			.map(|(ordering, (x, y))| match ordering.direction() {
				Direction::Asc => compare_for_sort(x, y),
				Direction::Desc => compare_for_sort(y, x),
			})
			.find(|o| *o != CmpOrdering::Equal)
			.unwrap_or(CmpOrdering::Equal)
	});
	rows.extend(keyed.into_iter().map(|(_, row)| row));
	Ok(())
}

fn is_true(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		other => other.as_i64().is_some_and(|n| n != 0),
	}
}

/// Three-valued view of a condition: `None` is unknown.
fn truth(value: &Value) -> Option<bool> {
	if value.is_null() {
		None
	} else {
		Some(is_true(value))
	}
}

fn from_truth(truth: Option<bool>) -> Value {
	truth.map_or(Value::Null, Value::Bool)
}

fn eval(expression: &Expression, scope: &Scope<'_>) -> Result<Value> {
	match expression {
		Expression::Constant(value) => Ok(value.clone()),
		Expression::Path(path) => {
			if path.len() > 1 {
				return Err(QueryError::Unsupported(format!(
					"nested path `{}` in memory",
					path
				)));
			}
			let row = match scope {
				Scope::Row(row) => *row,
				Scope::Group(rows) => match rows.first() {
					Some(row) => row,
					None => return Ok(Value::Null),
				},
			};
			row.get(path.leaf())
				.cloned()
				.ok_or_else(|| QueryError::illegal_state(format!("unknown column `{}`", path)))
		}
		Expression::Operation(op) => {
			let operator = op.operator();
			if operator.is_aggregate() {
				return aggregate(operator, op.operand(), scope);
			}
			let operand = eval(op.operand(), scope)?;
			let args = op
				.args()
				.iter()
				.map(|arg| eval(arg, scope))
				.collect::<Result<Vec<_>>>()?;
			apply(operator, operand, args)
		}
	}
}

fn aggregate(operator: Operator, operand: &Expression, scope: &Scope<'_>) -> Result<Value> {
	let Scope::Group(rows) = scope else {
		return Err(QueryError::illegal_state(format!(
			"aggregate {} outside an aggregate query",
			operator.sign()
		)));
	};
	let mut values = Vec::with_capacity(rows.len());
	for row in rows.iter() {
		let value = eval(operand, &Scope::Row(row))?;
		if !value.is_null() {
			values.push(value);
		}
	}
	let value = match operator {
		Operator::Count => Value::BigInt(values.len() as i64),
		Operator::Sum if values.is_empty() => Value::Null,
		Operator::Sum => values
			.iter()
			.skip(1)
			.try_fold(values[0].clone(), |acc, v| arithmetic(Operator::Add, &acc, v))
			.unwrap_or(Value::Null),
		Operator::Avg if values.is_empty() => Value::Null,
		Operator::Avg => {
			let total: f64 = values.iter().filter_map(Value::as_f64).sum();
			Value::Double(total / values.len() as f64)
		}
		Operator::Min => values
			.into_iter()
			.reduce(|a, b| if compare_for_sort(&b, &a).is_lt() { b } else { a })
			.unwrap_or(Value::Null),
		Operator::Max => values
			.into_iter()
			.reduce(|a, b| if compare_for_sort(&b, &a).is_gt() { b } else { a })
			.unwrap_or(Value::Null),
		_ => Value::Null,
	};
	Ok(value)
}

fn equals(a: &Value, b: &Value) -> Option<bool> {
	if a.is_null() || b.is_null() {
		return None;
	}
	Some(a.compare(b) == Some(CmpOrdering::Equal))
}

fn ordered(a: &Value, b: &Value, accept: fn(CmpOrdering) -> bool) -> Option<bool> {
	if a.is_null() || b.is_null() {
		return None;
	}
	Some(a.compare(b).is_some_and(accept))
}

fn arithmetic(operator: Operator, a: &Value, b: &Value) -> Option<Value> {
	if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
		let result = match operator {
			Operator::Add => x.checked_add(y),
			Operator::Sub => x.checked_sub(y),
			Operator::Mul => x.checked_mul(y),
			Operator::Div => x.checked_div(y),
			Operator::Rem => x.checked_rem(y),
			_ => None,
		};
		return result.map(Value::BigInt);
	}
	let (x, y) = (a.as_f64()?, b.as_f64()?);
	let result = match operator {
		Operator::Add => x + y,
		Operator::Sub => x - y,
		Operator::Mul => x * y,
		Operator::Div if y == 0.0 => return None,
		Operator::Div => x / y,
		Operator::Rem if y == 0.0 => return None,
		Operator::Rem => x % y,
		_ => return None,
	};
	Some(Value::Double(result))
}

fn text(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		other => Some(other.to_sql_literal()),
	}
}

/// `LIKE` matching with `%` and `_` wildcards.
fn like(input: &str, pattern: &str) -> bool {
	let input: Vec<char> = input.chars().collect();
	let pattern: Vec<char> = pattern.chars().collect();
	// matches[j]: whether input[..i] matches pattern[..j]
	let mut matches = vec![false; pattern.len() + 1];
	matches[0] = true;
	for j in 1..=pattern.len() {
		matches[j] = matches[j - 1] && pattern[j - 1] == '%';
	}
	for c in input {
		let mut next = vec![false; pattern.len() + 1];
		for j in 1..=pattern.len() {
			next[j] = match pattern[j - 1] {
				'%' => next[j - 1] || matches[j],
				'_' => matches[j - 1],
				p => matches[j - 1] && p == c,
			};
		}
		matches = next;
	}
	matches[pattern.len()]
}

fn apply(operator: Operator, operand: Value, args: Vec<Value>) -> Result<Value> {
	let first = args.first().cloned().unwrap_or(Value::Null);
	let value = match operator {
		Operator::Not => from_truth(truth(&operand).map(|b| !b)),
		Operator::And => {
			let mut acc = truth(&operand);
			for arg in &args {
				acc = match (acc, truth(arg)) {
					(Some(false), _) | (_, Some(false)) => Some(false),
					(Some(true), Some(true)) => Some(true),
					_ => None,
				};
			}
			from_truth(acc)
		}
		Operator::Or => {
			let mut acc = truth(&operand);
			for arg in &args {
				acc = match (acc, truth(arg)) {
					(Some(true), _) | (_, Some(true)) => Some(true),
					(Some(false), Some(false)) => Some(false),
					_ => None,
				};
			}
			from_truth(acc)
		}
		Operator::Eq => from_truth(equals(&operand, &first)),
		Operator::Ne => from_truth(equals(&operand, &first).map(|b| !b)),
		Operator::Gt => from_truth(ordered(&operand, &first, CmpOrdering::is_gt)),
		Operator::Ge => from_truth(ordered(&operand, &first, CmpOrdering::is_ge)),
		Operator::Lt => from_truth(ordered(&operand, &first, CmpOrdering::is_lt)),
		Operator::Le => from_truth(ordered(&operand, &first, CmpOrdering::is_le)),
		Operator::Like | Operator::NotLike => {
			let matched = match (text(&operand), text(&first)) {
				(Some(input), Some(pattern)) => Some(like(&input, &pattern)),
				_ => None,
			};
			let matched = if operator == Operator::NotLike {
				matched.map(|b| !b)
			} else {
				matched
			};
			from_truth(matched)
		}
		Operator::In | Operator::NotIn => {
			let found = if operand.is_null() {
				None
			} else if args.iter().any(|arg| equals(&operand, arg) == Some(true)) {
				Some(true)
			} else if args.iter().any(Value::is_null) {
				None
			} else {
				Some(false)
			};
			let found = if operator == Operator::NotIn {
				found.map(|b| !b)
			} else {
				found
			};
			from_truth(found)
		}
		Operator::Between => {
			let high = args.get(1).cloned().unwrap_or(Value::Null);
			let low_ok = ordered(&operand, &first, CmpOrdering::is_ge);
			let high_ok = ordered(&operand, &high, CmpOrdering::is_le);
			from_truth(match (low_ok, high_ok) {
				(Some(false), _) | (_, Some(false)) => Some(false),
				(Some(true), Some(true)) => Some(true),
				_ => None,
			})
		}
		Operator::IsNull => Value::Bool(operand.is_null()),
		Operator::IsNotNull => Value::Bool(!operand.is_null()),
		Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Rem => {
			arithmetic(operator, &operand, &first).unwrap_or(Value::Null)
		}
		Operator::Neg => match operand {
			Value::Int(v) => v.checked_neg().map_or(Value::Null, Value::Int),
			Value::BigInt(v) => v.checked_neg().map_or(Value::Null, Value::BigInt),
			Value::Double(v) => Value::Double(-v),
			_ => Value::Null,
		},
		Operator::Lower => text(&operand).map_or(Value::Null, |s| Value::String(s.to_lowercase())),
		Operator::Upper => text(&operand).map_or(Value::Null, |s| Value::String(s.to_uppercase())),
		Operator::Trim => {
			text(&operand).map_or(Value::Null, |s| Value::String(s.trim().to_string()))
		}
		Operator::Length => {
			text(&operand).map_or(Value::Null, |s| Value::BigInt(s.chars().count() as i64))
		}
		Operator::Substring => {
			let start = first.as_i64().unwrap_or(1).max(1) as usize;
			let len = args.get(1).and_then(Value::as_i64).map(|n| n.max(0) as usize);
			text(&operand).map_or(Value::Null, |s| {
				let chars = s.chars().skip(start - 1);
				Value::String(match len {
					Some(n) => chars.take(n).collect(),
					None => chars.collect(),
				})
			})
		}
		Operator::Concat => std::iter::once(&operand)
			.chain(args.iter())
			.map(text)
			.collect::<Option<String>>()
			.map_or(Value::Null, Value::String),
		Operator::Coalesce => std::iter::once(operand)
			.chain(args)
			.find(|v| !v.is_null())
			.unwrap_or(Value::Null),
		Operator::Count | Operator::Sum | Operator::Avg | Operator::Min | Operator::Max => {
			return Err(QueryError::illegal_state(format!(
				"aggregate {} evaluated per row",
				operator.sign()
			)));
		}
	};
	Ok(value)
}
