//! Precedence-aware rendering of expressions.
//!
//! The output doubles as debug text and as the reference layout that
//! backend renderers follow.

use std::fmt::{self, Display, Formatter, Write};

use super::expression::{Expression, FieldPath, Operation};
use crate::operator::{Notation, Operator};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
	Operand,
	Argument,
}

fn write_child(
	f: &mut Formatter<'_>,
	child: &Expression,
	parent: Operator,
	slot: Slot,
) -> fmt::Result {
	match child {
		Expression::Operation(op)
			if parent.wraps(op.operator(), slot == Slot::Argument) =>
		{
			f.write_char('(')?;
			write_operation(f, op)?;
			f.write_char(')')
		}
		other => Display::fmt(other, f),
	}
}

fn write_operation(f: &mut Formatter<'_>, op: &Operation) -> fmt::Result {
	let operator = op.operator();
	match operator.notation() {
		Notation::Prefix => {
			f.write_str(operator.sign())?;
			if operator == Operator::Not {
				f.write_char(' ')?;
			}
			write_child(f, op.operand(), operator, Slot::Operand)
		}
		Notation::Postfix => {
			write_child(f, op.operand(), operator, Slot::Operand)?;
			write!(f, " {}", operator.sign())
		}
		Notation::Infix => {
			write_child(f, op.operand(), operator, Slot::Operand)?;
			for arg in op.args() {
				write!(f, " {} ", operator.sign())?;
				write_child(f, arg, operator, Slot::Argument)?;
			}
			Ok(())
		}
		Notation::InList => {
			write_child(f, op.operand(), operator, Slot::Operand)?;
			write!(f, " {} (", operator.sign())?;
			for (i, arg) in op.args().iter().enumerate() {
				if i > 0 {
					f.write_str(", ")?;
				}
				write_child(f, arg, operator, Slot::Argument)?;
			}
			f.write_char(')')
		}
		Notation::Between => {
			write_child(f, op.operand(), operator, Slot::Operand)?;
			write!(f, " {} ", operator.sign())?;
			for (i, arg) in op.args().iter().enumerate() {
				if i > 0 {
					f.write_str(" AND ")?;
				}
				write_child(f, arg, operator, Slot::Argument)?;
			}
			Ok(())
		}
		Notation::Function => {
			write!(f, "{}(", operator.sign())?;
			write_child(f, op.operand(), operator, Slot::Operand)?;
			for arg in op.args() {
				f.write_str(", ")?;
				write_child(f, arg, operator, Slot::Argument)?;
			}
			f.write_char(')')
		}
	}
}

impl Display for FieldPath {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.identity())
	}
}

impl Display for Operation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write_operation(f, self)
	}
}

impl Display for Expression {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Expression::Constant(value) => Display::fmt(value, f),
			Expression::Path(path) => Display::fmt(path, f),
			Expression::Operation(op) => write_operation(f, op),
		}
	}
}
