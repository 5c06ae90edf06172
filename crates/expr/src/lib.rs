#[cfg(test)]
mod tests;

use common::{DbError, DbResult, Row};
use std::cmp::Ordering;
use types::Value;

/// Comparison, logical, and arithmetic binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

/// Unary operators: logical NOT and arithmetic negation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Expression abstract syntax tree: `{ColumnRef, IntLiteral, StringLiteral,
/// NullLiteral, BinaryOp(cmp|logical|arith)}` plus unary NOT/negation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Literal(Value),
    Column { name: String },
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
}

fn exec_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Exec {
        kind,
        message: message.into(),
    }
}

/// Evaluation context: the row schema (column names in order) rows are
/// evaluated against.
pub struct EvalContext<'a> {
    pub schema: &'a [String],
}

impl<'a> EvalContext<'a> {
    /// Evaluate an expression over a given row, following SQL three-valued
    /// logic: any arithmetic or comparison with a NULL operand yields NULL;
    /// AND/OR follow Kleene's tables; NOT NULL is NULL.
    pub fn eval(&self, expr: &Expr, row: &Row) -> DbResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Column { name } => {
                let idx = self.find_column(name)?;
                Ok(row.values[idx].clone())
            }
            Expr::Unary { op, expr } => {
                let v = self.eval(expr, row)?;
                self.eval_unary(*op, &v)
            }
            Expr::Binary { left, op, right } => {
                let lv = self.eval(left, row)?;
                let rv = self.eval(right, row)?;
                self.eval_binary(&lv, *op, &rv)
            }
        }
    }

    fn eval_unary(&self, op: UnaryOp, v: &Value) -> DbResult<Value> {
        match op {
            UnaryOp::Not => match v {
                Value::Null => Ok(Value::Null),
                _ => {
                    let b = v
                        .as_bool()
                        .ok_or_else(|| exec_err("TypeMismatch", format!("NOT expects BOOLEAN, got {v}")))?;
                    Ok(Value::Bool(!b))
                }
            },
            UnaryOp::Neg => match v {
                Value::Null => Ok(Value::Null),
                _ => {
                    let i = v
                        .as_int()
                        .ok_or_else(|| exec_err("TypeMismatch", format!("unary minus expects INT, got {v}")))?;
                    Ok(Value::Int(-i))
                }
            },
        }
    }

    /// Kleene three-valued AND: `FALSE AND x` is `FALSE` for any `x`, even
    /// NULL; symmetrically for OR. Otherwise a NULL operand makes the result
    /// NULL.
    fn eval_logical(&self, op: BinaryOp, l: &Value, r: &Value) -> DbResult<Value> {
        let lb = match l {
            Value::Null => None,
            other => Some(other.as_bool().ok_or_else(|| {
                exec_err("TypeMismatch", format!("{op:?} expects BOOLEAN, got {other}"))
            })?),
        };
        let rb = match r {
            Value::Null => None,
            other => Some(other.as_bool().ok_or_else(|| {
                exec_err("TypeMismatch", format!("{op:?} expects BOOLEAN, got {other}"))
            })?),
        };

        let result = match op {
            BinaryOp::And => match (lb, rb) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            BinaryOp::Or => match (lb, rb) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            _ => unreachable!(),
        };

        Ok(result.map(Value::Bool).unwrap_or(Value::Null))
    }

    fn eval_arith(&self, op: BinaryOp, l: &Value, r: &Value) -> DbResult<Value> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        let a = l
            .as_int()
            .ok_or_else(|| exec_err("TypeMismatch", format!("{op:?} expects INT, got {l}")))?;
        let b = r
            .as_int()
            .ok_or_else(|| exec_err("TypeMismatch", format!("{op:?} expects INT, got {r}")))?;

        let result = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(exec_err("DivisionByZero", "division by zero"));
                }
                a / b
            }
            _ => unreachable!(),
        };
        Ok(Value::Int(result))
    }

    fn eval_cmp(&self, op: BinaryOp, l: &Value, r: &Value) -> DbResult<Value> {
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        let ord = l
            .cmp_same_type(r)
            .ok_or_else(|| exec_err("TypeMismatch", format!("incompatible types for {op:?}: {l}, {r}")))?;

        let result = match op {
            BinaryOp::Eq => ord == Ordering::Equal,
            BinaryOp::Ne => ord != Ordering::Equal,
            BinaryOp::Lt => ord == Ordering::Less,
            BinaryOp::Le => ord != Ordering::Greater,
            BinaryOp::Gt => ord == Ordering::Greater,
            BinaryOp::Ge => ord != Ordering::Less,
            _ => unreachable!(),
        };
        Ok(Value::Bool(result))
    }

    fn eval_binary(&self, l: &Value, op: BinaryOp, r: &Value) -> DbResult<Value> {
        use BinaryOp::*;
        match op {
            And | Or => self.eval_logical(op, l, r),
            Add | Sub | Mul | Div => self.eval_arith(op, l, r),
            Eq | Ne | Lt | Le | Gt | Ge => self.eval_cmp(op, l, r),
        }
    }

    fn find_column(&self, name: &str) -> DbResult<usize> {
        self.schema
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| exec_err("UnknownColumn", format!("unknown column '{name}'")))
    }
}
