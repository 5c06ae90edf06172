//! Walks a parsed statement against the catalog and validates it before
//! planning: table/column existence, arity, and type assignability.
//! Produces `DbError::Sem{kind, ...}` with the closed kind set
//! `{UnknownTable, UnknownColumn, DuplicateColumn, TypeMismatch,
//! ArityMismatch, LengthOverflow}`.


use catalog::{Catalog, Schema};
use common::DbError;
use expr::{BinaryOp, Expr, UnaryOp};
use parser::ast::{SelectItem, Statement};
use types::{SqlType, Value};

fn sem_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Sem {
        kind,
        line: 0,
        col: 0,
        message: message.into(),
    }
}

fn require_schema(catalog: &mut Catalog, table: &str) -> Result<Schema, DbError> {
    catalog
        .get_schema(table)?
        .ok_or_else(|| sem_err("UnknownTable", format!("unknown table '{table}'")))
}

/// Validates `stmt` against `catalog`. On success the statement is safe
/// to lower to a plan.
pub fn analyze(catalog: &mut Catalog, stmt: &Statement) -> Result<(), DbError> {
    match stmt {
        Statement::CreateTable { columns, .. } => analyze_create_table(columns),
        Statement::Insert { table, columns, rows } => analyze_insert(catalog, table, columns, rows),
        Statement::Select { items, table, selection } => analyze_select(catalog, items, table, selection),
        Statement::Delete { table, selection } => analyze_delete(catalog, table, selection),
    }
}

fn analyze_create_table(columns: &[parser::ast::ColumnDef]) -> Result<(), DbError> {
    let mut seen = Vec::with_capacity(columns.len());
    for col in columns {
        let lower = col.name.to_ascii_lowercase();
        if seen.contains(&lower) {
            return Err(sem_err("DuplicateColumn", format!("duplicate column '{}'", col.name)));
        }
        seen.push(lower);
    }
    Ok(())
}

fn analyze_insert(
    catalog: &mut Catalog,
    table: &str,
    columns: &Option<Vec<String>>,
    rows: &[Vec<Expr>],
) -> Result<(), DbError> {
    let schema = require_schema(catalog, table)?;

    let target_indices: Vec<usize> = match columns {
        Some(names) => {
            let mut seen = Vec::with_capacity(names.len());
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                let lower = name.to_ascii_lowercase();
                if seen.contains(&lower) {
                    return Err(sem_err("DuplicateColumn", format!("column '{name}' repeated in INSERT column list")));
                }
                seen.push(lower);
                let idx = schema
                    .column_index(name)
                    .ok_or_else(|| sem_err("UnknownColumn", format!("unknown column '{name}' on table '{table}'")))?;
                indices.push(idx);
            }
            indices
        }
        None => (0..schema.columns.len()).collect(),
    };

    for row in rows {
        if row.len() != target_indices.len() {
            return Err(sem_err(
                "ArityMismatch",
                format!(
                    "expected {} value(s), got {} in INSERT into '{table}'",
                    target_indices.len(),
                    row.len()
                ),
            ));
        }
        for (expr, &col_idx) in row.iter().zip(target_indices.iter()) {
            let column = &schema.columns[col_idx];
            let value = match expr {
                Expr::Literal(v) => v,
                _ => return Err(sem_err("TypeMismatch", "INSERT values must be literals")),
            };
            check_assignable(value, column)?;
        }
    }
    Ok(())
}

fn check_assignable(value: &Value, column: &catalog::Column) -> Result<(), DbError> {
    match (value, column.ty) {
        (Value::Null, _) => {
            if column.not_null {
                Err(sem_err(
                    "TypeMismatch",
                    format!("column '{}' is NOT NULL and cannot accept NULL", column.name),
                ))
            } else {
                Ok(())
            }
        }
        (Value::Int(_), SqlType::Int) => Ok(()),
        (Value::Bool(_), SqlType::Bool) => Ok(()),
        (Value::Text(s), SqlType::Varchar(n)) => {
            if s.len() > n as usize {
                Err(sem_err(
                    "LengthOverflow",
                    format!("value for column '{}' exceeds VARCHAR({n})", column.name),
                ))
            } else {
                Ok(())
            }
        }
        _ => Err(sem_err(
            "TypeMismatch",
            format!("value {value} is not assignable to column '{}' ({})", column.name, column.ty),
        )),
    }
}

fn analyze_select(
    catalog: &mut Catalog,
    items: &[SelectItem],
    table: &str,
    selection: &Option<Expr>,
) -> Result<(), DbError> {
    let schema = require_schema(catalog, table)?;

    for item in items {
        if let SelectItem::Column(name) = item {
            schema
                .column_index(name)
                .ok_or_else(|| sem_err("UnknownColumn", format!("unknown column '{name}' on table '{table}'")))?;
        }
    }

    if let Some(expr) = selection {
        infer(expr, &schema)?;
    }
    Ok(())
}

fn analyze_delete(catalog: &mut Catalog, table: &str, selection: &Option<Expr>) -> Result<(), DbError> {
    let schema = require_schema(catalog, table)?;
    if let Some(expr) = selection {
        infer(expr, &schema)?;
    }
    Ok(())
}

/// A static expression type. `None` means the expression is the `NULL`
/// literal, which is compatible with every other type.
fn infer(expr: &Expr, schema: &Schema) -> Result<Option<SqlType>, DbError> {
    match expr {
        Expr::Literal(Value::Null) => Ok(None),
        Expr::Literal(Value::Int(_)) => Ok(Some(SqlType::Int)),
        Expr::Literal(Value::Bool(_)) => Ok(Some(SqlType::Bool)),
        Expr::Literal(Value::Text(s)) => Ok(Some(SqlType::Varchar(s.len() as u16))),
        Expr::Column { name } => {
            let idx = schema
                .column_index(name)
                .ok_or_else(|| sem_err("UnknownColumn", format!("unknown column '{name}'")))?;
            Ok(Some(schema.columns[idx].ty))
        }
        Expr::Unary { op, expr } => {
            let t = infer(expr, schema)?;
            match op {
                UnaryOp::Not => require_bool(t, "NOT")?,
                UnaryOp::Neg => require_int(t, "unary minus")?,
            }
            Ok(t)
        }
        Expr::Binary { left, op, right } => {
            let lt = infer(left, schema)?;
            let rt = infer(right, schema)?;
            match op {
                BinaryOp::And | BinaryOp::Or => {
                    require_bool(lt, "AND/OR")?;
                    require_bool(rt, "AND/OR")?;
                    Ok(Some(SqlType::Bool))
                }
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                    require_int(lt, "arithmetic")?;
                    require_int(rt, "arithmetic")?;
                    Ok(Some(SqlType::Int))
                }
                BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                    require_comparable(lt, rt)?;
                    Ok(Some(SqlType::Bool))
                }
            }
        }
    }
}

fn same_type_family(a: SqlType, b: SqlType) -> bool {
    matches!(
        (a, b),
        (SqlType::Int, SqlType::Int) | (SqlType::Bool, SqlType::Bool) | (SqlType::Varchar(_), SqlType::Varchar(_))
    )
}

fn require_bool(t: Option<SqlType>, context: &str) -> Result<(), DbError> {
    match t {
        None | Some(SqlType::Bool) => Ok(()),
        Some(other) => Err(sem_err("TypeMismatch", format!("{context} expects BOOLEAN, got {other}"))),
    }
}

fn require_int(t: Option<SqlType>, context: &str) -> Result<(), DbError> {
    match t {
        None | Some(SqlType::Int) => Ok(()),
        Some(other) => Err(sem_err("TypeMismatch", format!("{context} expects INT, got {other}"))),
    }
}

fn require_comparable(a: Option<SqlType>, b: Option<SqlType>) -> Result<(), DbError> {
    match (a, b) {
        (None, _) | (_, None) => Ok(()),
        (Some(x), Some(y)) if same_type_family(x, y) => Ok(()),
        (Some(x), Some(y)) => Err(sem_err("TypeMismatch", format!("incompatible types in comparison: {x}, {y}"))),
    }
}
