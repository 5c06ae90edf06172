//! Lowers an annotated AST to a logical plan tree. Planning is total over a
//! statement that has already passed semantic analysis: it never raises an
//! error, only rewrites names into the tagged [`Plan`] shape the executor
//! interprets.


use catalog::{Catalog, Schema};
use expr::Expr;
use parser::ast::{SelectItem, Statement};
use serde::{Deserialize, Serialize};
use types::Value;

/// A logical plan node. Plans are trees; `Filter`/`Project` wrap a child
/// plan, the rest are leaves. JSON-serializable for `--show=plan`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Plan {
    CreateTable(Schema),
    Insert {
        table: String,
        rows: Vec<Vec<Value>>,
    },
    SeqScan {
        table: String,
    },
    Filter {
        input: Box<Plan>,
        predicate: Expr,
    },
    Project {
        input: Box<Plan>,
        columns: Vec<String>,
    },
    Delete {
        table: String,
        predicate: Expr,
    },
}

/// Lowers `stmt` to a [`Plan`]. `catalog` is consulted only to fetch the
/// target table's schema for INSERT column reordering; by the time a
/// statement reaches the planner, semantic analysis has already confirmed
/// the table and every referenced column exist, so lookups here never fail.
pub fn plan(catalog: &mut Catalog, stmt: Statement) -> Plan {
    match stmt {
        Statement::CreateTable {
            name,
            columns,
            primary_key,
        } => Plan::CreateTable(build_schema(name, columns, primary_key)),
        Statement::Insert { table, columns, rows } => {
            let schema = catalog
                .get_schema(&table)
                .expect("storage access")
                .expect("semantic analysis already validated this table exists");
            let target_indices = resolve_target_indices(&schema, &columns);
            let rows = rows
                .into_iter()
                .map(|row| reorder_row(&schema, &target_indices, row))
                .collect();
            Plan::Insert { table, rows }
        }
        Statement::Select {
            items,
            table,
            selection,
        } => {
            let scan = Plan::SeqScan { table };
            let filtered = match selection {
                Some(predicate) => Plan::Filter {
                    input: Box::new(scan),
                    predicate,
                },
                None => scan,
            };
            if items.len() == 1 && matches!(items[0], SelectItem::Wildcard) {
                filtered
            } else {
                let columns = items
                    .into_iter()
                    .map(|item| match item {
                        SelectItem::Column(name) => name,
                        SelectItem::Wildcard => unreachable!("wildcard mixed with named columns"),
                    })
                    .collect();
                Plan::Project {
                    input: Box::new(filtered),
                    columns,
                }
            }
        }
        Statement::Delete { table, selection } => Plan::Delete {
            table,
            predicate: selection.unwrap_or(Expr::Literal(Value::Bool(true))),
        },
    }
}

fn build_schema(
    table_name: String,
    columns: Vec<parser::ast::ColumnDef>,
    primary_key: Option<Vec<String>>,
) -> Schema {
    let pk_names: Vec<String> = primary_key
        .unwrap_or_default()
        .into_iter()
        .map(|n| n.to_ascii_lowercase())
        .collect();
    let columns = columns
        .into_iter()
        .map(|c| {
            let is_pk = c.primary_key || pk_names.contains(&c.name.to_ascii_lowercase());
            catalog::Column {
                name: c.name,
                ty: c.ty,
                not_null: c.not_null || is_pk,
                primary_key: is_pk,
            }
        })
        .collect();
    Schema { table_name, columns }
}

/// Resolves an optional INSERT column list to the indices, in schema
/// order, that each supplied value is destined for.
fn resolve_target_indices(schema: &Schema, columns: &Option<Vec<String>>) -> Vec<usize> {
    match columns {
        Some(names) => names
            .iter()
            .map(|name| {
                schema
                    .column_index(name)
                    .expect("semantic analysis already validated this column name")
            })
            .collect(),
        None => (0..schema.columns.len()).collect(),
    }
}

/// Reorders a row's literal expressions into schema column order, filling
/// any column absent from `target_indices` with `NULL`.
fn reorder_row(schema: &Schema, target_indices: &[usize], row: Vec<Expr>) -> Vec<Value> {
    let mut values = vec![Value::Null; schema.columns.len()];
    for (&col_idx, expr) in target_indices.iter().zip(row.into_iter()) {
        values[col_idx] = match expr {
            Expr::Literal(v) => v,
            _ => unreachable!("semantic analysis only admits literal INSERT values"),
        };
    }
    values
}
