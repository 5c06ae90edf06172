//! Interprets a [`planner::Plan`] tree through a Volcano-style open/next/close
//! contract. Each physical operator pulls rows from its child lazily; the
//! leaf `SeqScan` is the only operator that touches storage directly, and the
//! three DML operators (`CreateTable`, `Insert`, `Delete`) mutate the catalog
//! or engine from a single `next` call before exhausting.

mod dml;
mod filter;
mod project;
mod scan;

pub use dml::{CreateTableExec, DeleteExec, InsertExec};
pub use filter::FilterExec;
pub use project::ProjectExec;
pub use scan::SeqScanExec;

use catalog::Catalog;
use common::{DbResult, RecordBatch, Row};
use planner::Plan;
use types::Value;

/// A physical operator. `open` (re)initializes iteration state and may
/// touch storage (a `SeqScan` materializes its rows here); `next` pulls
/// one row at a time, returning `None` once exhausted; `close` releases
/// whatever `open` acquired. `schema` names the operator's output columns
/// in positional order (empty for the DML operators, which produce a
/// single affected-row count rather than a projected tuple).
pub trait Executor {
    fn open(&mut self, catalog: &mut Catalog) -> DbResult<()>;
    fn next(&mut self, catalog: &mut Catalog) -> DbResult<Option<Row>>;
    fn close(&mut self, catalog: &mut Catalog) -> DbResult<()>;
    fn schema(&self) -> &[String];
}

/// What executing a statement produced: a result set for `SELECT`, or an
/// affected-row count for `CREATE TABLE`/`INSERT`/`DELETE`.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecOutcome {
    Rows(RecordBatch),
    Affected(u64),
}

fn build(plan: Plan) -> Box<dyn Executor> {
    match plan {
        Plan::CreateTable(schema) => Box::new(CreateTableExec::new(schema)),
        Plan::Insert { table, rows } => Box::new(InsertExec::new(table, rows)),
        Plan::SeqScan { table } => Box::new(SeqScanExec::new(table)),
        Plan::Filter { input, predicate } => Box::new(FilterExec::new(build(*input), predicate)),
        Plan::Project { input, columns } => Box::new(ProjectExec::new(build(*input), columns)),
        Plan::Delete { table, predicate } => {
            let scan: Box<dyn Executor> = Box::new(SeqScanExec::new(table.clone()));
            let filtered = Box::new(FilterExec::new(scan, predicate));
            Box::new(DeleteExec::new(table, filtered))
        }
    }
}

fn is_write(plan: &Plan) -> bool {
    matches!(plan, Plan::CreateTable(_) | Plan::Insert { .. } | Plan::Delete { .. })
}

/// Runs `plan` to completion against `catalog`. Per the concurrency model,
/// the buffer pool is flushed once at the end of every successful write
/// statement (`CreateTable`/`Insert`/`Delete`) before the result is handed
/// back; read-only statements never flush. A mid-statement error aborts
/// immediately with whatever was already durably written left in place —
/// there is no rollback.
pub fn execute(plan: Plan, catalog: &mut Catalog) -> DbResult<ExecOutcome> {
    let write = is_write(&plan);
    let mut root = build(plan);

    root.open(catalog)?;
    let schema = root.schema().to_vec();
    let mut rows = Vec::new();
    while let Some(row) = root.next(catalog)? {
        rows.push(row);
    }
    root.close(catalog)?;

    if write {
        catalog.engine().flush()?;
        let affected = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_values().into_iter().next())
            .and_then(|v| match v {
                Value::Int(n) => Some(n as u64),
                _ => None,
            })
            .unwrap_or(0);
        Ok(ExecOutcome::Affected(affected))
    } else {
        Ok(ExecOutcome::Rows(RecordBatch { columns: schema, rows }))
    }
}
