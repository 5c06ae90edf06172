//! Statement-level operators: CREATE TABLE, INSERT, DELETE. Each mutates
//! the catalog or engine once from its first `next` call, then reports a
//! single row carrying an affected-row count before exhausting.

use crate::Executor;
use catalog::{Catalog, Schema};
use common::{DbError, DbResult, Row};
use types::Value;

fn exec_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Exec {
        kind,
        message: message.into(),
    }
}

/// Registers a new table's schema with the catalog. Fails if a table of
/// that name is already registered.
pub struct CreateTableExec {
    schema: Option<Schema>,
    done: bool,
}

impl CreateTableExec {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            done: false,
        }
    }
}

impl Executor for CreateTableExec {
    fn open(&mut self, _catalog: &mut Catalog) -> DbResult<()> {
        self.done = false;
        Ok(())
    }

    fn next(&mut self, catalog: &mut Catalog) -> DbResult<Option<Row>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let schema = self.schema.take().expect("CreateTableExec.next called more than once");
        if catalog.get_schema(&schema.table_name)?.is_some() {
            return Err(exec_err(
                "TableAlreadyExists",
                format!("table '{}' already exists", schema.table_name),
            ));
        }
        catalog.create_table(schema)?;
        Ok(Some(Row::new(vec![Value::Int(0)])))
    }

    fn close(&mut self, _catalog: &mut Catalog) -> DbResult<()> {
        Ok(())
    }

    fn schema(&self) -> &[String] {
        &[]
    }
}

/// Inserts each already-reordered row into `table` and reports how many
/// were inserted. A row that fails validation (NOT NULL, primary-key
/// uniqueness) aborts the statement immediately; rows inserted before it
/// stay persisted.
pub struct InsertExec {
    table: String,
    rows: Vec<Vec<Value>>,
    done: bool,
}

impl InsertExec {
    pub fn new(table: String, rows: Vec<Vec<Value>>) -> Self {
        Self {
            table,
            rows,
            done: false,
        }
    }
}

impl Executor for InsertExec {
    fn open(&mut self, _catalog: &mut Catalog) -> DbResult<()> {
        self.done = false;
        Ok(())
    }

    fn next(&mut self, catalog: &mut Catalog) -> DbResult<Option<Row>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut count: i64 = 0;
        for values in self.rows.drain(..) {
            catalog.engine().insert_row(&self.table, Row::new(values))?;
            count += 1;
        }
        Ok(Some(Row::new(vec![Value::Int(count)])))
    }

    fn close(&mut self, _catalog: &mut Catalog) -> DbResult<()> {
        Ok(())
    }

    fn schema(&self) -> &[String] {
        &[]
    }
}

/// Drives `input` (a scan, usually filtered) to completion, deleting each
/// row it yields by its `RecordId`, and reports how many were deleted.
pub struct DeleteExec {
    table: String,
    input: Box<dyn Executor>,
    done: bool,
}

impl DeleteExec {
    pub fn new(table: String, input: Box<dyn Executor>) -> Self {
        Self {
            table,
            input,
            done: false,
        }
    }
}

impl Executor for DeleteExec {
    fn open(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        self.done = false;
        self.input.open(catalog)
    }

    fn next(&mut self, catalog: &mut Catalog) -> DbResult<Option<Row>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut count: i64 = 0;
        while let Some(row) = self.input.next(catalog)? {
            let rid = row.rid().expect("rows from a scan always carry a record id");
            catalog.engine().delete_row(&self.table, rid)?;
            count += 1;
        }
        Ok(Some(Row::new(vec![Value::Int(count)])))
    }

    fn close(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        self.input.close(catalog)
    }

    fn schema(&self) -> &[String] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::SeqScanExec;
    use crate::tests::{create_people, open_catalog};
    use tempfile::tempdir;

    #[test]
    fn create_table_rejects_duplicate_name() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);

        let schema = catalog.get_schema("people").unwrap().unwrap();
        let mut create = CreateTableExec::new(schema);
        create.open(&mut catalog).unwrap();
        let err = create.next(&mut catalog).unwrap_err();
        assert_eq!(err.kind(), "TableAlreadyExists");
    }

    #[test]
    fn insert_reports_row_count() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);

        let rows = vec![
            vec![Value::Int(1), Value::Text("Ada".into()), Value::Bool(true)],
            vec![Value::Int(2), Value::Text("Grace".into()), Value::Bool(false)],
        ];
        let mut insert = InsertExec::new("people".into(), rows);
        insert.open(&mut catalog).unwrap();
        let row = insert.next(&mut catalog).unwrap().unwrap();
        assert_eq!(row.values, vec![Value::Int(2)]);
        assert_eq!(insert.next(&mut catalog).unwrap(), None);

        assert_eq!(catalog.engine().seq_scan("people").unwrap().len(), 2);
    }

    #[test]
    fn insert_aborts_on_not_null_violation_leaving_prior_rows() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);

        let rows = vec![
            vec![Value::Int(1), Value::Text("Ada".into()), Value::Bool(true)],
            vec![Value::Null, Value::Text("Oops".into()), Value::Bool(true)],
        ];
        let mut insert = InsertExec::new("people".into(), rows);
        insert.open(&mut catalog).unwrap();
        let err = insert.next(&mut catalog).unwrap_err();
        assert_eq!(err.kind(), "NotNullViolation");

        assert_eq!(catalog.engine().seq_scan("people").unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_matching_rows_only() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);
        catalog
            .engine()
            .insert_row("people", Row::new(vec![Value::Int(1), Value::Text("Ada".into()), Value::Bool(true)]))
            .unwrap();
        catalog
            .engine()
            .insert_row("people", Row::new(vec![Value::Int(2), Value::Text("Grace".into()), Value::Bool(false)]))
            .unwrap();

        let scan = Box::new(SeqScanExec::new("people".into()));
        let predicate = expr::Expr::Column { name: "active".into() };
        let filtered = Box::new(crate::filter::FilterExec::new(scan, predicate));
        let mut delete = DeleteExec::new("people".into(), filtered);

        delete.open(&mut catalog).unwrap();
        let row = delete.next(&mut catalog).unwrap().unwrap();
        assert_eq!(row.values, vec![Value::Int(1)]);

        let remaining = catalog.engine().seq_scan("people").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].1.values[0], Value::Int(2));
    }
}
