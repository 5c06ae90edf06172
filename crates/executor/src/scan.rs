//! Leaf operator: sequential scan of a table's live rows.

use crate::Executor;
use catalog::Catalog;
use common::{DbResult, Row};

/// Emits every live row of `table` in RID order. `StorageEngine::seq_scan`
/// already returns rows in that order and each carries its `RecordId`, so
/// `open` materializes the scan once and `next` simply drains it.
pub struct SeqScanExec {
    table: String,
    schema: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl SeqScanExec {
    pub fn new(table: String) -> Self {
        Self {
            table,
            schema: Vec::new(),
            rows: Vec::new().into_iter(),
        }
    }
}

impl Executor for SeqScanExec {
    fn open(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        let engine = catalog.engine();
        self.schema = engine
            .table_schema(&self.table)
            .expect("semantic analysis already validated this table exists")
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let rows: Vec<Row> = engine.seq_scan(&self.table)?.into_iter().map(|(_, row)| row).collect();
        self.rows = rows.into_iter();
        Ok(())
    }

    fn next(&mut self, _catalog: &mut Catalog) -> DbResult<Option<Row>> {
        Ok(self.rows.next())
    }

    fn close(&mut self, _catalog: &mut Catalog) -> DbResult<()> {
        Ok(())
    }

    fn schema(&self) -> &[String] {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_people, open_catalog};
    use tempfile::tempdir;
    use types::Value;

    #[test]
    fn scan_empty_table_is_exhausted() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);

        let mut scan = SeqScanExec::new("people".into());
        scan.open(&mut catalog).unwrap();
        assert_eq!(scan.next(&mut catalog).unwrap(), None);
        scan.close(&mut catalog).unwrap();
    }

    #[test]
    fn scan_returns_rows_in_rid_order_with_schema() {
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

        let mut scan = SeqScanExec::new("people".into());
        scan.open(&mut catalog).unwrap();
        assert_eq!(scan.schema(), &["id", "name", "active"]);

        let first = scan.next(&mut catalog).unwrap().unwrap();
        assert_eq!(first.values[0], Value::Int(1));
        assert!(first.rid().is_some());

        let second = scan.next(&mut catalog).unwrap().unwrap();
        assert_eq!(second.values[0], Value::Int(2));

        assert_eq!(scan.next(&mut catalog).unwrap(), None);
    }
}
