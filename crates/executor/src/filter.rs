//! Filter operator: evaluates a predicate over each of its child's rows.

use crate::Executor;
use catalog::Catalog;
use common::{DbResult, Row};
use expr::{EvalContext, Expr};
use types::Value;

/// Passes through rows for which `predicate` evaluates to `TRUE`. A `NULL`
/// result — from an unknown comparison operand, for instance — is treated
/// the same as `FALSE`: the row is not emitted (three-valued logic).
pub struct FilterExec {
    input: Box<dyn Executor>,
    predicate: Expr,
    schema: Vec<String>,
}

impl FilterExec {
    pub fn new(input: Box<dyn Executor>, predicate: Expr) -> Self {
        Self {
            input,
            predicate,
            schema: Vec::new(),
        }
    }
}

impl Executor for FilterExec {
    fn open(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        self.input.open(catalog)?;
        self.schema = self.input.schema().to_vec();
        Ok(())
    }

    fn next(&mut self, catalog: &mut Catalog) -> DbResult<Option<Row>> {
        let ctx = EvalContext { schema: &self.schema };
        while let Some(row) = self.input.next(catalog)? {
            if matches!(ctx.eval(&self.predicate, &row)?, Value::Bool(true)) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        self.input.close(catalog)
    }

    fn schema(&self) -> &[String] {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::SeqScanExec;
    use crate::tests::{create_people, open_catalog};
    use expr::BinaryOp;
    use tempfile::tempdir;

    fn seed(catalog: &mut Catalog) {
        catalog
            .engine()
            .insert_row("people", Row::new(vec![Value::Int(1), Value::Text("Ada".into()), Value::Bool(true)]))
            .unwrap();
        catalog
            .engine()
            .insert_row("people", Row::new(vec![Value::Int(2), Value::Text("Grace".into()), Value::Bool(false)]))
            .unwrap();
    }

    #[test]
    fn filter_passes_only_matching_rows() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);
        seed(&mut catalog);

        let scan = Box::new(SeqScanExec::new("people".into()));
        let predicate = Expr::Column { name: "active".into() };
        let mut filter = FilterExec::new(scan, predicate);

        filter.open(&mut catalog).unwrap();
        let row = filter.next(&mut catalog).unwrap().unwrap();
        assert_eq!(row.values[0], Value::Int(1));
        assert_eq!(filter.next(&mut catalog).unwrap(), None);
        filter.close(&mut catalog).unwrap();
    }

    #[test]
    fn filter_null_predicate_is_not_emitted() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);
        seed(&mut catalog);

        let scan = Box::new(SeqScanExec::new("people".into()));
        // id = NULL is never TRUE for any id.
        let predicate = Expr::Binary {
            left: Box::new(Expr::Column { name: "id".into() }),
            op: BinaryOp::Eq,
            right: Box::new(Expr::Literal(Value::Null)),
        };
        let mut filter = FilterExec::new(scan, predicate);

        filter.open(&mut catalog).unwrap();
        assert_eq!(filter.next(&mut catalog).unwrap(), None);
    }

    #[test]
    fn filter_propagates_comparison() {
        let dir = tempdir().unwrap();
        let mut catalog = open_catalog(dir.path());
        create_people(&mut catalog);
        seed(&mut catalog);

        let scan = Box::new(SeqScanExec::new("people".into()));
        let predicate = Expr::Binary {
            left: Box::new(Expr::Column { name: "id".into() }),
            op: BinaryOp::Gt,
            right: Box::new(Expr::Literal(Value::Int(1))),
        };
        let mut filter = FilterExec::new(scan, predicate);

        filter.open(&mut catalog).unwrap();
        let row = filter.next(&mut catalog).unwrap().unwrap();
        assert_eq!(row.values[0], Value::Int(2));
        assert_eq!(filter.next(&mut catalog).unwrap(), None);
    }
}
