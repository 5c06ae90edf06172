//! Project operator: re-emits each input row as the requested column list.

use crate::Executor;
use catalog::Catalog;
use common::{DbResult, Row};
use expr::{EvalContext, Expr};

/// Evaluates a bare column reference per requested name against each input
/// row, in the order `columns` names them.
pub struct ProjectExec {
    input: Box<dyn Executor>,
    columns: Vec<String>,
    input_schema: Vec<String>,
}

impl ProjectExec {
    pub fn new(input: Box<dyn Executor>, columns: Vec<String>) -> Self {
        Self {
            input,
            columns,
            input_schema: Vec::new(),
        }
    }
}

impl Executor for ProjectExec {
    fn open(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        self.input.open(catalog)?;
        self.input_schema = self.input.schema().to_vec();
        Ok(())
    }

    fn next(&mut self, catalog: &mut Catalog) -> DbResult<Option<Row>> {
        let Some(row) = self.input.next(catalog)? else {
            return Ok(None);
        };
        let ctx = EvalContext { schema: &self.input_schema };
        let values = self
            .columns
            .iter()
            .map(|name| ctx.eval(&Expr::Column { name: name.clone() }, &row))
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Some(Row::new(values)))
    }

    fn close(&mut self, catalog: &mut Catalog) -> DbResult<()> {
        self.input.close(catalog)
    }

    fn schema(&self) -> &[String] {
        &self.columns
    }
}
