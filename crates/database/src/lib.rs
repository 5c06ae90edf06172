//! Facade wiring the compiler pipeline (lexer, parser, semantic, planner)
//! to the catalog and executor, so a caller only ever sees SQL text in and
//! per-statement artifacts out — the shape the `cli` crate's `--show`
//! surface renders.

use catalog::Catalog;
use common::{Config, DbError, DbResult};
use engine::StorageEngine;
use executor::ExecOutcome;
use lexer::Token;
use parser::ast::Statement;
use planner::Plan;

/// Everything a single compiled-and-executed statement produced, for the
/// CLI's `--show=token|ast|sem|plan|result` flag to pick one field from.
/// `tokens` is the full lexed stream for the source the statement came
/// from, not just this statement's slice — the lexer has no notion of
/// statement boundaries.
pub struct StatementRun {
    pub tokens: Vec<Token>,
    pub ast: Statement,
    pub plan: Plan,
    pub outcome: ExecOutcome,
}

/// Owns the catalog (and, through it, the storage engine and buffer pool)
/// for one data directory. One `Database` per process; statements run
/// against it one at a time, in the order they're submitted.
pub struct Database {
    catalog: Catalog,
}

impl Database {
    /// Opens (or initializes) the catalog at `config.data_dir`, bootstrapping
    /// `sys_tables`/`sys_columns`/`sys_indexes` on first use.
    pub fn open(config: &Config) -> DbResult<Self> {
        let pool = buffer::BufferPool::from_config(config);
        let engine = StorageEngine::new(pool);
        let catalog = Catalog::open(engine)?;
        log::debug!("opened database at {}", config.data_dir.display());
        Ok(Self { catalog })
    }

    /// Lexes `source`, then compiles and executes each statement it
    /// contains in turn. A lex error aborts before any statement runs — it
    /// isn't attributable to one. Each parsed statement is independently
    /// analyzed, planned, and executed, so a later statement's error
    /// doesn't roll back an earlier one's already-flushed writes.
    pub fn run_source(&mut self, source: &str) -> DbResult<Vec<DbResult<StatementRun>>> {
        let (tokens, lex_errors) = lexer::lex(source);
        if let Some(err) = lex_errors.into_iter().next() {
            return Err(err);
        }

        let parsed = parser::parse_statements(&tokens);
        let mut runs = Vec::with_capacity(parsed.len());
        for stmt in parsed {
            runs.push(self.run_parsed(stmt, tokens.clone()));
        }
        Ok(runs)
    }

    /// Compiles and runs the first statement found in `source`, from parse
    /// result through semantic analysis, planning, and execution.
    pub fn run_statement(&mut self, source: &str) -> DbResult<StatementRun> {
        let (tokens, lex_errors) = lexer::lex(source);
        if let Some(err) = lex_errors.into_iter().next() {
            return Err(err);
        }
        let stmt = parser::parse_statements(&tokens)
            .into_iter()
            .next()
            .unwrap_or(Err(parse_missing_statement()));
        self.run_parsed(stmt, tokens)
    }

    fn run_parsed(&mut self, stmt: DbResult<Statement>, tokens: Vec<Token>) -> DbResult<StatementRun> {
        let ast = stmt?;
        semantic::analyze(&mut self.catalog, &ast)?;
        let plan = planner::plan(&mut self.catalog, ast.clone());
        let outcome = executor::execute(plan.clone(), &mut self.catalog)?;
        Ok(StatementRun { tokens, ast, plan, outcome })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

fn parse_missing_statement() -> DbError {
    DbError::Parse {
        kind: "MissingSemicolon",
        line: 0,
        col: 0,
        message: "no statement found in input".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ReplacementPolicyKind;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> Config {
        Config::builder()
            .data_dir(dir.to_path_buf())
            .replacement_policy(ReplacementPolicyKind::Lru)
            .build()
    }

    #[test]
    fn run_source_executes_every_statement_in_order() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(&config(dir.path())).unwrap();

        let runs = db
            .run_source(
                "CREATE TABLE people (id INT PRIMARY KEY, name VARCHAR(16));\n\
                 INSERT INTO people (id, name) VALUES (1, 'Ada');\n\
                 SELECT id, name FROM people;",
            )
            .unwrap();

        assert_eq!(runs.len(), 3);
        assert!(matches!(runs[0].as_ref().unwrap().outcome, ExecOutcome::Affected(0)));
        assert!(matches!(runs[1].as_ref().unwrap().outcome, ExecOutcome::Affected(1)));
        let ExecOutcome::Rows(batch) = &runs[2].as_ref().unwrap().outcome else {
            panic!("expected rows");
        };
        assert_eq!(batch.rows.len(), 1);
    }

    #[test]
    fn unknown_table_surfaces_as_sem_error() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(&config(dir.path())).unwrap();

        let err = db.run_statement("SELECT * FROM ghosts;").unwrap_err();
        assert_eq!(err.phase(), common::Phase::Sem);
        assert_eq!(err.kind(), "UnknownTable");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn reopening_an_existing_data_dir_sees_prior_tables() {
        let dir = tempdir().unwrap();
        {
            let mut db = Database::open(&config(dir.path())).unwrap();
            db.run_statement("CREATE TABLE people (id INT PRIMARY KEY);").unwrap();
        }
        let mut db = Database::open(&config(dir.path())).unwrap();
        let run = db.run_statement("INSERT INTO people (id) VALUES (1);").unwrap();
        assert!(matches!(run.outcome, ExecOutcome::Affected(1)));
    }
}
