use super::ast::*;
use super::*;
use expr::{BinaryOp, Expr};
use lexer::lex;
use pretty_assertions::assert_eq;
use types::{SqlType, Value};

fn parse_one(src: &str) -> Statement {
    let (tokens, lex_errors) = lex(src);
    assert!(lex_errors.is_empty());
    let mut results = parse_statements(&tokens);
    assert_eq!(results.len(), 1, "expected exactly one statement result");
    results.remove(0).expect("expected successful parse")
}

#[test]
fn parses_create_table_with_primary_key() {
    let stmt = parse_one("CREATE TABLE s(id INT PRIMARY KEY, name VARCHAR(16), age INT);");
    match stmt {
        Statement::CreateTable { name, columns, primary_key } => {
            assert_eq!(name, "s");
            assert_eq!(columns.len(), 3);
            assert_eq!(columns[0].ty, SqlType::Int);
            assert!(columns[0].primary_key);
            assert_eq!(columns[1].ty, SqlType::Varchar(16));
            assert_eq!(primary_key, Some(vec!["id".to_string()]));
        }
        other => panic!("expected CreateTable, got {other:?}"),
    }
}

#[test]
fn parses_insert_with_explicit_columns() {
    let stmt = parse_one("INSERT INTO s (id, name) VALUES (1, 'Ada');");
    match stmt {
        Statement::Insert { table, columns, rows } => {
            assert_eq!(table, "s");
            assert_eq!(columns, Some(vec!["id".to_string(), "name".to_string()]));
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0][0], Expr::Literal(Value::Int(1)));
            assert_eq!(rows[0][1], Expr::Literal(Value::Text("Ada".into())));
        }
        other => panic!("expected Insert, got {other:?}"),
    }
}

#[test]
fn parses_select_wildcard_with_where() {
    let stmt = parse_one("SELECT * FROM s WHERE age > 18;");
    match stmt {
        Statement::Select { items, table, selection } => {
            assert_eq!(items, vec![SelectItem::Wildcard]);
            assert_eq!(table, "s");
            assert!(matches!(
                selection,
                Some(Expr::Binary { op: BinaryOp::Gt, .. })
            ));
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_delete_without_where() {
    let stmt = parse_one("DELETE FROM s;");
    match stmt {
        Statement::Delete { table, selection } => {
            assert_eq!(table, "s");
            assert!(selection.is_none());
        }
        other => panic!("expected Delete, got {other:?}"),
    }
}

#[test]
fn expression_precedence_matches_conventional_order() {
    // 1 + 2 * 3 = 7, not 9.
    let stmt = parse_one("SELECT * FROM s WHERE id = 1 + 2 * 3;");
    let Statement::Select { selection: Some(expr), .. } = stmt else {
        panic!("expected WHERE clause");
    };
    let Expr::Binary { op: BinaryOp::Eq, right, .. } = expr else {
        panic!("expected top-level comparison");
    };
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn missing_semicolon_is_reported_and_next_statement_still_parses() {
    let (tokens, _) = lex("SELECT * FROM s SELECT * FROM t;");
    let results = parse_statements(&tokens);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert_eq!(results[1].as_ref().unwrap_err().kind(), "MissingSemicolon");
}

#[test]
fn unexpected_token_reports_parse_error_and_resyncs() {
    let (tokens, _) = lex("CREATE TABLE ; SELECT * FROM s;");
    let results = parse_statements(&tokens);
    assert!(results[0].is_err());
    assert_eq!(results[0].as_ref().unwrap_err().kind(), "UnexpectedToken");
    assert!(results[1].is_ok());
}
