use super::*;
use pretty_assertions::assert_eq;

fn kinds(src: &str) -> Vec<TokenKind> {
    let (tokens, errors) = lex(src);
    assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
    tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_create_table_statement() {
    let kinds = kinds("CREATE TABLE t(id INT);");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword(Keyword::Create),
            TokenKind::Keyword(Keyword::Table),
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Keyword(Keyword::Int),
            TokenKind::RParen,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_are_case_insensitive() {
    let kinds = kinds("select * from t");
    assert_eq!(kinds[0], TokenKind::Keyword(Keyword::Select));
    assert_eq!(kinds[2], TokenKind::Keyword(Keyword::From));
}

#[test]
fn string_literal_with_escaped_quote() {
    let (tokens, errors) = lex("'it''s'");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral("it's".into()));
}

#[test]
fn integer_literal() {
    let (tokens, _) = lex("42");
    assert_eq!(tokens[0].kind, TokenKind::IntLiteral(42));
}

#[test]
fn comment_to_end_of_line_is_skipped() {
    let kinds = kinds("SELECT 1 -- trailing comment\nFROM t");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword(Keyword::Select),
            TokenKind::IntLiteral(1),
            TokenKind::Keyword(Keyword::From),
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn multi_char_operators() {
    let kinds = kinds("<= >= <> != < > =");
    assert_eq!(
        kinds,
        vec![
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::NotEq,
            TokenKind::NotEq,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Eq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn tracks_line_and_column() {
    let (tokens, _) = lex("SELECT\n  id");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[0].col, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[1].col, 3);
}

#[test]
fn unterminated_string_reports_lex_error() {
    let (_, errors) = lex("'abc");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), "UnterminatedString");
}

#[test]
fn unexpected_char_recovers_and_reports_multiple_errors() {
    let (_, errors) = lex("SELECT @ FROM t # WHERE x");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind() == "UnexpectedChar"));
}
