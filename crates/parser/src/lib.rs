//! Recursive-descent parser for the MoonSQL dialect.
//!
//! Consumes the token stream `lexer::lex` produces and builds an AST for
//! exactly four top-level statements (CREATE TABLE, INSERT, SELECT, DELETE),
//! each terminated by `;`. A single statement's parse error does not corrupt
//! parsing of subsequent statements: on failure the parser resynchronizes by
//! consuming up to the next `;`.

pub mod ast;
#[cfg(test)]
mod tests;

use ast::{ColumnDef, SelectItem, Statement};
use common::DbError;
use expr::{BinaryOp, Expr, UnaryOp};
use lexer::{Keyword, Token, TokenKind};
use types::{SqlType, Value};

fn parse_err(tok: &Token, expected: &[&str]) -> DbError {
    DbError::Parse {
        kind: "UnexpectedToken",
        line: tok.line,
        col: tok.col,
        message: format!(
            "expected one of [{}], got {}",
            expected.join(", "),
            tok.kind
        ),
    }
}

fn missing_semicolon_err(tok: &Token) -> DbError {
    DbError::Parse {
        kind: "MissingSemicolon",
        line: tok.line,
        col: tok.col,
        message: format!("expected ';' after statement, got {}", tok.kind),
    }
}

/// Parses every statement in `source`, collecting a result (`Statement` or
/// `DbError`) per statement. A parse failure resynchronizes to the next `;`
/// so later statements still parse.
pub fn parse_statements(tokens: &[Token]) -> Vec<Result<Statement, DbError>> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut results = Vec::new();

    while !parser.at_eof() {
        match parser.parse_statement() {
            Ok(stmt) => {
                results.push(Ok(stmt));
                match parser.expect(TokenKind::Semicolon) {
                    Ok(_) => {}
                    Err(_) => {
                        let tok = parser.peek().clone();
                        results.push(Err(missing_semicolon_err(&tok)));
                        parser.resync();
                    }
                }
            }
            Err(e) => {
                results.push(Err(e));
                parser.resync();
            }
        }
    }

    results
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, DbError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(parse_err(self.peek(), &[&kind.to_string()]))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token, DbError> {
        if self.peek().kind == TokenKind::Keyword(kw) {
            Ok(self.advance())
        } else {
            Err(parse_err(self.peek(), &[kw.as_str()]))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, DbError> {
        if self.peek().kind == TokenKind::Identifier {
            Ok(self.advance().lexeme)
        } else {
            Err(parse_err(self.peek(), &["identifier"]))
        }
    }

    /// Resynchronization for a statement-level parse error: consume tokens
    /// up to and including the next `;` (or EOF).
    fn resync(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, DbError> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Create) => self.parse_create_table(),
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert(),
            TokenKind::Keyword(Keyword::Select) => self.parse_select(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(),
            _ => Err(parse_err(self.peek(), &["CREATE", "INSERT", "SELECT", "DELETE"])),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement, DbError> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if self.peek().kind == TokenKind::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenKind::RParen)?;

        let primary_key: Vec<String> = columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect();

        Ok(Statement::CreateTable {
            name,
            columns,
            primary_key: if primary_key.is_empty() {
                None
            } else {
                Some(primary_key)
            },
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, DbError> {
        let name = self.expect_identifier()?;
        let ty = self.parse_sql_type()?;

        let mut not_null = false;
        let mut primary_key = false;

        loop {
            match &self.peek().kind {
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    not_null = true;
                }
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    primary_key = true;
                    not_null = true;
                }
                _ => break,
            }
        }

        Ok(ColumnDef {
            name,
            ty,
            not_null,
            primary_key,
        })
    }

    fn parse_sql_type(&mut self) -> Result<SqlType, DbError> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => {
                self.advance();
                Ok(SqlType::Int)
            }
            TokenKind::Keyword(Keyword::Boolean) => {
                self.advance();
                Ok(SqlType::Bool)
            }
            TokenKind::Keyword(Keyword::Varchar) => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let len_tok = self.advance();
                let len = match len_tok.kind {
                    TokenKind::IntLiteral(n) if n >= 0 && n <= u16::MAX as i64 => n as u16,
                    _ => return Err(parse_err(&len_tok, &["VARCHAR length"])),
                };
                self.expect(TokenKind::RParen)?;
                Ok(SqlType::Varchar(len))
            }
            _ => Err(parse_err(self.peek(), &["INT", "VARCHAR(n)", "BOOLEAN"])),
        }
    }

    fn parse_insert(&mut self) -> Result<Statement, DbError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;

        let columns = if self.peek().kind == TokenKind::LParen {
            self.advance();
            let mut names = Vec::new();
            loop {
                names.push(self.expect_identifier()?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(TokenKind::RParen)?;
            Some(names)
        } else {
            None
        };

        self.expect_keyword(Keyword::Values)?;

        let mut rows = Vec::new();
        loop {
            self.expect(TokenKind::LParen)?;
            let mut values = Vec::new();
            loop {
                values.push(self.parse_literal_expr()?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(TokenKind::RParen)?;
            rows.push(values);

            if self.peek().kind == TokenKind::Comma {
                self.advance();
                continue;
            }
            break;
        }

        Ok(Statement::Insert { table, columns, rows })
    }

    fn parse_literal_expr(&mut self) -> Result<Expr, DbError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::IntLiteral(n) => Ok(Expr::Literal(Value::Int(n))),
            TokenKind::StringLiteral(s) => Ok(Expr::Literal(Value::Text(s))),
            TokenKind::Keyword(Keyword::Null) => Ok(Expr::Literal(Value::Null)),
            TokenKind::Keyword(Keyword::True) => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::Keyword(Keyword::False) => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Minus => {
                let inner = self.advance();
                match inner.kind {
                    TokenKind::IntLiteral(n) => Ok(Expr::Literal(Value::Int(-n))),
                    _ => Err(parse_err(&inner, &["integer literal"])),
                }
            }
            _ => Err(parse_err(&tok, &["literal"])),
        }
    }

    fn parse_select(&mut self) -> Result<Statement, DbError> {
        self.expect_keyword(Keyword::Select)?;

        let items = if self.peek().kind == TokenKind::Star {
            self.advance();
            vec![SelectItem::Wildcard]
        } else {
            let mut items = Vec::new();
            loop {
                items.push(SelectItem::Column(self.expect_identifier()?));
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            items
        };

        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;

        let selection = if self.peek().kind == TokenKind::Keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Statement::Select { items, table, selection })
    }

    fn parse_delete(&mut self) -> Result<Statement, DbError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;

        let selection = if self.peek().kind == TokenKind::Keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Statement::Delete { table, selection })
    }

    // Expression grammar, lowest to highest precedence:
    // OR, AND, NOT, comparison, additive, multiplicative, unary minus, primary.
    fn parse_expr(&mut self) -> Result<Expr, DbError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, DbError> {
        let mut left = self.parse_and()?;
        while self.peek().kind == TokenKind::Keyword(Keyword::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, DbError> {
        let mut left = self.parse_not()?;
        while self.peek().kind == TokenKind::Keyword(Keyword::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, DbError> {
        if self.peek().kind == TokenKind::Keyword(Keyword::Not) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(inner),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, DbError> {
        let left = self.parse_additive()?;
        let op = match self.peek().kind {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, DbError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, DbError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, DbError> {
        if self.peek().kind == TokenKind::Minus {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(inner),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, DbError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::IntLiteral(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(n)))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Text(s)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Column { name: tok.lexeme })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(parse_err(&tok, &["expression"])),
        }
    }
}
