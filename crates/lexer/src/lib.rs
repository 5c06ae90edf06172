//! Hand-rolled lexer for the MoonSQL dialect.
//!
//! Recognizes keywords, identifiers, integer and single-quoted string
//! literals, the comparison/arithmetic operator set, and punctuation.
//! Whitespace and `--` line comments are skipped. Tracks 1-based line/column
//! so downstream phases can report source positions.

#[cfg(test)]
mod tests;

use common::DbError;

/// A single lexical token, tagged with the line/column its first character
/// started at.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub col: u32,
}

/// The kind of a recognized token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    IntLiteral(i64),
    StringLiteral(String),

    // Operators
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,

    // Punctuation
    LParen,
    RParen,
    Comma,
    Semicolon,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Keyword(kw) => write!(f, "{kw}"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::IntLiteral(n) => write!(f, "integer {n}"),
            TokenKind::StringLiteral(s) => write!(f, "string '{s}'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::NotEq => write!(f, "'<>'"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Reserved words of the dialect, matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Create,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Delete,
    And,
    Or,
    Not,
    Null,
    True,
    False,
    Int,
    Varchar,
    Boolean,
    Primary,
    Key,
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Keyword {
    fn from_str(s: &str) -> Option<Keyword> {
        let upper = s.to_ascii_uppercase();
        Some(match upper.as_str() {
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "DELETE" => Keyword::Delete,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "NULL" => Keyword::Null,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            "INT" => Keyword::Int,
            "VARCHAR" => Keyword::Varchar,
            "BOOLEAN" => Keyword::Boolean,
            "PRIMARY" => Keyword::Primary,
            "KEY" => Keyword::Key,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Delete => "DELETE",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::Null => "NULL",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Int => "INT",
            Keyword::Varchar => "VARCHAR",
            Keyword::Boolean => "BOOLEAN",
            Keyword::Primary => "PRIMARY",
            Keyword::Key => "KEY",
        }
    }
}

fn lex_err(line: u32, col: u32, ch: char) -> DbError {
    DbError::Lex {
        kind: "UnexpectedChar",
        line,
        col,
        message: format!("unexpected character '{ch}' at {line}:{col}"),
    }
}

fn unterminated_string_err(line: u32, col: u32) -> DbError {
    DbError::Lex {
        kind: "UnterminatedString",
        line,
        col,
        message: format!("unterminated string literal starting at {line}:{col}"),
    }
}

/// Lexes the full source text in one pass, collecting every `LexError` it
/// encounters rather than stopping at the first one: on an unclassifiable
/// character it records the error and resynchronizes by skipping to the
/// next whitespace.
pub fn lex(source: &str) -> (Vec<Token>, Vec<DbError>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    loop {
        match lexer.next_token() {
            Ok(tok) => {
                let is_eof = tok.kind == TokenKind::Eof;
                tokens.push(tok);
                if is_eof {
                    break;
                }
            }
            Err(e) => {
                errors.push(e);
                lexer.resync();
            }
        }
    }

    (tokens, errors)
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    _source: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            _source: source,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Recovery for `LexError`: skip forward to the next whitespace so a
    /// single bad character doesn't derail the rest of the pass.
    fn resync(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, DbError> {
        self.skip_trivia();

        let (start_line, start_col) = (self.line, self.col);
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: start_line,
                col: start_col,
            });
        };

        if c.is_ascii_digit() {
            return Ok(self.lex_number(start_line, start_col));
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.lex_ident_or_keyword(start_line, start_col));
        }
        if c == '\'' {
            return self.lex_string(start_line, start_col);
        }

        self.lex_operator_or_punct(c, start_line, start_col)
    }

    fn lex_number(&mut self, line: u32, col: u32) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let value: i64 = lexeme.parse().unwrap_or(0);
        Token {
            kind: TokenKind::IntLiteral(value),
            lexeme,
            line,
            col,
        }
    }

    fn lex_ident_or_keyword(&mut self, line: u32, col: u32) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match Keyword::from_str(&lexeme) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        Token { kind, lexeme, line, col }
    }

    /// Consumes a single-quoted string literal; `''` inside the literal is
    /// an escaped literal quote.
    fn lex_string(&mut self, line: u32, col: u32) -> Result<Token, DbError> {
        self.advance(); // opening quote
        let mut value = String::new();
        let mut raw = String::from("'");

        loop {
            match self.peek() {
                None => return Err(unterminated_string_err(line, col)),
                Some('\'') => {
                    self.advance();
                    raw.push('\'');
                    if self.peek() == Some('\'') {
                        value.push('\'');
                        raw.push('\'');
                        self.advance();
                        continue;
                    }
                    break;
                }
                Some(c) => {
                    value.push(c);
                    raw.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token {
            kind: TokenKind::StringLiteral(value),
            lexeme: raw,
            line,
            col,
        })
    }

    fn lex_operator_or_punct(&mut self, c: char, line: u32, col: u32) -> Result<Token, DbError> {
        macro_rules! one {
            ($kind:expr) => {{
                self.advance();
                Ok(Token {
                    kind: $kind,
                    lexeme: c.to_string(),
                    line,
                    col,
                })
            }};
        }

        match c {
            '(' => one!(TokenKind::LParen),
            ')' => one!(TokenKind::RParen),
            ',' => one!(TokenKind::Comma),
            ';' => one!(TokenKind::Semicolon),
            '+' => one!(TokenKind::Plus),
            '-' => one!(TokenKind::Minus),
            '*' => one!(TokenKind::Star),
            '/' => one!(TokenKind::Slash),
            '=' => one!(TokenKind::Eq),
            '<' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(Token {
                            kind: TokenKind::LtEq,
                            lexeme: "<=".into(),
                            line,
                            col,
                        })
                    }
                    Some('>') => {
                        self.advance();
                        Ok(Token {
                            kind: TokenKind::NotEq,
                            lexeme: "<>".into(),
                            line,
                            col,
                        })
                    }
                    _ => Ok(Token {
                        kind: TokenKind::Lt,
                        lexeme: "<".into(),
                        line,
                        col,
                    }),
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token {
                        kind: TokenKind::GtEq,
                        lexeme: ">=".into(),
                        line,
                        col,
                    })
                } else {
                    Ok(Token {
                        kind: TokenKind::Gt,
                        lexeme: ">".into(),
                        line,
                        col,
                    })
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token {
                        kind: TokenKind::NotEq,
                        lexeme: "!=".into(),
                        line,
                        col,
                    })
                } else {
                    Err(lex_err(line, col, c))
                }
            }
            other => {
                self.advance();
                Err(lex_err(line, col, other))
            }
        }
    }
}
