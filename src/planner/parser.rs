//! Query text parser
//!
//! Grammar (keywords case-insensitive):
//!
//! ```text
//! query     := SELECT select FROM ident [WHERE cond (AND cond)*]
//!              [ORDER BY term (, term)*] [;]
//! select    := * | ident (, ident)*
//! cond      := ident op literal | ident IS [NOT] NULL
//! op        := = | != | <> | < | <= | > | >=
//! term      := ident [ASC | DESC] [NULLS (FIRST | LAST)]
//! literal   := integer | float | 'text' | TRUE | FALSE | NULL
//! ```

use super::ast::{Condition, OrderTerm, Query, SelectList};
use super::errors::{PlannerError, PlannerResult};
use super::expr::{FilterOp, NullOrdering, SortDirection};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Comma,
    Star,
    Semicolon,
    Op(&'static str),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    pos: usize,
}

/// Parses query text into a [`Query`]
pub fn parse_query(text: &str) -> PlannerResult<Query> {
    let tokens = tokenize(text)?;
    Parser {
        tokens,
        pos: 0,
        end: text.len(),
    }
    .query()
}

fn tokenize(text: &str) -> PlannerResult<Vec<Spanned>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            b',' => {
                i += 1;
                Token::Comma
            }
            b'*' => {
                i += 1;
                Token::Star
            }
            b';' => {
                i += 1;
                Token::Semicolon
            }
            b'=' => {
                i += 1;
                Token::Op("=")
            }
            b'!' if bytes.get(i + 1) == Some(&b'=') => {
                i += 2;
                Token::Op("!=")
            }
            b'<' => match bytes.get(i + 1) {
                Some(b'=') => {
                    i += 2;
                    Token::Op("<=")
                }
                Some(b'>') => {
                    i += 2;
                    Token::Op("!=")
                }
                _ => {
                    i += 1;
                    Token::Op("<")
                }
            },
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Op(">=")
                } else {
                    i += 1;
                    Token::Op(">")
                }
            }
            b'\'' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match text[i..].find('\'') {
                        None => return Err(PlannerError::parse(start, "unterminated string")),
                        Some(offset) => {
                            value.push_str(&text[i..i + offset]);
                            i += offset + 1;
                            // '' escapes a quote
                            if bytes.get(i) == Some(&b'\'') {
                                value.push('\'');
                                i += 1;
                            } else {
                                break;
                            }
                        }
                    }
                }
                Token::Str(value)
            }
            b'0'..=b'9' | b'-' => {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let literal = &text[start..i];
                if literal.contains('.') {
                    let value = literal
                        .parse::<f64>()
                        .map_err(|_| PlannerError::parse(start, format!("invalid number '{}'", literal)))?;
                    Token::Float(value)
                } else {
                    let value = literal
                        .parse::<i64>()
                        .map_err(|_| PlannerError::parse(start, format!("invalid number '{}'", literal)))?;
                    Token::Int(value)
                }
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                Token::Ident(text[start..i].to_string())
            }
            _ => {
                let found = text[start..].chars().next().unwrap_or('?');
                return Err(PlannerError::parse(
                    start,
                    format!("unexpected character '{}'", found),
                ));
            }
        };

        tokens.push(Spanned { token, pos: start });
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn query(mut self) -> PlannerResult<Query> {
        self.expect_keyword("SELECT")?;
        let select = self.select_list()?;
        self.expect_keyword("FROM")?;
        let table = self.ident("table name")?;

        let mut query = Query {
            select,
            table,
            conditions: Vec::new(),
            order_by: Vec::new(),
        };

        if self.eat_keyword("WHERE") {
            loop {
                query.conditions.push(self.condition()?);
                if !self.eat_keyword("AND") {
                    break;
                }
            }
        }

        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                query.order_by.push(self.order_term()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        self.eat(&Token::Semicolon);
        match self.tokens.get(self.pos) {
            None => Ok(query),
            Some(extra) => Err(PlannerError::parse(
                extra.pos,
                format!("unexpected trailing input {}", describe(&extra.token)),
            )),
        }
    }

    fn select_list(&mut self) -> PlannerResult<SelectList> {
        if self.eat(&Token::Star) {
            return Ok(SelectList::All);
        }
        let mut columns = vec![self.ident("column name")?];
        while self.eat(&Token::Comma) {
            columns.push(self.ident("column name")?);
        }
        Ok(SelectList::Columns(columns))
    }

    fn condition(&mut self) -> PlannerResult<Condition> {
        let column = self.ident("column name")?;

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            let op = if negated {
                FilterOp::IsNotNull
            } else {
                FilterOp::IsNull
            };
            return Ok(Condition::new(column, op));
        }

        let pos = self.position();
        let op = match self.advance() {
            Some(Token::Op(op)) => op,
            other => return Err(self.unexpected(pos, other.as_ref(), "comparison operator")),
        };
        let value = self.literal()?;

        let op = match op {
            "=" => FilterOp::Eq(value),
            "!=" => FilterOp::Ne(value),
            "<" => FilterOp::Lt(value),
            "<=" => FilterOp::Lte(value),
            ">" => FilterOp::Gt(value),
            _ => FilterOp::Gte(value),
        };
        Ok(Condition::new(column, op))
    }

    fn literal(&mut self) -> PlannerResult<Value> {
        let pos = self.position();
        match self.advance() {
            Some(Token::Int(i)) => Ok(Value::Int(i)),
            Some(Token::Float(f)) => Ok(Value::Float(f)),
            Some(Token::Str(s)) => Ok(Value::Text(s)),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("TRUE") => Ok(Value::Bool(true)),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("FALSE") => Ok(Value::Bool(false)),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("NULL") => Ok(Value::Null),
            other => Err(self.unexpected(pos, other.as_ref(), "literal")),
        }
    }

    fn order_term(&mut self) -> PlannerResult<OrderTerm> {
        let column = self.ident("column name")?;
        let direction = if self.eat_keyword("DESC") {
            SortDirection::Descending
        } else {
            self.eat_keyword("ASC");
            SortDirection::Ascending
        };

        let nulls = if self.eat_keyword("NULLS") {
            if self.eat_keyword("FIRST") {
                Some(NullOrdering::NullsFirst)
            } else {
                self.expect_keyword("LAST")?;
                Some(NullOrdering::NullsLast)
            }
        } else {
            None
        };

        Ok(OrderTerm {
            column,
            direction,
            nulls,
        })
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.tokens.get(self.pos).map(|t| &t.token) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.tokens.get(self.pos) {
            Some(Spanned {
                token: Token::Ident(word),
                ..
            }) if word.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> PlannerResult<()> {
        if self.eat_keyword(keyword) {
            return Ok(());
        }
        let pos = self.position();
        let found = self.tokens.get(self.pos).map(|t| t.token.clone());
        Err(self.unexpected(pos, found.as_ref(), keyword))
    }

    fn ident(&mut self, what: &str) -> PlannerResult<String> {
        let pos = self.position();
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(self.unexpected(pos, other.as_ref(), what)),
        }
    }

    fn unexpected(&self, pos: usize, found: Option<&Token>, expected: &str) -> PlannerError {
        let found = found.map_or_else(|| "end of input".to_string(), describe);
        PlannerError::parse(pos, format!("expected {}, found {}", expected, found))
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("'{}'", name),
        Token::Int(i) => i.to_string(),
        Token::Float(f) => f.to_string(),
        Token::Str(s) => format!("'{}'", s),
        Token::Comma => "','".into(),
        Token::Star => "'*'".into(),
        Token::Semicolon => "';'".into(),
        Token::Op(op) => format!("'{}'", op),
    }
}
