use super::TokenKind;
use crate::error::ParseError;
use crate::tokenizer::{Token, TokenCursor};

type Cursor<'t> = TokenCursor<'t, TokenKind>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Assign {
        name: String,
        value: String,
    },
    Conditional {
        condition: String,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    Block(Vec<Expr>),
}

/// Parse a token stream as the implicit top-level block.
///
/// Any token out of place aborts the whole parse.
pub fn parse_tokens(tokens: &[Token<TokenKind>]) -> Result<Expr, ParseError> {
    let mut cursor = TokenCursor::new(tokens);
    let mut list = Vec::new();
    while let Some(token) = cursor.peek() {
        if token.is_text(TokenKind::Syntax, "}") {
            return Err(unexpected(token, "'if', a name or '{'"));
        }
        list.push(expression(&mut cursor)?);
    }
    Ok(Expr::Block(list))
}

fn expression(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    const EXPECTED: &str = "'if', a name or '{'";
    let token = cursor
        .peek()
        .ok_or(ParseError::UnexpectedEof { expected: EXPECTED })?;

    if token.is_text(TokenKind::Keyword, "if") {
        cursor.advance();
        conditional(cursor)
    } else if token.is(TokenKind::Name) {
        assignment(cursor)
    } else if token.is_text(TokenKind::Syntax, "{") {
        cursor.advance();
        block(cursor)
    } else {
        Err(unexpected(token, EXPECTED))
    }
}

fn conditional(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let condition = expect(cursor, TokenKind::Name, None, "a condition name")?;
    let then_branch = Box::new(expression(cursor)?);
    let else_branch = match cursor.peek() {
        Some(token) if token.is_text(TokenKind::Keyword, "else") => {
            cursor.advance();
            Some(Box::new(expression(cursor)?))
        }
        _ => None,
    };
    Ok(Expr::Conditional {
        condition: condition.text.clone(),
        then_branch,
        else_branch,
    })
}

fn assignment(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let name = expect(cursor, TokenKind::Name, None, "a name")?;
    expect(cursor, TokenKind::Syntax, Some("="), "'='")?;
    let value = expect(cursor, TokenKind::String, None, "a string literal")?;
    Ok(Expr::Assign {
        name: name.text.clone(),
        value: unquote(&value.text),
    })
}

fn block(cursor: &mut Cursor<'_>) -> Result<Expr, ParseError> {
    let mut list = Vec::new();
    loop {
        match cursor.peek() {
            None => return Err(ParseError::UnexpectedEof { expected: "'}'" }),
            Some(token) if token.is_text(TokenKind::Syntax, "}") => {
                cursor.advance();
                return Ok(Expr::Block(list));
            }
            Some(_) => list.push(expression(cursor)?),
        }
    }
}

fn expect<'t>(
    cursor: &mut Cursor<'t>,
    kind: TokenKind,
    text: Option<&str>,
    expected: &'static str,
) -> Result<&'t Token<TokenKind>, ParseError> {
    let token = cursor
        .advance()
        .ok_or(ParseError::UnexpectedEof { expected })?;
    let ok = match text {
        Some(text) => token.is_text(kind, text),
        None => token.is(kind),
    };
    if ok {
        Ok(token)
    } else {
        Err(unexpected(token, expected))
    }
}

fn unexpected(token: &Token<TokenKind>, expected: &'static str) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.text.clone(),
        line: token.line,
        column: token.column,
        expected,
    }
}

/// Strip the quotes of a string literal and resolve its escapes.
fn unquote(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
