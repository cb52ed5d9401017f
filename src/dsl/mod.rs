//! The `.lzb` configuration language.
//!
//! ```text
//! # comments run to end of line
//! name = "demo"
//! source = "src"
//! if windows {
//!     lib = "ws2_32"
//! } else {
//!     lib = "m"
//! }
//! ```
//!
//! Text is tokenized, parsed into an [`Expr`] tree, then evaluated against a
//! platform identity and the environment into a flat [`ConfigMap`].

mod eval;
mod parser;

pub use eval::{ConfigMap, EnvSource, EvalContext, evaluate};
pub use parser::{Expr, parse_tokens};

use crate::error::ParseError;
use crate::tokenizer::Tokenizer;
use crate::tokenizer::extensions::{KeywordMatcher, LineCommentMatcher, StringLiteralMatcher};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Syntax,
    Name,
    Comment,
    String,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Syntax => "symbol",
            TokenKind::Name => "name",
            TokenKind::Comment => "comment",
            TokenKind::String => "string literal",
        }
    }
}

static LEXER: LazyLock<Tokenizer<TokenKind>> = LazyLock::new(|| {
    Tokenizer::new()
        .matcher(TokenKind::Keyword, KeywordMatcher::new(["if", "else"]))
        .pattern(TokenKind::Syntax, "[{}=]")
        .and_then(|t| t.pattern(TokenKind::Name, "[@_][@_#]*"))
        .expect("built-in DSL patterns are valid")
        .ignore(TokenKind::Comment, LineCommentMatcher::new("#"))
        .matcher(TokenKind::String, StringLiteralMatcher)
});

pub fn lexer() -> &'static Tokenizer<TokenKind> {
    &LEXER
}

/// Tokenize and parse config text into its top-level block.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = lexer().tokenize(text);
    parse_tokens(&tokens)
}

/// Parse and evaluate in one step.
pub fn load_str(text: &str, ctx: &EvalContext) -> Result<ConfigMap, ParseError> {
    let tree = parse(text)?;
    Ok(evaluate(&tree, ctx))
}
