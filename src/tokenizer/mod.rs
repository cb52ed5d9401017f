//! Rule-driven tokenizer.
//!
//! A [`Tokenizer`] holds an ordered list of rules. At every position the
//! first rule that consumes at least one character wins; characters no rule
//! accepts are skipped without a token or an error.

pub mod extensions;
pub mod matcher;

use crate::error::PatternError;
pub use matcher::{MatchNode, Matcher, compile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    pub kind: K,
    /// Byte offset into the tokenized text.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based byte column within the line.
    pub column: usize,
    pub text: String,
}

impl<K: PartialEq> Token<K> {
    pub fn is(&self, kind: K) -> bool {
        self.kind == kind
    }

    pub fn is_text(&self, kind: K, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

pub struct Rule<K> {
    pub kind: K,
    pub matcher: Box<dyn Matcher>,
    pub ignored: bool,
}

pub struct Tokenizer<K> {
    rules: Vec<Rule<K>>,
}

impl<K> Default for Tokenizer<K> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<K: Copy> Tokenizer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule built from the pattern syntax.
    pub fn pattern(mut self, kind: K, pattern: &str) -> Result<Self, PatternError> {
        let node = compile(pattern)?;
        self.rules.push(Rule {
            kind,
            matcher: Box::new(node),
            ignored: false,
        });
        Ok(self)
    }

    pub fn matcher(mut self, kind: K, matcher: impl Matcher + 'static) -> Self {
        self.rules.push(Rule {
            kind,
            matcher: Box::new(matcher),
            ignored: false,
        });
        self
    }

    /// Like [`Tokenizer::matcher`], but matched text produces no token.
    pub fn ignore(mut self, kind: K, matcher: impl Matcher + 'static) -> Self {
        self.rules.push(Rule {
            kind,
            matcher: Box::new(matcher),
            ignored: true,
        });
        self
    }

    pub fn rules(&self) -> &[Rule<K>] {
        &self.rules
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token<K>> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        let mut line = 1;
        let mut line_start = 0;

        while pos < text.len() {
            let start = pos;
            let hit = self.rules.iter().find(|rule| {
                pos = start;
                rule.matcher.matches(text, &mut pos) && pos > start
            });

            match hit {
                Some(rule) => {
                    if !rule.ignored {
                        tokens.push(Token {
                            kind: rule.kind,
                            offset: start,
                            len: pos - start,
                            line,
                            column: start - line_start + 1,
                            text: text[start..pos].to_string(),
                        });
                    }
                }
                None => {
                    // Skip one character, keeping `pos` on a char boundary.
                    pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
                }
            }

            for (i, b) in text.as_bytes()[start..pos].iter().enumerate() {
                if *b == b'\n' {
                    line += 1;
                    line_start = start + i + 1;
                }
            }
        }
        tokens
    }
}

/// Forward-only view over a token stream used by recursive-descent parsers.
///
/// `None` from [`TokenCursor::peek`] is the end-of-stream lookahead.
pub struct TokenCursor<'t, K> {
    tokens: &'t [Token<K>],
    index: usize,
}

impl<'t, K> TokenCursor<'t, K> {
    pub fn new(tokens: &'t [Token<K>]) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn peek(&self) -> Option<&'t Token<K>> {
        self.tokens.get(self.index)
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub fn advance(&mut self) -> Option<&'t Token<K>> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }
}
