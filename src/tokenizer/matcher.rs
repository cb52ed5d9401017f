//! Matcher combinators and the compact pattern syntax that builds them.
//!
//! | Pattern | Meaning                              |
//! |---------|--------------------------------------|
//! | `x`     | the literal character `x`            |
//! | `@`     | any ASCII letter                     |
//! | `#`     | any ASCII digit                      |
//! | `~`     | any printable ASCII character        |
//! | `\x`    | `x` taken literally                  |
//! | `(..)`  | a sequence                           |
//! | `[..]`  | an alternation, one branch per atom  |
//! | `a*`    | zero or more `a`                     |
//! | `a?`    | optional `a`                         |
//!
//! Inside `[...]` the modifiers `*` and `?` are plain characters, so `[*?]`
//! matches either of them.

use crate::error::PatternError;

/// Anything that can recognize a prefix of `text` starting at `pos`.
///
/// On success `pos` is moved past the match. On failure `pos` is left where
/// it was.
pub trait Matcher: Send + Sync {
    fn matches(&self, text: &str, pos: &mut usize) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchNode {
    Literal(char),
    Range(char, char),
    Alternation(Vec<MatchNode>),
    Sequence(Vec<MatchNode>),
    Repeat(Box<MatchNode>),
    Optional(Box<MatchNode>),
}

impl Matcher for MatchNode {
    fn matches(&self, text: &str, pos: &mut usize) -> bool {
        match self {
            MatchNode::Literal(expected) => match char_at(text, *pos) {
                Some(c) if c == *expected => {
                    *pos += c.len_utf8();
                    true
                }
                _ => false,
            },
            MatchNode::Range(lo, hi) => match char_at(text, *pos) {
                Some(c) if (*lo..=*hi).contains(&c) => {
                    *pos += c.len_utf8();
                    true
                }
                _ => false,
            },
            MatchNode::Alternation(branches) => {
                for branch in branches {
                    let mut cursor = *pos;
                    if branch.matches(text, &mut cursor) {
                        *pos = cursor;
                        return true;
                    }
                }
                false
            }
            MatchNode::Sequence(nodes) => {
                let mut cursor = *pos;
                for node in nodes {
                    if !node.matches(text, &mut cursor) {
                        return false;
                    }
                }
                *pos = cursor;
                true
            }
            MatchNode::Repeat(inner) => {
                loop {
                    let before = *pos;
                    if !inner.matches(text, pos) || *pos == before {
                        break;
                    }
                }
                true
            }
            MatchNode::Optional(inner) => {
                inner.matches(text, pos);
                true
            }
        }
    }
}

fn char_at(text: &str, pos: usize) -> Option<char> {
    text.get(pos..).and_then(|rest| rest.chars().next())
}

/// Compile a pattern into a matcher tree.
///
/// Unclosed `(` and `[` are closed implicitly at the end of the pattern.
pub fn compile(pattern: &str) -> Result<MatchNode, PatternError> {
    let mut parser = PatternParser {
        chars: pattern.chars().collect(),
        pos: 0,
    };
    parser.sequence(false)
}

struct PatternParser {
    chars: Vec<char>,
    pos: usize,
}

impl PatternParser {
    fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn escaped(&mut self) -> Result<MatchNode, PatternError> {
        self.next()
            .map(MatchNode::Literal)
            .ok_or(PatternError::TrailingEscape)
    }

    fn sequence(&mut self, nested: bool) -> Result<MatchNode, PatternError> {
        let mut nodes: Vec<MatchNode> = Vec::new();
        while let Some(c) = self.next() {
            match c {
                ')' if nested => break,
                ')' => return Err(PatternError::UnmatchedClose(self.pos - 1)),
                '*' | '?' => {
                    let last = nodes
                        .pop()
                        .ok_or(PatternError::DanglingModifier(c, self.pos - 1))?;
                    nodes.push(if c == '*' {
                        MatchNode::Repeat(Box::new(last))
                    } else {
                        MatchNode::Optional(Box::new(last))
                    });
                }
                '(' => nodes.push(self.sequence(true)?),
                '[' => nodes.push(self.alternation()?),
                '\\' => nodes.push(self.escaped()?),
                other => nodes.push(atom(other)),
            }
        }
        Ok(collapse(nodes, MatchNode::Sequence))
    }

    fn alternation(&mut self) -> Result<MatchNode, PatternError> {
        let mut branches = Vec::new();
        while let Some(c) = self.next() {
            match c {
                ']' => break,
                '(' => branches.push(self.sequence(true)?),
                '[' => branches.push(self.alternation()?),
                '\\' => branches.push(self.escaped()?),
                other => branches.push(atom(other)),
            }
        }
        Ok(collapse(branches, MatchNode::Alternation))
    }
}

fn collapse(mut nodes: Vec<MatchNode>, wrap: fn(Vec<MatchNode>) -> MatchNode) -> MatchNode {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        wrap(nodes)
    }
}

fn atom(c: char) -> MatchNode {
    match c {
        '@' => MatchNode::Alternation(vec![
            MatchNode::Range('a', 'z'),
            MatchNode::Range('A', 'Z'),
        ]),
        '#' => MatchNode::Range('0', '9'),
        '~' => MatchNode::Range(' ', '~'),
        other => MatchNode::Literal(other),
    }
}
