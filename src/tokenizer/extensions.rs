//! Hand-written matchers for token classes the pattern syntax cannot express.

use super::matcher::Matcher;

/// Matches the first listed word found at the cursor.
///
/// A word followed directly by an identifier character is not a keyword, so
/// `iffy` is left for the name rule.
pub struct KeywordMatcher {
    words: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl Matcher for KeywordMatcher {
    fn matches(&self, text: &str, pos: &mut usize) -> bool {
        let Some(rest) = text.get(*pos..) else {
            return false;
        };
        for word in &self.words {
            if let Some(after) = rest.strip_prefix(word.as_str()) {
                let continues = after
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                if !continues {
                    *pos += word.len();
                    return true;
                }
            }
        }
        false
    }
}

/// A prefix followed by everything up to, not including, the next newline.
pub struct LineCommentMatcher {
    prefix: String,
}

impl LineCommentMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for LineCommentMatcher {
    fn matches(&self, text: &str, pos: &mut usize) -> bool {
        let Some(rest) = text.get(*pos..) else {
            return false;
        };
        if !rest.starts_with(self.prefix.as_str()) {
            return false;
        }
        *pos += rest.find('\n').unwrap_or(rest.len());
        true
    }
}

/// A double-quoted literal where `\` escapes the following character.
pub struct StringLiteralMatcher;

impl Matcher for StringLiteralMatcher {
    fn matches(&self, text: &str, pos: &mut usize) -> bool {
        let Some(rest) = text.get(*pos..) else {
            return false;
        };
        let mut chars = rest.char_indices();
        if !matches!(chars.next(), Some((_, '"'))) {
            return false;
        }
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => {
                    *pos += offset + 1;
                    return true;
                }
                _ => {}
            }
        }
        false
    }
}
