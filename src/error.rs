//! Error types shared across the build engine.
//!
//! Parse failures abort a config load, compile and link failures fail a pass,
//! filesystem failures are reported at the boundary where they happen.

use std::path::PathBuf;
use thiserror::Error;

/// A pattern string that cannot be turned into a matcher tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("'{0}' at offset {1} has no atom to apply to")]
    DanglingModifier(char, usize),

    #[error("escape at end of pattern")]
    TrailingEscape,

    #[error("unmatched ')' at offset {0}")]
    UnmatchedClose(usize),
}

/// A malformed token sequence in a config file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected token '{found}' at {line}:{column}, expected {expected}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
        expected: &'static str,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{failed} translation unit(s) failed to compile")]
    Compile { failed: usize },

    #[error("failed to create {}", binary.display())]
    Link { binary: PathBuf, output: String },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
