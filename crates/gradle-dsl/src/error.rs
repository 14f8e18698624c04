//! Errors for parsing and editing Gradle build scripts.
//!
//! Three layers, matching how far a failure reaches:
//! - [`ParseError`]: structural problems (unterminated literals, unbalanced
//!   delimiters). Element boundaries become unknowable, so the whole document
//!   is rejected.
//! - [`Warning`]: statement-level problems. Parsing continues and the
//!   warning travels alongside the (partial) model.
//! - [`EditError`]: a structured edit could not be planned. Only that edit
//!   call fails.

use crate::position::Position;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal structural error in a build script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated string literal starting at {at}")]
    UnterminatedString { at: Position },

    #[error("unterminated block comment starting at {at}")]
    UnterminatedComment { at: Position },

    #[error("unmatched '{delimiter}' at {at}")]
    UnmatchedOpen { delimiter: char, at: Position },

    #[error("unexpected '{delimiter}' at {at}")]
    UnexpectedClose { delimiter: char, at: Position },

    #[error("expected '{expected}' but found '{found}' at {at}")]
    MismatchedDelimiter {
        expected: char,
        found: char,
        at: Position,
    },
}

impl ParseError {
    /// Position of the offending token.
    pub const fn position(&self) -> Position {
        match self {
            Self::UnterminatedString { at }
            | Self::UnterminatedComment { at }
            | Self::UnmatchedOpen { at, .. }
            | Self::UnexpectedClose { at, .. }
            | Self::MismatchedDelimiter { at, .. } => *at,
        }
    }

    /// Byte offset of the offending token.
    pub const fn offset(&self) -> usize {
        self.position().offset
    }
}

/// Non-fatal, statement-level diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    /// `None` when the warning was lifted from another file (sub-projects).
    pub at: Option<Position>,
}

impl Warning {
    pub fn new(message: impl Into<String>, at: Position) -> Self {
        Self {
            message: message.into(),
            at: Some(at),
        }
    }

    pub fn detached(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            at: None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.at {
            Some(at) => write!(f, "{}: {}", at, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Failure to plan or apply a structured edit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("no {element} matching '{key}' found")]
    NotFound { element: &'static str, key: String },

    #[error("{count} {element} declarations match '{key}'")]
    Ambiguous {
        element: &'static str,
        key: String,
        count: usize,
    },

    #[error("{element} '{key}' cannot be edited: {reason}")]
    NotEditable {
        element: &'static str,
        key: String,
        reason: String,
    },

    #[error("invalid replacement value '{value}': {reason}")]
    InvalidValue { value: String, reason: &'static str },

    #[error("edits overlap at offset {offset}")]
    OverlappingEdits { offset: usize },

    #[error("edit span {start}..{end} is outside the document or splits a character")]
    InvalidSpan { start: usize, end: usize },

    #[error("document has structural errors: {0}")]
    Parse(#[from] ParseError),
}

/// Crate-level error for operations touching the filesystem.
#[derive(Error, Debug)]
pub enum GradleError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no build or settings script in {}", dir.display())]
    NoBuildScript { dir: PathBuf },

    #[error("failed to read build script stream: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

pub type Result<T> = std::result::Result<T, GradleError>;
