//! Syntax errors and the error stack.
//!
//! Every failed terminal match, alternative or rule during a parse pushes one
//! [`SyntaxError`]. Most of them are ordinary backtracking and never reach the
//! caller; the stack keeps all of them so a failed parse can be explained
//! afterwards.

use std::fmt;

use serde::Serialize;

use crate::diagnostics::EmptyStack;
use crate::lexer::Position;

// ============================================================================
// SYNTAX ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyntaxErrorKind {
    /// Something was required but the input ended or nothing matched.
    ExpectedToken,
    /// A token exists at the position but belongs to another terminal.
    UnexpectedToken,
}

impl SyntaxErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxErrorKind::ExpectedToken => "EXPECTED_TOKEN",
            SyntaxErrorKind::UnexpectedToken => "UNEXPECTED_TOKEN",
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parse failure record. Never mutated once pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>, at: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            index: at.index,
            line: at.line,
            column: at.column,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            index: self.index,
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.message, self.line, self.column)
    }
}

// ============================================================================
// ERROR STACK
// ============================================================================

/// Append-only record of the syntax errors of the most recent parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorStack {
    errors: Vec<SyntaxError>,
}

impl ErrorStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: SyntaxError) {
        self.errors.push(error);
    }

    /// The most recently pushed error.
    pub fn last(&self) -> Result<&SyntaxError, EmptyStack> {
        self.errors.last().ok_or(EmptyStack)
    }

    /// The error recorded furthest into the input; the latest one wins ties.
    pub fn furthest(&self) -> Option<&SyntaxError> {
        self.errors.iter().max_by_key(|error| error.index)
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors from oldest to most recent.
    pub fn iter(&self) -> std::slice::Iter<'_, SyntaxError> {
        self.errors.iter()
    }
}

impl<'a> IntoIterator for &'a ErrorStack {
    type Item = &'a SyntaxError;
    type IntoIter = std::slice::Iter<'a, SyntaxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
