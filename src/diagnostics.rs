//! Parsegen diagnostics
//!
//! # Overview
//!
//! Every failure Parsegen reports to a caller is one of the types in this
//! module. Display comes from `thiserror`; each type also implements
//! `miette::Diagnostic` so the binary can render codes, help and labeled
//! source snippets.
//!
//! - [`GrammarError`]: the grammar document could not be compiled. Always fatal
//!   to construction.
//! - [`ParseError`]: the input could not be parsed. Wraps the syntax error on
//!   top of the error stack.
//! - [`EmptyStack`]: the error stack was queried while empty.
//! - [`Error`]: union of the above plus I/O, for the command-line front end.
//!
//! Syntax errors recorded during backtracking live in [`crate::errors`]; they
//! are control flow, not diagnostics, until the whole parse fails.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::ast::Span;
use crate::errors::SyntaxError;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;

/// Type-safe error classification, mirroring the [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Grammar,
    Parse,
    EmptyStack,
    Io,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Grammar => "Grammar",
            ErrorType::Parse => "Parse",
            ErrorType::EmptyStack => "EmptyStack",
            ErrorType::Io => "Io",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// GRAMMAR ERRORS
// ============================================================================

/// A malformed or incomplete grammar document.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("the grammar must be an object with 'terminals' and 'rules' properties")]
    InvalidDocument,
    #[error("the '{section}' property is required in the grammar")]
    MissingSection { section: &'static str },
    #[error("the '{section}' property must be an array")]
    InvalidSection { section: &'static str },
    #[error("malformed {entry}: {reason}")]
    MalformedTerminal { entry: String, reason: String },
    #[error("invalid pattern for terminal `{name}`: {source}")]
    InvalidPattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("malformed {entry}: {reason}")]
    MalformedRule { entry: String, reason: String },
    #[error("malformed expression in rule `{rule}`: {reason}")]
    MalformedExpression {
        rule: String,
        expression: String,
        reason: String,
        span: Span,
    },
    #[error("unknown symbol `{symbol}` in rule `{rule}`")]
    UnknownSymbol {
        rule: String,
        symbol: String,
        expression: String,
        span: Span,
    },
    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
    #[error("no rules were specified, at least one rule is required")]
    NoRules,
    #[error("could not decode the {format} grammar: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },
    #[error("could not read grammar file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GrammarError {
    fn code_str(&self) -> &'static str {
        match self {
            GrammarError::InvalidDocument => "parsegen::grammar::document",
            GrammarError::MissingSection { .. } => "parsegen::grammar::missing_section",
            GrammarError::InvalidSection { .. } => "parsegen::grammar::invalid_section",
            GrammarError::MalformedTerminal { .. } => "parsegen::grammar::terminal",
            GrammarError::InvalidPattern { .. } => "parsegen::grammar::pattern",
            GrammarError::MalformedRule { .. } => "parsegen::grammar::rule",
            GrammarError::MalformedExpression { .. } => "parsegen::grammar::expression",
            GrammarError::UnknownSymbol { .. } => "parsegen::grammar::unknown_symbol",
            GrammarError::DuplicateName { .. } => "parsegen::grammar::duplicate",
            GrammarError::NoRules => "parsegen::grammar::no_rules",
            GrammarError::Decode { .. } => "parsegen::grammar::decode",
            GrammarError::Io { .. } => "parsegen::grammar::io",
        }
    }

    fn help_str(&self) -> Option<&'static str> {
        match self {
            GrammarError::InvalidDocument | GrammarError::MissingSection { .. } => Some(
                r#"a grammar looks like {"terminals": [{"name": ..., "regex": ...}], "rules": [{"name": ..., "expressions": [...]}]}"#,
            ),
            GrammarError::MalformedTerminal { .. } => {
                Some("each terminal needs a string 'name' and a string 'regex'")
            }
            GrammarError::MalformedRule { .. } => {
                Some("each rule needs a string 'name' and an 'expressions' array of strings")
            }
            GrammarError::MalformedExpression { .. } => Some(
                "expressions are whitespace-separated names, '( a | b )' groups and '?', '*', '+' suffixes",
            ),
            GrammarError::UnknownSymbol { .. } => {
                Some("names must refer to a declared terminal, a built-in terminal or a rule")
            }
            GrammarError::NoRules => Some("the first rule is the start symbol of the grammar"),
            _ => None,
        }
    }
}

impl Diagnostic for GrammarError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_str()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            GrammarError::MalformedExpression { expression, .. }
            | GrammarError::UnknownSymbol { expression, .. } => Some(expression as &dyn SourceCode),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (text, span, expression) = match self {
            GrammarError::MalformedExpression {
                reason,
                span,
                expression,
                ..
            } => (reason.clone(), *span, expression),
            GrammarError::UnknownSymbol {
                symbol,
                span,
                expression,
                ..
            } => (format!("`{}` is not defined", symbol), *span, expression),
            _ => return None,
        };
        let len = if span.start < expression.len() {
            span.len().max(1)
        } else {
            0
        };
        let label = LabeledSpan::new(Some(text), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// The top-level failure of a parse.
///
/// `error` is the most recently pushed syntax error; `furthest` is the error
/// recorded deepest into the input, which is usually where the input went wrong.
#[derive(Debug, Error)]
#[error("an error occurred while parsing the input: {error}")]
pub struct ParseError {
    pub error: SyntaxError,
    pub furthest: Option<SyntaxError>,
    input: SourceArc,
}

impl ParseError {
    pub fn new(error: SyntaxError, furthest: Option<SyntaxError>, input: &str) -> Self {
        Self {
            error,
            furthest,
            input: to_error_source("input", input),
        }
    }

    /// Replaces the source name shown in rendered reports.
    pub fn with_source_name(mut self, name: impl AsRef<str>) -> Self {
        let content = self.input.inner().clone();
        self.input = to_error_source(name, content);
        self
    }
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new("parsegen::parse"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(
            "inspect the error stack for every failed alternative",
        ))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.input.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let input_len = self.input.inner().len();
        let width = |index: usize| usize::from(index < input_len);
        let mut labels = vec![LabeledSpan::new(
            Some(self.error.message.clone()),
            self.error.index,
            width(self.error.index),
        )];
        // Related label
        if let Some(furthest) = self.furthest.as_ref().filter(|f| f.index != self.error.index) {
            labels.push(LabeledSpan::new(
                Some(furthest.message.clone()),
                furthest.index,
                width(furthest.index),
            ));
        }
        Some(Box::new(labels.into_iter()))
    }
}

/// Returned when the error stack is queried while nothing has been recorded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("the error stack is empty: no syntax error has been recorded")]
pub struct EmptyStack;

impl Diagnostic for EmptyStack {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new("parsegen::empty_stack"))
    }
}

// ============================================================================
// CRATE ERROR
// ============================================================================

/// Unified error type for the command-line front end.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    EmptyStack(#[from] EmptyStack),
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn error_type(&self) -> ErrorType {
        match self {
            Error::Grammar(_) => ErrorType::Grammar,
            Error::Parse(_) => ErrorType::Parse,
            Error::EmptyStack(_) => ErrorType::EmptyStack,
            Error::Io { .. } => ErrorType::Io,
        }
    }

    fn inner(&self) -> Option<&dyn Diagnostic> {
        match self {
            Error::Grammar(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::EmptyStack(e) => Some(e),
            Error::Io { .. } => None,
        }
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self.inner() {
            Some(inner) => inner.code(),
            None => Some(Box::new("parsegen::io")),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.inner().and_then(|inner| inner.help())
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.inner().and_then(|inner| inner.source_code())
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.inner().and_then(|inner| inner.labels())
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in reports.
pub fn to_error_source<N: AsRef<str>, S: AsRef<str>>(name: N, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}
