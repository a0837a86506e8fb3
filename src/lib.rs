pub use crate::diagnostics::{EmptyStack, Error, ErrorType, GrammarError, ParseError};
pub use crate::ast::{AstNode, Span};
pub use crate::engine::Parser;
pub use crate::errors::{ErrorStack, SyntaxError, SyntaxErrorKind};
pub use crate::grammar::{Element, Expression, Grammar, Rule, TerminalRule};
pub use crate::lexer::{Position, Token};

pub mod ast;
pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod grammar;
pub mod lexer;
