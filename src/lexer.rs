//! Parsegen Tokenizer
//!
//! Scans the input once per terminal rule, in table order, and merges every
//! match into a single stream ordered by start offset. Tokens of different
//! terminals that start at the same offset keep table order, so the
//! first-declared terminal always comes first.

use log::{debug, trace};
use serde::Serialize;

use crate::ast::Span;
use crate::grammar::TerminalRule;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A location in the input. `line` counts the newlines before `index`; `column`
/// is the distance from the last of them, or `index` itself on the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

/// One lexical match of a terminal rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Name of the originating terminal rule.
    pub terminal: String,
    /// Position of the originating terminal in the terminal table.
    #[serde(skip)]
    pub rule: usize,
    pub index: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub value: String,
}

/// Byte offsets of every `\n`, for offset to (line, column) lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    newlines: Vec<usize>,
    len: usize,
}

/// The token sequence of one parse together with the positional queries the
/// engine needs.
#[derive(Debug, Clone)]
pub struct TokenStream<'t> {
    tokens: &'t [Token],
    lines: LineIndex,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Tokenizes `input` against every terminal in `terminals`.
pub fn tokenize(terminals: &[TerminalRule], input: &str) -> Vec<Token> {
    let lines = LineIndex::new(input);
    let mut tokens = Vec::new();

    for (rule, terminal) in terminals.iter().enumerate() {
        let before = tokens.len();
        tokens.extend(
            terminal
                .regex()
                .find_iter(input)
                .filter(|m| !m.is_empty())
                .map(|m| {
                    let position = lines.position(m.start());
                    Token {
                        terminal: terminal.name().to_string(),
                        rule,
                        index: m.start(),
                        end: m.end(),
                        line: position.line,
                        column: position.column,
                        value: m.as_str().to_string(),
                    }
                }),
        );
        trace!(terminal = terminal.name(), matches = tokens.len() - before; "Scanned terminal");
    }

    // Stable sort on the offset alone: ties stay in terminal table order.
    tokens.sort_by_key(|token| token.index);

    debug!(tokens = tokens.len(), input_len = input.len(); "Tokenized input");
    tokens
}

impl Token {
    pub fn span(&self) -> Span {
        Span::new(self.index, self.end)
    }

    pub fn position(&self) -> Position {
        Position {
            index: self.index,
            line: self.line,
            column: self.column,
        }
    }
}

impl LineIndex {
    pub fn new(input: &str) -> Self {
        let newlines = input.match_indices('\n').map(|(i, _)| i).collect();
        Self {
            newlines,
            len: input.len(),
        }
    }

    /// Resolves a byte offset. Offsets past the end clamp to the end of input.
    ///
    /// `line` counts the newlines before `index`. `column` is the distance from
    /// the last of those newlines, or `index` itself on the first line.
    pub fn position(&self, index: usize) -> Position {
        let index = index.min(self.len);
        let line = self.newlines.partition_point(|&newline| newline < index);
        let column = match line {
            0 => index,
            _ => index - self.newlines[line - 1],
        };
        Position { index, line, column }
    }

    pub fn end(&self) -> Position {
        self.position(self.len)
    }
}

impl<'t> TokenStream<'t> {
    pub fn new(input: &str, tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            lines: LineIndex::new(input),
        }
    }

    pub fn is_exhausted(&self, cursor: usize) -> bool {
        cursor >= self.tokens.len()
    }

    /// Tokens sharing the start offset of the token at `cursor`, in table order.
    pub fn group(&self, cursor: usize) -> &'t [Token] {
        let Some(first) = self.tokens.get(cursor) else {
            return &[];
        };
        let rest = &self.tokens[cursor..];
        let len = rest.partition_point(|token| token.index == first.index);
        &rest[..len]
    }

    /// Cursor of the first token at or after `cursor` starting at or after `end`.
    pub fn skip_to(&self, cursor: usize, end: usize) -> usize {
        let cursor = cursor.min(self.tokens.len());
        cursor + self.tokens[cursor..].partition_point(|token| token.index < end)
    }

    /// Position of the token at `cursor`, or the end of input once exhausted.
    pub fn position(&self, cursor: usize) -> Position {
        self.tokens
            .get(cursor)
            .map(Token::position)
            .unwrap_or_else(|| self.lines.end())
    }
}
