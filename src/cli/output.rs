//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing, colorizing output,
//! and generating JSON. Every printer writes to any `WriteColor`, so the
//! same code serves the terminal and in-memory buffers.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::ast::AstNode;
use crate::errors::ErrorStack;
use crate::grammar::Grammar;
use crate::lexer::Token;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints the AST as an indented tree, one node per line.
pub fn print_tree(out: &mut impl WriteColor, ast: &AstNode) -> io::Result<()> {
    print_node(out, ast, 0)
}

/// Prints one token per line: position, terminal and text.
pub fn print_tokens(out: &mut impl WriteColor, tokens: &[Token]) -> io::Result<()> {
    for token in tokens {
        write!(out, "{:>4}:{:<4} ", token.line, token.column)?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(out, "{:<16}", token.terminal)?;
        out.reset()?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "{:?}", token.value)?;
        out.reset()?;
    }
    Ok(())
}

/// Prints every recorded syntax error, oldest first.
pub fn print_error_stack(out: &mut impl WriteColor, errors: &ErrorStack) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(out, "--- Error stack ({} entries) ---", errors.len())?;
    out.reset()?;
    for (i, error) in errors.iter().enumerate() {
        writeln!(out, "{:>4}. [{}] {}", i, error.kind, error)?;
    }
    Ok(())
}

/// Prints the compiled terminal and rule tables.
pub fn print_grammar(out: &mut impl WriteColor, grammar: &Grammar) -> io::Result<()> {
    heading(out, "Terminals")?;
    for terminal in grammar.terminals() {
        let origin = if terminal.is_built_in() { " (built-in)" } else { "" };
        writeln!(out, "  {:<16} {}{}", terminal.name(), terminal.pattern(), origin)?;
    }
    heading(out, "Rules")?;
    for (i, rule) in grammar.rules().iter().enumerate() {
        let start = if i == 0 { "  (start)" } else { "" };
        writeln!(out, "  {}{}", rule, start)?;
    }
    Ok(())
}

/// Writes any serializable value as pretty JSON followed by a newline.
pub fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_node(out: &mut impl WriteColor, node: &AstNode, depth: usize) -> io::Result<()> {
    write!(out, "{:indent$}", "", indent = depth * 2)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(!node.is_leaf()))?;
    write!(out, "{}", node.label)?;
    out.reset()?;
    if let Some(value) = &node.value {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, " {:?}", value)?;
        out.reset()?;
    }
    writeln!(out, " @{}..{}", node.span.start, node.span.end)?;
    for child in &node.children {
        print_node(out, child, depth + 1)?;
    }
    Ok(())
}

fn heading(out: &mut impl WriteColor, title: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(out, "{}:", title)?;
    out.reset()
}
