//! Defines the command-line arguments and subcommands for the Parsegen CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "parsegen",
    version,
    about = "Tokenize and parse text with a declarative JSON or YAML grammar."
)]
pub struct ParsegenArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse input with a grammar and print the AST.
    Parse {
        #[command(flatten)]
        source: SourceArgs,
        /// How to print the AST.
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
        /// Fail if the start rule does not consume every token.
        #[arg(long)]
        complete: bool,
        /// Print the whole error stack when parsing fails.
        #[arg(long)]
        errors: bool,
    },
    /// Print the token stream produced for the input.
    Tokens {
        #[command(flatten)]
        source: SourceArgs,
        /// How to print the tokens.
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
    },
    /// Compile a grammar and summarize its terminals and rules.
    Check {
        /// The grammar file (.json, .yaml or .yml).
        #[arg(short, long, required = true)]
        grammar: PathBuf,
    },
}

/// Grammar plus input, shared by every subcommand that parses.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// The grammar file (.json, .yaml or .yml).
    #[arg(short, long, required = true)]
    pub grammar: PathBuf,
    /// The input file. Standard input is read when neither a file nor
    /// `--expr` is given.
    pub file: Option<PathBuf>,
    /// Inline input text.
    #[arg(short = 'e', long = "expr", conflicts_with = "file")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented, colored tree.
    Tree,
    /// Pretty-printed JSON.
    Json,
}
