//! The Parsegen Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::io::{self, Read};
use std::path::Path;
use std::process;
use std::str::FromStr;

use clap::Parser as _;
use log::{debug, error, info, LevelFilter};
use termcolor::{ColorChoice, StandardStream};

use crate::cli::args::{Command, OutputFormat, ParsegenArgs, SourceArgs};
use crate::diagnostics::Error;
use crate::engine::Parser;
use crate::grammar::Grammar;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = ParsegenArgs::parse();
    init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    // Dispatch to the appropriate subcommand handler.
    let result = match &args.command {
        Command::Parse {
            source,
            format,
            complete,
            errors,
        } => handle_parse(source, *format, *complete, *errors),
        Command::Tokens { source, format } => handle_tokens(source, *format),
        Command::Check { grammar } => handle_check(grammar),
    };

    if let Err(err) = result {
        report(&err);
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", level);
        LevelFilter::Warn
    });
    // RUST_LOG still refines individual modules.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_env(env_logger::Env::default())
        .try_init();
}

/// Renders an error with miette's graphical handler on standard error.
fn report(err: &Error) {
    let handler = miette::GraphicalReportHandler::new();
    let mut rendered = String::new();
    match handler.render_report(&mut rendered, err) {
        Ok(()) => eprint!("{}", rendered),
        Err(_) => eprintln!("Error: {}", err),
    }
    error!(kind = err.error_type().as_str(); "{}", err);
}

// ============================================================================
// SUBCOMMAND HANDLERS
// ============================================================================

/// Handles the `parse` subcommand.
fn handle_parse(
    source: &SourceArgs,
    format: OutputFormat,
    complete: bool,
    show_errors: bool,
) -> Result<(), Error> {
    let mut parser = Parser::from_path(&source.grammar)?.require_complete(complete);
    let (name, input) = read_input(source)?;
    info!(grammar:? = source.grammar, input = name.as_str(); "Parsing");

    match parser.generate_ast(&input) {
        Ok(ast) => {
            let mut stdout = StandardStream::stdout(ColorChoice::Auto);
            let written = match format {
                OutputFormat::Tree => output::print_tree(&mut stdout, &ast),
                OutputFormat::Json => output::print_json(&mut stdout, &ast),
            };
            written.map_err(|source| io_error("<stdout>", source))
        }
        Err(err) => {
            if show_errors {
                let mut stderr = StandardStream::stderr(ColorChoice::Auto);
                let written = match format {
                    OutputFormat::Tree => output::print_error_stack(&mut stderr, parser.error_stack()),
                    OutputFormat::Json => output::print_json(&mut stderr, parser.error_stack()),
                };
                written.map_err(|source| io_error("<stderr>", source))?;
            }
            Err(err.with_source_name(name).into())
        }
    }
}

/// Handles the `tokens` subcommand.
fn handle_tokens(source: &SourceArgs, format: OutputFormat) -> Result<(), Error> {
    let grammar = Grammar::from_path(&source.grammar)?;
    let (_, input) = read_input(source)?;
    let tokens = grammar.tokenize(&input);

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let written = match format {
        OutputFormat::Tree => output::print_tokens(&mut stdout, &tokens),
        OutputFormat::Json => output::print_json(&mut stdout, &tokens),
    };
    written.map_err(|source| io_error("<stdout>", source))
}

/// Handles the `check` subcommand.
fn handle_check(path: &Path) -> Result<(), Error> {
    let grammar = Grammar::from_path(path)?;
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    output::print_grammar(&mut stdout, &grammar).map_err(|source| io_error("<stdout>", source))
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// Returns a display name and the input text.
fn read_input(source: &SourceArgs) -> Result<(String, String), Error> {
    if let Some(text) = &source.text {
        return Ok(("<expr>".to_string(), text.clone()));
    }
    if let Some(path) = &source.file {
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| io_error(&name, e))?;
        return Ok((name, text));
    }
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|e| io_error("<stdin>", e))?;
    Ok(("<stdin>".to_string(), text))
}

fn io_error(path: &str, source: io::Error) -> Error {
    Error::Io {
        path: path.to_string(),
        source,
    }
}
