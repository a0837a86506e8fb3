//! Grammar document compilation.
//!
//! Walks the decoded document tree (JSON or YAML, both decoded into a
//! `serde_json::Value`) and builds the terminal and rule tables. Compilation
//! never looks at input text and either succeeds completely or fails with the
//! first [`GrammarError`] it meets.

use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::diagnostics::GrammarError;
use crate::grammar::syntax::{parse_expression, Symbol, SymbolTable};
use crate::grammar::{Grammar, Rule, TerminalRule, GRAMMAR_CONSTANTS};

/// A rule entry whose fields have been checked but whose expressions are
/// still raw text.
struct RuleHeader<'a> {
    name: &'a str,
    expressions: Vec<&'a str>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Compiles a decoded grammar document.
pub fn compile(document: &Value) -> Result<Grammar, GrammarError> {
    let root = document.as_object().ok_or(GrammarError::InvalidDocument)?;

    for &required in GRAMMAR_CONSTANTS.required_sections {
        if !root.contains_key(required) {
            return Err(GrammarError::MissingSection { section: required });
        }
    }
    let terminal_entries = section(root, "terminals")?;
    let rule_entries = section(root, "rules")?;

    let terminals = compile_terminals(terminal_entries)?;
    let headers = rule_entries
        .iter()
        .enumerate()
        .map(|(index, entry)| rule_header(index, entry))
        .collect::<Result<Vec<_>, _>>()?;
    if headers.is_empty() {
        return Err(GrammarError::NoRules);
    }

    let symbols = symbol_table(&terminals, &headers)?;
    let rules = headers
        .iter()
        .map(|header| {
            let expressions = header
                .expressions
                .iter()
                .map(|text| parse_expression(header.name, text, &symbols))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Rule::new(header.name, expressions))
        })
        .collect::<Result<Vec<_>, GrammarError>>()?;

    debug!(
        terminals = terminals.len(),
        rules = rules.len(),
        start = rules[0].name();
        "Compiled grammar"
    );
    Grammar::new(terminals, rules)
}

impl Grammar {
    pub fn from_value(document: &Value) -> Result<Self, GrammarError> {
        compile(document)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GrammarError> {
        let document: Value = serde_json::from_str(text).map_err(|e| GrammarError::Decode {
            format: "JSON",
            message: e.to_string(),
        })?;
        compile(&document)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, GrammarError> {
        let document: Value = serde_yaml::from_str(text).map_err(|e| GrammarError::Decode {
            format: "YAML",
            message: e.to_string(),
        })?;
        compile(&document)
    }

    /// Reads and compiles a grammar file; `.yaml` and `.yml` files are read as
    /// YAML, everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path:? = path; "Loaded grammar file");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

fn section<'a>(
    root: &'a Map<String, Value>,
    section: &'static str,
) -> Result<&'a Vec<Value>, GrammarError> {
    match root.get(section) {
        None => Err(GrammarError::MissingSection { section }),
        Some(value) => value
            .as_array()
            .ok_or(GrammarError::InvalidSection { section }),
    }
}

fn compile_terminals(entries: &[Value]) -> Result<Vec<TerminalRule>, GrammarError> {
    let mut terminals = TerminalRule::built_ins()?;

    for (index, entry) in entries.iter().enumerate() {
        let name = string_field(entry, "name");
        let describe = || describe_entry("terminal", index, name);
        let name = name.ok_or_else(|| GrammarError::MalformedTerminal {
            entry: describe(),
            reason: "missing string property 'name'".into(),
        })?;
        let pattern = string_field(entry, "regex").ok_or_else(|| GrammarError::MalformedTerminal {
            entry: describe(),
            reason: "missing string property 'regex'".into(),
        })?;
        if terminals.iter().any(|t| t.name() == name) {
            return Err(GrammarError::DuplicateName {
                kind: "terminal",
                name: name.to_string(),
            });
        }
        terminals.push(TerminalRule::new(name, pattern)?);
    }

    Ok(terminals)
}

fn rule_header(index: usize, entry: &Value) -> Result<RuleHeader<'_>, GrammarError> {
    let name = string_field(entry, "name");
    let describe = || describe_entry("rule", index, name);
    let name = name.ok_or_else(|| GrammarError::MalformedRule {
        entry: describe(),
        reason: "missing string property 'name'".into(),
    })?;
    let list = entry
        .get("expressions")
        .and_then(Value::as_array)
        .ok_or_else(|| GrammarError::MalformedRule {
            entry: describe(),
            reason: "missing array property 'expressions'".into(),
        })?;
    let expressions = list
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value.as_str().ok_or_else(|| GrammarError::MalformedRule {
                entry: describe(),
                reason: format!("expression #{} is not a string", i),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if expressions.is_empty() {
        return Err(GrammarError::MalformedRule {
            entry: describe(),
            reason: "at least one expression is required".into(),
        });
    }
    Ok(RuleHeader { name, expressions })
}

fn symbol_table<'a>(
    terminals: &'a [TerminalRule],
    headers: &[RuleHeader<'a>],
) -> Result<SymbolTable<'a>, GrammarError> {
    let mut symbols = SymbolTable::new();
    for terminal in terminals {
        symbols.insert(terminal.name(), Symbol::Terminal);
    }
    for (index, header) in headers.iter().enumerate() {
        if !symbols.insert(header.name, Symbol::Rule(index)) {
            let kind = if terminals.iter().any(|t| t.name() == header.name) {
                "terminal and rule"
            } else {
                "rule"
            };
            return Err(GrammarError::DuplicateName {
                kind,
                name: header.name.to_string(),
            });
        }
    }
    Ok(symbols)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn string_field<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry.get(field).and_then(Value::as_str)
}

fn describe_entry(kind: &str, index: usize, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} #{} (`{}`)", kind, index, name),
        None => format!("{} #{}", kind, index),
    }
}
