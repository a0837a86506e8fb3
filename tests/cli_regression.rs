// Regression tests for the command-line front end.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

const ASSIGN_GRAMMAR: &str = r#"{
    "terminals": [{"name": "eq", "regex": "="}],
    "rules": [{"name": "assign", "expressions": ["identifier eq (real | integer)"]}]
}"#;

fn grammar_file(name: &str, content: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::write(&path, content).unwrap();
    path
}

fn parsegen() -> Command {
    let mut cmd = Command::cargo_bin("parsegen").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_parse_prints_tree() {
    let grammar = grammar_file("cli_parse_tree.json", ASSIGN_GRAMMAR);
    parsegen()
        .args(["parse", "-g"])
        .arg(&grammar)
        .args(["-e", "x = 42"])
        .assert()
        .success()
        .stdout(contains("assign @0..6").and(contains("identifier \"x\" @0..1")));
}

#[test]
fn cli_parse_reads_stdin_and_prints_json() {
    let grammar = grammar_file("cli_parse_json.json", ASSIGN_GRAMMAR);
    parsegen()
        .args(["parse", "--format", "json", "-g"])
        .arg(&grammar)
        .write_stdin("pi = 3.14")
        .assert()
        .success()
        .stdout(contains("\"label\": \"real\"").and(contains("\"value\": \"3.14\"")));
}

#[test]
fn cli_reports_miette_diagnostics_on_parse_error() {
    let grammar = grammar_file("cli_parse_error.json", ASSIGN_GRAMMAR);
    parsegen()
        .args(["parse", "--errors", "-g"])
        .arg(&grammar)
        .args(["-e", "x 1"])
        .assert()
        .failure()
        .code(1)
        .stderr(
            contains("parsegen::parse")
                .and(contains("Error stack"))
                .and(contains("expected `eq`")),
        );
}

#[test]
fn cli_reports_grammar_errors() {
    let grammar = grammar_file("cli_missing_rules.json", r#"{"terminals": []}"#);
    parsegen()
        .args(["check", "-g"])
        .arg(&grammar)
        .assert()
        .failure()
        .stderr(contains("parsegen::grammar").and(contains("'rules'")));
}

#[test]
fn cli_check_summarizes_yaml_grammar() {
    let grammar = grammar_file(
        "cli_check.yaml",
        "terminals:\n  - name: comma\n    regex: \",\"\nrules:\n  - name: list\n    expressions:\n      - identifier (comma identifier)*\n",
    );
    parsegen()
        .args(["check", "-g"])
        .arg(&grammar)
        .assert()
        .success()
        .stdout(contains("comma").and(contains("list = identifier (comma identifier)*  (start)")));
}

#[test]
fn cli_tokens_lists_every_match() {
    let grammar = grammar_file("cli_tokens.json", ASSIGN_GRAMMAR);
    parsegen()
        .args(["tokens", "-g"])
        .arg(&grammar)
        .args(["-e", "n = 7"])
        .assert()
        .success()
        .stdout(contains("identifier").and(contains("integer")).and(contains("real")));
}

#[test]
fn cli_missing_input_file_is_an_io_error() {
    let grammar = grammar_file("cli_io.json", ASSIGN_GRAMMAR);
    parsegen()
        .args(["parse", "-g"])
        .arg(&grammar)
        .arg("does/not/exist.txt")
        .assert()
        .failure()
        .stderr(contains("could not read"));
}

#[test]
fn cli_error_stack_as_json() {
    let grammar = grammar_file("cli_errors_json.json", ASSIGN_GRAMMAR);
    parsegen()
        .args(["parse", "--errors", "--format", "json", "-g"])
        .arg(&grammar)
        .args(["-e", "x 1"])
        .assert()
        .failure()
        .stderr(contains("\"kind\": \"UNEXPECTED_TOKEN\"").and(contains("\"kind\": \"EXPECTED_TOKEN\"")));
}
