// tests/parser_tests.rs

use parsegen::{Element, Expression, Grammar, GrammarError, Parser, Rule, SyntaxErrorKind, TerminalRule};
use serde_json::json;

fn parser(document: serde_json::Value) -> Parser {
    Parser::from_value(&document).unwrap()
}

fn arithmetic() -> Parser {
    parser(json!({
        "terminals": [
            {"name": "plus", "regex": "\\+"},
            {"name": "star", "regex": "\\*"},
            {"name": "lparen", "regex": "\\("},
            {"name": "rparen", "regex": "\\)"}
        ],
        "rules": [
            {"name": "sum", "expressions": ["product (plus product)*"]},
            {"name": "product", "expressions": ["atom (star atom)*"]},
            {"name": "atom", "expressions": ["integer", "identifier", "lparen sum rparen"]}
        ]
    }))
}

// ---
// Successful parses
// ---

#[test]
fn test_single_identifier() {
    let mut p = parser(json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["identifier"]}]
    }));
    let ast = p.generate_ast("foo").unwrap();
    assert_eq!(ast.label(), "main");
    assert_eq!(ast.children().len(), 1);
    assert_eq!(ast.children()[0].label(), "identifier");
    assert_eq!(ast.children()[0].value(), Some("foo"));
    assert_eq!(ast.pretty(), r#"(main (identifier "foo"))"#);
}

#[test]
fn test_ordered_choice_takes_first_match() {
    let mut p = parser(json!({
        "terminals": [],
        "rules": [
            {"name": "main", "expressions": ["word", "number"]},
            {"name": "word", "expressions": ["identifier"]},
            {"name": "number", "expressions": ["integer"]}
        ]
    }));
    assert_eq!(p.generate_ast("x").unwrap().pretty(), r#"(main (word (identifier "x")))"#);
    assert_eq!(p.generate_ast("42").unwrap().pretty(), r#"(main (number (integer "42")))"#);
}

#[test]
fn test_failed_alternative_backtracks() {
    // the first alternative consumes `a` before failing on the missing comma
    let mut p = parser(json!({
        "terminals": [{"name": "comma", "regex": ","}],
        "rules": [{"name": "main", "expressions": [
            "identifier comma identifier",
            "identifier integer"
        ]}]
    }));
    let ast = p.generate_ast("a 1").unwrap();
    assert_eq!(ast.pretty(), r#"(main (identifier "a") (integer "1"))"#);
    assert!(!p.error_stack().is_empty());
}

#[test]
fn test_nested_expression_tree() {
    let mut p = arithmetic();
    let ast = p.generate_ast("1 + 2 * (x + 3)").unwrap();
    let values: Vec<_> = ast.leaves().iter().filter_map(|leaf| leaf.value()).collect();
    assert_eq!(values, ["1", "+", "2", "*", "(", "x", "+", "3", ")"]);
    assert_eq!(ast.find_all("sum").len(), 2);
    assert_eq!(ast.find_all("atom").len(), 5);
    assert_eq!(ast.span.start, 0);
    assert_eq!(ast.span.end, 15);
}

#[test]
fn test_optional_element() {
    let mut p = parser(json!({
        "terminals": [{"name": "minus", "regex": "-"}],
        "rules": [{"name": "main", "expressions": ["minus? identifier"]}]
    }));
    assert_eq!(p.generate_ast("- a").unwrap().children().len(), 2);
    assert_eq!(p.generate_ast("a").unwrap().children().len(), 1);
}

#[test]
fn test_one_or_more_requires_a_match() {
    let mut p = parser(json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["identifier+"]}]
    }));
    assert_eq!(p.generate_ast("a b c").unwrap().children().len(), 3);
    assert!(p.generate_ast("").is_err());
}

#[test]
fn test_epsilon_expression_matches_empty_input() {
    let mut p = parser(json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["identifier", ""]}]
    }));
    let ast = p.generate_ast("").unwrap();
    assert_eq!(ast.pretty(), "(main)");
    assert!(p.last_error().is_ok());
}

#[test]
fn test_yaml_grammar() {
    let mut p = Parser::from_yaml_str(
        r#"
terminals:
  - name: eq
    regex: "="
rules:
  - name: assign
    expressions:
      - identifier eq (real | integer)
"#,
    )
    .unwrap();
    let ast = p.generate_ast("pi = 3.14").unwrap();
    assert_eq!(
        ast.pretty(),
        r#"(assign (identifier "pi") (eq "=") (real "3.14"))"#
    );
}

#[test]
fn test_overlapping_tokens_are_skipped() {
    // integer and real both match at offset 0; consuming the real must
    // also step past the integer token for "14"
    let mut p = parser(json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["real identifier"]}]
    }));
    let ast = p.generate_ast("3.14 x").unwrap();
    assert_eq!(ast.pretty(), r#"(main (real "3.14") (identifier "x"))"#);
}

// ---
// Failures and the error stack
// ---

#[test]
fn test_integer_grammar_rejects_identifier() {
    let mut p = parser(json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["integer"]}]
    }));
    let err = p.generate_ast("abc").unwrap_err();
    assert_eq!(err.error.kind, SyntaxErrorKind::ExpectedToken);
    assert_eq!(err.error.index, 0);

    let last = p.last_error().unwrap();
    assert_eq!(last.kind, SyntaxErrorKind::ExpectedToken);
    assert_eq!(last.index, 0);
    assert_eq!((last.line, last.column), (0, 0));
    // the terminal mismatch is recorded beneath the rule failure
    assert!(p
        .error_stack()
        .iter()
        .any(|e| e.kind == SyntaxErrorKind::UnexpectedToken && e.message.contains("`identifier`")));
}

#[test]
fn test_end_of_input_reported_at_input_length() {
    let mut p = parser(json!({
        "terminals": [{"name": "eq", "regex": "="}],
        "rules": [{"name": "main", "expressions": ["identifier eq integer"]}]
    }));
    let err = p.generate_ast("x =").unwrap_err();
    let furthest = err.furthest.unwrap();
    assert_eq!(furthest.index, 3);
    assert!(furthest.message.contains("end of input"));
}

#[test]
fn test_positions_on_later_lines() {
    let mut p = parser(json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["identifier identifier"]}]
    }));
    let err = p.generate_ast("a\n  7").unwrap_err();
    let furthest = err.furthest.unwrap();
    assert_eq!(furthest.kind, SyntaxErrorKind::UnexpectedToken);
    assert_eq!((furthest.index, furthest.line, furthest.column), (4, 1, 3));
}

#[test]
fn test_empty_stack_before_any_parse() {
    let p = arithmetic();
    assert!(p.last_error().is_err());
    assert!(p.error_stack().is_empty());
}

#[test]
fn test_error_stack_reset_between_calls() {
    let mut p = arithmetic();
    p.generate_ast("+").unwrap_err();
    let failed = p.error_stack().len();
    assert!(failed > 0);

    // only the repetitions probing past the end of "1" remain
    p.generate_ast("1").unwrap();
    assert!(!p.error_stack().is_empty());
    assert!(p.error_stack().iter().all(|e| e.index == 1));
}

#[test]
fn test_trailing_input_ignored_unless_complete() {
    let document = json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["identifier"]}]
    });
    let mut lenient = parser(document.clone());
    assert!(lenient.generate_ast("a 1").is_ok());

    let mut strict = parser(document).require_complete(true);
    let err = strict.generate_ast("a 1").unwrap_err();
    assert_eq!(err.error.kind, SyntaxErrorKind::UnexpectedToken);
    assert_eq!(err.error.index, 2);
}

#[test]
fn test_cloned_parsers_parse_concurrently() {
    let p = arithmetic();
    let handles: Vec<_> = ["1 + 2", "x * y", "(3)"]
        .into_iter()
        .map(|input| {
            let mut clone = p.clone();
            std::thread::spawn(move || clone.generate_ast(input).map(|ast| ast.leaves().len()))
        })
        .collect();
    let counts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
    assert_eq!(counts, [3, 3, 3]);
}

// ---
// Grammar errors
// ---

#[test]
fn test_missing_rules_section() {
    let err = Parser::from_value(&json!({"terminals": []})).unwrap_err();
    assert!(matches!(err, GrammarError::MissingSection { section: "rules" }));
    assert_eq!(err.to_string(), "the 'rules' property is required in the grammar");
}

#[test]
fn test_empty_rules_section() {
    let err = Parser::from_value(&json!({"terminals": [], "rules": []})).unwrap_err();
    assert!(matches!(err, GrammarError::NoRules));
}

#[test]
fn test_unknown_symbol_in_expression() {
    let err = Parser::from_value(&json!({
        "terminals": [],
        "rules": [{"name": "main", "expressions": ["identifier missing"]}]
    }))
    .unwrap_err();
    assert!(matches!(err, GrammarError::UnknownSymbol { ref symbol, .. } if symbol == "missing"));
}

#[test]
fn test_hand_built_grammar_must_resolve_references() {
    let dangling = vec![Rule::new(
        "main",
        vec![Expression::new(vec![Element::Rule {
            name: "ghost".into(),
            index: 7,
        }])],
    )];
    let err = Grammar::new(TerminalRule::built_ins().unwrap(), dangling).unwrap_err();
    assert!(matches!(err, GrammarError::UnknownSymbol { ref symbol, .. } if symbol == "ghost"));

    let resolved = vec![Rule::new(
        "main",
        vec![Expression::new(vec![Element::Terminal("identifier".into())])],
    )];
    let mut p = Parser::new(Grammar::new(TerminalRule::built_ins().unwrap(), resolved).unwrap());
    assert_eq!(p.generate_ast("x").unwrap().pretty(), r#"(main (identifier "x"))"#);
}
