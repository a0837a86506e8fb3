//! Compiled grammar model.
//!
//! A `Grammar` is the immutable result of compiling a grammar document: the
//! terminal table (built-ins first, then declared terminals) and the rule
//! table, whose first entry is the start symbol. Nothing in here changes after
//! construction, so one `Grammar` can back any number of concurrent parses.

pub mod compile;
pub mod syntax;

use std::fmt;

use regex::Regex;

use crate::ast::Span;
use crate::diagnostics::GrammarError;
use crate::lexer::{self, Token};

// =====================
// Core Data Structures
// =====================

pub struct GrammarConstants {
    /// Terminals present in every grammar, ahead of declared ones.
    pub built_ins: &'static [(&'static str, &'static str)],
    pub required_sections: &'static [&'static str],
}

pub const GRAMMAR_CONSTANTS: GrammarConstants = GrammarConstants {
    built_ins: &[
        ("integer", r"[-+]?\d+"),
        ("identifier", r"[_a-zA-Z][_a-zA-Z0-9]*"),
        ("real", r"[-+]?\d+(\.\d+)?"),
    ],
    required_sections: &["terminals", "rules"],
};

/// A named lexical pattern.
#[derive(Debug, Clone)]
pub struct TerminalRule {
    name: String,
    pattern: String,
    regex: Regex,
}

/// One grammar symbol occurrence inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Matches one token of the named terminal.
    Terminal(String),
    /// Anonymous ordered choice between nested expressions.
    Alternative(Vec<Expression>),
    /// Reference to a rule, resolved to its position in the rule table.
    Rule { name: String, index: usize },
    ZeroOrOne(Box<Element>),
    ZeroOrMore(Box<Element>),
    OneOrMore(Box<Element>),
}

/// One alternative of a rule: a sequence of elements. Empty means epsilon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expression {
    elements: Vec<Element>,
}

/// A named nonterminal with its ordered alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    expressions: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    terminals: Vec<TerminalRule>,
    rules: Vec<Rule>,
}

// =====================
// Public API
// =====================

impl TerminalRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self, GrammarError> {
        let name = name.into();
        let pattern = pattern.into();
        let regex = Regex::new(&pattern).map_err(|source| GrammarError::InvalidPattern {
            name: name.clone(),
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Self {
            name,
            pattern,
            regex,
        })
    }

    /// The terminals every grammar starts with, in their fixed order.
    pub fn built_ins() -> Result<Vec<Self>, GrammarError> {
        GRAMMAR_CONSTANTS
            .built_ins
            .iter()
            .map(|(name, pattern)| Self::new(*name, *pattern))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_built_in(&self) -> bool {
        GRAMMAR_CONSTANTS
            .built_ins
            .iter()
            .any(|(name, pattern)| *name == self.name && *pattern == self.pattern)
    }
}

impl PartialEq for TerminalRule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.pattern == other.pattern
    }
}

impl Eq for TerminalRule {}

impl Expression {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn epsilon() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_epsilon(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Rule {
    pub fn new(name: impl Into<String>, expressions: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            expressions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }
}

impl Grammar {
    /// Assembles a grammar from already-compiled tables.
    ///
    /// Every terminal element must name an entry of `terminals`, and every rule
    /// reference must carry the index and name of an entry of `rules`.
    pub fn new(terminals: Vec<TerminalRule>, rules: Vec<Rule>) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::NoRules);
        }
        let grammar = Self { terminals, rules };
        for rule in &grammar.rules {
            for expression in &rule.expressions {
                grammar.check_expression(rule, expression, expression)?;
            }
        }
        Ok(grammar)
    }

    pub fn terminals(&self) -> &[TerminalRule] {
        &self.terminals
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The first declared rule.
    pub fn start_rule(&self) -> &Rule {
        &self.rules[0]
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn find_terminal(&self, name: &str) -> Option<&TerminalRule> {
        self.terminals.iter().find(|terminal| terminal.name == name)
    }

    /// Tokenizes `input` with this grammar's terminal table.
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        lexer::tokenize(&self.terminals, input)
    }

    fn check_expression(
        &self,
        rule: &Rule,
        top: &Expression,
        expression: &Expression,
    ) -> Result<(), GrammarError> {
        expression
            .elements
            .iter()
            .try_for_each(|element| self.check_element(rule, top, element))
    }

    fn check_element(&self, rule: &Rule, top: &Expression, element: &Element) -> Result<(), GrammarError> {
        let name = match element {
            Element::Terminal(name) if self.find_terminal(name).is_some() => return Ok(()),
            Element::Rule { name, index } if self.rule(*index).is_some_and(|r| r.name == *name) => {
                return Ok(())
            }
            Element::Terminal(name) | Element::Rule { name, .. } => name,
            Element::Alternative(nested) => {
                return nested
                    .iter()
                    .try_for_each(|expression| self.check_expression(rule, top, expression))
            }
            Element::ZeroOrOne(inner) | Element::ZeroOrMore(inner) | Element::OneOrMore(inner) => {
                return self.check_element(rule, top, inner)
            }
        };

        let expression = top.to_string();
        let span = match expression.find(name.as_str()) {
            Some(start) => Span::new(start, start + name.len()),
            None => Span::new(0, expression.len()),
        };
        Err(GrammarError::UnknownSymbol {
            rule: rule.name.clone(),
            symbol: name.clone(),
            expression,
            span,
        })
    }
}

// =====================
// Mini-syntax rendering
// =====================

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Terminal(name) | Element::Rule { name, .. } => f.write_str(name),
            Element::Alternative(expressions) => {
                f.write_str("(")?;
                for (i, expression) in expressions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", expression)?;
                }
                f.write_str(")")
            }
            Element::ZeroOrOne(inner) => write!(f, "{}?", inner),
            Element::ZeroOrMore(inner) => write!(f, "{}*", inner),
            Element::OneOrMore(inner) => write!(f, "{}+", inner),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.elements.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" "))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} =", self.name)?;
        for (i, expression) in self.expressions.iter().enumerate() {
            let sep = if i == 0 { " " } else { " | " };
            if expression.is_epsilon() {
                write!(f, "{sep}ε")?;
            } else {
                write!(f, "{sep}{expression}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins_compile_in_fixed_order() {
        let names: Vec<_> = TerminalRule::built_ins()
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["integer", "identifier", "real"]);
    }

    #[test]
    fn built_in_patterns() {
        let built_ins = TerminalRule::built_ins().unwrap();
        assert!(built_ins[0].regex().is_match("-42"));
        assert!(built_ins[1].regex().is_match("_foo9"));
        assert_eq!(built_ins[2].regex().find("+3.25").unwrap().as_str(), "+3.25");
        assert!(built_ins.iter().all(TerminalRule::is_built_in));
    }

    #[test]
    fn invalid_pattern_names_the_terminal() {
        let err = TerminalRule::new("broken", "(unclosed").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidPattern { ref name, .. } if name == "broken"));
    }

    #[test]
    fn empty_rule_table_is_rejected() {
        let err = Grammar::new(TerminalRule::built_ins().unwrap(), vec![]).unwrap_err();
        assert!(matches!(err, GrammarError::NoRules));
    }

    #[test]
    fn dangling_rule_reference_is_rejected() {
        let rules = vec![Rule::new(
            "main",
            vec![Expression::new(vec![
                Element::Terminal("identifier".into()),
                Element::ZeroOrMore(Box::new(Element::Rule {
                    name: "ghost".into(),
                    index: 7,
                })),
            ])],
        )];
        let err = Grammar::new(TerminalRule::built_ins().unwrap(), rules).unwrap_err();
        match err {
            GrammarError::UnknownSymbol {
                rule,
                symbol,
                expression,
                span,
            } => {
                assert_eq!((rule.as_str(), symbol.as_str()), ("main", "ghost"));
                assert_eq!(expression, "identifier ghost*");
                assert_eq!(span, Span::new(11, 16));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reference_with_mismatched_name_is_rejected() {
        let rules = vec![
            Rule::new("main", vec![Expression::new(vec![Element::Rule {
                name: "other".into(),
                index: 0,
            }])]),
        ];
        let err = Grammar::new(TerminalRule::built_ins().unwrap(), rules).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol { ref symbol, .. } if symbol == "other"));
    }

    #[test]
    fn unknown_terminal_inside_a_group_is_rejected() {
        let rules = vec![Rule::new(
            "main",
            vec![Expression::new(vec![Element::Alternative(vec![
                Expression::new(vec![Element::Terminal("integer".into())]),
                Expression::new(vec![Element::Terminal("comma".into())]),
            ])])],
        )];
        let err = Grammar::new(TerminalRule::built_ins().unwrap(), rules).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol { ref symbol, .. } if symbol == "comma"));
    }

    #[test]
    fn resolved_tables_are_accepted() {
        let rules = vec![
            Rule::new("main", vec![Expression::new(vec![Element::OneOrMore(Box::new(
                Element::Rule {
                    name: "word".into(),
                    index: 1,
                },
            ))])]),
            Rule::new("word", vec![Expression::new(vec![Element::Terminal("identifier".into())])]),
        ];
        let grammar = Grammar::new(TerminalRule::built_ins().unwrap(), rules).unwrap();
        assert_eq!(grammar.start_rule().name(), "main");
        assert_eq!(grammar.rule(1).map(Rule::name), Some("word"));
        assert!(grammar.rule(2).is_none());
    }

    #[test]
    fn rules_render_back_to_mini_syntax() {
        let rule = Rule::new(
            "list",
            vec![
                Expression::new(vec![
                    Element::Terminal("identifier".into()),
                    Element::ZeroOrMore(Box::new(Element::Alternative(vec![Expression::new(
                        vec![
                            Element::Terminal("comma".into()),
                            Element::Terminal("identifier".into()),
                        ],
                    )]))),
                ]),
                Expression::epsilon(),
            ],
        );
        assert_eq!(rule.to_string(), "list = identifier (comma identifier)* | ε");
    }
}
