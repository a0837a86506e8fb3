//! Parsegen parsing engine
//!
//! Backtracking recursive descent over a compiled [`Grammar`]. Every analysis
//! step receives the cursor it starts from and returns either the nodes it
//! produced together with the cursor after them, or the [`SyntaxError`] that
//! stopped it. A failing step never moves the caller's cursor, so restoring a
//! checkpoint is simply reusing the cursor the caller still holds.
//!
//! Alternatives are tried in declaration order and the first one that
//! succeeds wins (PEG ordered choice). Every failure is pushed onto the
//! [`ErrorStack`] as it happens.

use std::sync::Arc;

use log::{debug, trace};

use crate::ast::{AstNode, Span};
use crate::diagnostics::{EmptyStack, GrammarError, ParseError};
use crate::errors::{ErrorStack, SyntaxError, SyntaxErrorKind};
use crate::grammar::{Element, Expression, Grammar};
use crate::lexer::{Position, Token, TokenStream};

// ============================================================================
// ANALYSIS STATE
// ============================================================================

/// Nodes produced by one successful step and the cursor following them.
#[derive(Debug)]
struct Matched {
    nodes: Vec<AstNode>,
    next: usize,
}

type Step = Result<Matched, SyntaxError>;

/// Per-parse state: the token stream and the error stack being filled.
struct Analysis<'g, 't, 'e> {
    grammar: &'g Grammar,
    stream: TokenStream<'t>,
    errors: &'e mut ErrorStack,
}

impl<'g> Analysis<'g, '_, '_> {
    /// Tries each alternative of rule `index` from `cursor`.
    fn analyze_rule(&mut self, index: usize, cursor: usize) -> Result<(AstNode, usize), SyntaxError> {
        let grammar = self.grammar;
        let rule = &grammar.rules()[index];
        trace!(rule = rule.name(), cursor = cursor; "Analyzing rule");

        for (alternative, expression) in rule.expressions().iter().enumerate() {
            match self.analyze_expression(expression, cursor) {
                Ok(matched) => {
                    trace!(rule = rule.name(), alternative = alternative, next = matched.next; "Rule matched");
                    let fallback = Span::point(self.stream.position(cursor).index);
                    let node = AstNode::node(rule.name(), matched.nodes, fallback);
                    return Ok((node, matched.next));
                }
                Err(_) => {
                    trace!(rule = rule.name(), alternative = alternative; "Alternative failed, backtracking");
                }
            }
        }

        Err(self.fail(
            SyntaxErrorKind::ExpectedToken,
            format!("no alternative of rule `{}` matched", rule.name()),
            self.stream.position(cursor),
        ))
    }

    /// Matches every element of `expression` in order.
    fn analyze_expression(&mut self, expression: &'g Expression, cursor: usize) -> Step {
        let mut nodes = Vec::new();
        let mut next = cursor;
        for element in expression.elements() {
            let matched = self.analyze_element(element, next)?;
            nodes.extend(matched.nodes);
            next = matched.next;
        }
        Ok(Matched { nodes, next })
    }

    fn analyze_element(&mut self, element: &'g Element, cursor: usize) -> Step {
        match element {
            Element::Terminal(name) => self.analyze_constant(name, cursor),
            Element::Alternative(expressions) => self.analyze_alternative(element, expressions, cursor),
            Element::Rule { index, .. } => self.analyze_reference(*index, cursor),
            Element::ZeroOrOne(inner) => Ok(self.analyze_zero_or_one(inner, cursor)),
            Element::ZeroOrMore(inner) => Ok(self.analyze_zero_or_more(inner, cursor)),
            Element::OneOrMore(inner) => self.analyze_one_or_more(inner, cursor),
        }
    }

    /// Consumes one token of `terminal`. Among the tokens starting at the
    /// cursor's offset, the one from `terminal` is taken; any overlapping
    /// tokens are skipped.
    fn analyze_constant(&mut self, terminal: &str, cursor: usize) -> Step {
        let group = self.stream.group(cursor);
        let Some(found) = group.first() else {
            return Err(self.fail(
                SyntaxErrorKind::ExpectedToken,
                format!("expected `{}`, found end of input", terminal),
                self.stream.position(cursor),
            ));
        };

        match group.iter().find(|token| token.terminal == terminal) {
            Some(token) => Ok(Matched {
                nodes: vec![AstNode::leaf(token)],
                next: self.stream.skip_to(cursor, token.end),
            }),
            None => Err(self.fail(
                SyntaxErrorKind::UnexpectedToken,
                format!(
                    "expected `{}`, found `{}` {:?}",
                    terminal, found.terminal, found.value
                ),
                found.position(),
            )),
        }
    }

    fn analyze_reference(&mut self, index: usize, cursor: usize) -> Step {
        let (node, next) = self.analyze_rule(index, cursor)?;
        Ok(Matched {
            nodes: vec![node],
            next,
        })
    }

    fn analyze_alternative(
        &mut self,
        element: &'g Element,
        expressions: &'g [Expression],
        cursor: usize,
    ) -> Step {
        for expression in expressions {
            if let Ok(matched) = self.analyze_expression(expression, cursor) {
                return Ok(matched);
            }
        }
        Err(self.fail(
            SyntaxErrorKind::ExpectedToken,
            format!("no alternative of `{}` matched", element),
            self.stream.position(cursor),
        ))
    }

    fn analyze_zero_or_one(&mut self, inner: &'g Element, cursor: usize) -> Matched {
        self.analyze_element(inner, cursor).unwrap_or(Matched {
            nodes: Vec::new(),
            next: cursor,
        })
    }

    fn analyze_zero_or_more(&mut self, inner: &'g Element, cursor: usize) -> Matched {
        let mut collected = Matched {
            nodes: Vec::new(),
            next: cursor,
        };
        while let Ok(matched) = self.analyze_element(inner, collected.next) {
            let advanced = matched.next > collected.next;
            collected.nodes.extend(matched.nodes);
            collected.next = matched.next;
            // An iteration that consumed nothing would repeat forever.
            if !advanced {
                break;
            }
        }
        collected
    }

    fn analyze_one_or_more(&mut self, inner: &'g Element, cursor: usize) -> Step {
        let first = self.analyze_element(inner, cursor)?;
        let mut rest = if first.next > cursor {
            self.analyze_zero_or_more(inner, first.next)
        } else {
            Matched {
                nodes: Vec::new(),
                next: first.next,
            }
        };
        let mut nodes = first.nodes;
        nodes.append(&mut rest.nodes);
        Ok(Matched {
            nodes,
            next: rest.next,
        })
    }

    /// Records a failure on the error stack and hands it back for propagation.
    fn fail(&mut self, kind: SyntaxErrorKind, message: String, at: Position) -> SyntaxError {
        let error = SyntaxError::new(kind, message, at);
        trace!(kind = error.kind.as_str(), index = error.index; "{}", error.message);
        self.errors.push(error.clone());
        error
    }
}

// ============================================================================
// GRAMMAR ENTRY POINTS
// ============================================================================

impl Grammar {
    /// Tokenizes and parses `input` from the start rule.
    ///
    /// `errors` is cleared first and holds every syntax error of this parse
    /// afterwards, whatever the outcome.
    pub fn analyze(&self, input: &str, errors: &mut ErrorStack) -> Result<AstNode, ParseError> {
        self.analyze_tokens(input, &self.tokenize(input), errors, false)
    }

    /// Like [`Grammar::analyze`], but also fails when tokens remain after the
    /// start rule has matched.
    pub fn analyze_complete(&self, input: &str, errors: &mut ErrorStack) -> Result<AstNode, ParseError> {
        self.analyze_tokens(input, &self.tokenize(input), errors, true)
    }

    fn analyze_tokens(
        &self,
        input: &str,
        tokens: &[Token],
        errors: &mut ErrorStack,
        complete: bool,
    ) -> Result<AstNode, ParseError> {
        errors.clear();
        let start = self.start_rule().name();
        debug!(start = start, tokens = tokens.len(), complete = complete; "Parsing input");

        let result = {
            let mut analysis = Analysis {
                grammar: self,
                stream: TokenStream::new(input, tokens),
                errors: &mut *errors,
            };
            analysis.analyze_rule(0, 0).and_then(|(ast, next)| {
                if !complete || analysis.stream.is_exhausted(next) {
                    return Ok(ast);
                }
                let found = &analysis.stream.group(next)[0];
                Err(analysis.fail(
                    SyntaxErrorKind::UnexpectedToken,
                    format!(
                        "unexpected `{}` {:?} after the end of `{}`",
                        found.terminal, found.value, start
                    ),
                    found.position(),
                ))
            })
        };

        match result {
            Ok(ast) => {
                debug!(errors = errors.len(); "Parse succeeded");
                Ok(ast)
            }
            Err(error) => {
                let top = errors.last().cloned().unwrap_or(error);
                debug!(errors = errors.len(), index = top.index; "Parse failed");
                Err(ParseError::new(top, errors.furthest().cloned(), input))
            }
        }
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// A compiled grammar together with the error stack of its latest parse.
///
/// The grammar is shared behind an `Arc`; cloning a `Parser` is cheap and the
/// clone starts with its own empty error stack, so clones can parse on
/// different threads.
#[derive(Debug)]
pub struct Parser {
    grammar: Arc<Grammar>,
    errors: ErrorStack,
    complete: bool,
}

impl Parser {
    pub fn new(grammar: impl Into<Arc<Grammar>>) -> Self {
        Self {
            grammar: grammar.into(),
            errors: ErrorStack::new(),
            complete: false,
        }
    }

    pub fn from_value(document: &serde_json::Value) -> Result<Self, GrammarError> {
        Grammar::from_value(document).map(Self::new)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GrammarError> {
        Grammar::from_json_str(text).map(Self::new)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, GrammarError> {
        Grammar::from_yaml_str(text).map(Self::new)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, GrammarError> {
        Grammar::from_path(path).map(Self::new)
    }

    /// When set, a parse whose start rule leaves tokens unconsumed fails.
    pub fn require_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// Parses `input` and returns its AST.
    ///
    /// The error stack is reset at the start of every call.
    pub fn generate_ast(&mut self, input: &str) -> Result<AstNode, ParseError> {
        let tokens = self.grammar.tokenize(input);
        self.grammar
            .analyze_tokens(input, &tokens, &mut self.errors, self.complete)
    }

    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        self.grammar.tokenize(input)
    }

    pub fn error_stack(&self) -> &ErrorStack {
        &self.errors
    }

    pub fn last_error(&self) -> Result<&SyntaxError, EmptyStack> {
        self.errors.last()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }
}

impl Clone for Parser {
    fn clone(&self) -> Self {
        Self {
            grammar: Arc::clone(&self.grammar),
            errors: ErrorStack::new(),
            complete: self.complete,
        }
    }
}
