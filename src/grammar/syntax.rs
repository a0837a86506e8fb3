use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Span;
use crate::diagnostics::GrammarError;
use crate::grammar::{Element, Expression};

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*").expect("name pattern is valid"));

/// What a bare name in an expression can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Terminal,
    Rule(usize),
}

/// Every name an expression may use, resolved before any expression is read.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    symbols: HashMap<&'a str, Symbol>,
}

impl<'a> SymbolTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a name; returns false if it was already taken.
    pub fn insert(&mut self, name: &'a str, symbol: Symbol) -> bool {
        self.symbols.insert(name, symbol).is_none()
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }
}

/// Reads one expression string of rule `rule` into an [`Expression`].
///
/// ```text
/// sequence := item*
/// item     := primary ('?' | '*' | '+')?
/// primary  := NAME | '(' sequence ('|' sequence)* ')'
/// ```
pub fn parse_expression(
    rule: &str,
    text: &str,
    symbols: &SymbolTable<'_>,
) -> Result<Expression, GrammarError> {
    let mut reader = ExpressionReader {
        rule,
        text,
        pos: 0,
        symbols,
    };
    let expression = reader.sequence()?;
    reader.skip_whitespace();
    match reader.peek() {
        None => Ok(expression),
        Some(')') => Err(reader.malformed("unmatched closing parenthesis", reader.pos)),
        Some('|') => Err(reader.malformed(
            "`|` is only allowed inside parentheses, use separate expressions for top-level alternatives",
            reader.pos,
        )),
        Some(c) => Err(reader.malformed(format!("unexpected character `{}`", c), reader.pos)),
    }
}

struct ExpressionReader<'r> {
    rule: &'r str,
    text: &'r str,
    pos: usize,
    symbols: &'r SymbolTable<'r>,
}

impl ExpressionReader<'_> {
    fn sequence(&mut self) -> Result<Expression, GrammarError> {
        let mut elements = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some(')') | Some('|') => break,
                Some(_) => elements.push(self.item()?),
            }
        }
        Ok(Expression::new(elements))
    }

    fn item(&mut self) -> Result<Element, GrammarError> {
        let primary = self.primary()?;
        let element = match self.peek() {
            Some('?') => Element::ZeroOrOne(Box::new(primary)),
            Some('*') => Element::ZeroOrMore(Box::new(primary)),
            Some('+') => Element::OneOrMore(Box::new(primary)),
            _ => return Ok(primary),
        };
        self.bump();
        if let Some(c @ ('?' | '*' | '+')) = self.peek() {
            return Err(self.malformed(
                format!("suffix `{}` cannot follow another suffix, use parentheses", c),
                self.pos,
            ));
        }
        Ok(element)
    }

    fn primary(&mut self) -> Result<Element, GrammarError> {
        match self.peek() {
            Some('(') => self.group(),
            Some(c) if c == '_' || c.is_ascii_alphabetic() => self.name(),
            Some(c @ ('?' | '*' | '+')) => Err(self.malformed(
                format!("suffix `{}` has no element to apply to", c),
                self.pos,
            )),
            Some(c) => Err(self.malformed(format!("unexpected character `{}`", c), self.pos)),
            None => Err(self.malformed("unexpected end of expression", self.pos)),
        }
    }

    fn group(&mut self) -> Result<Element, GrammarError> {
        let open = self.pos;
        self.bump();
        let mut alternatives = vec![self.sequence()?];
        while self.peek() == Some('|') {
            self.bump();
            alternatives.push(self.sequence()?);
        }
        if self.peek() != Some(')') {
            return Err(self.malformed("unclosed parenthesis", open));
        }
        self.bump();
        Ok(Element::Alternative(alternatives))
    }

    fn name(&mut self) -> Result<Element, GrammarError> {
        let start = self.pos;
        let len = NAME_REGEX
            .find(&self.text[start..])
            .map(|m| m.end())
            .unwrap_or(0);
        self.pos += len;
        let name = &self.text[start..self.pos];

        match self.symbols.get(name) {
            Some(Symbol::Terminal) => Ok(Element::Terminal(name.to_string())),
            Some(Symbol::Rule(index)) => Ok(Element::Rule {
                name: name.to_string(),
                index,
            }),
            None => Err(GrammarError::UnknownSymbol {
                rule: self.rule.to_string(),
                symbol: name.to_string(),
                expression: self.text.to_string(),
                span: Span::new(start, self.pos),
            }),
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn malformed(&self, reason: impl Into<String>, at: usize) -> GrammarError {
        GrammarError::MalformedExpression {
            rule: self.rule.to_string(),
            expression: self.text.to_string(),
            reason: reason.into(),
            span: Span::new(at, (at + 1).min(self.text.len()).max(at)),
        }
    }
}
