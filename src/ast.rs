//! AST module for Parsegen
//!
//! The labeled tree produced by a successful parse. Every node is labeled by
//! the rule or terminal that produced it, owns its children exclusively, and
//! carries the byte span of input it covers.

// ============================================================================
// IMPORTS
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexer::Token;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the input text, as byte offsets.
///
/// # Examples
///
/// ```rust
/// use parsegen::ast::Span;
/// let span = Span::new(0, 5);
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One node of the parse result.
///
/// Rule nodes have children and no value; terminal leaves hold the matched
/// token text and have no children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstNode {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
    pub span: Span,
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty span sitting at `index`.
    pub fn point(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

impl AstNode {
    /// Builds a terminal leaf from a consumed token.
    pub fn leaf(token: &Token) -> Self {
        Self {
            label: token.terminal.clone(),
            value: Some(token.value.clone()),
            children: Vec::new(),
            span: token.span(),
        }
    }

    /// Builds a rule node. An empty child list yields a node covering `fallback`.
    pub fn node(label: impl Into<String>, children: Vec<AstNode>, fallback: Span) -> Self {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.span.join(last.span),
            _ => fallback,
        };
        Self {
            label: label.into(),
            value: None,
            children,
            span,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    /// Terminal leaves in input order.
    pub fn leaves(&self) -> Vec<&AstNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    /// All nodes labeled `label`, in pre-order.
    pub fn find_all<'a>(&'a self, label: &str) -> Vec<&'a AstNode> {
        let mut out = Vec::new();
        self.collect_labeled(label, &mut out);
        out
    }

    /// Pretty-prints the tree as a single s-expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use parsegen::ast::{AstNode, Span};
    /// let leaf = AstNode {
    ///     label: "identifier".into(),
    ///     value: Some("foo".into()),
    ///     children: vec![],
    ///     span: Span::new(0, 3),
    /// };
    /// let root = AstNode::node("main", vec![leaf], Span::point(0));
    /// assert_eq!(root.pretty(), r#"(main (identifier "foo"))"#);
    /// ```
    pub fn pretty(&self) -> String {
        if let Some(value) = &self.value {
            return format!("({} {:?})", self.label, value);
        }
        if self.children.is_empty() {
            return format!("({})", self.label);
        }
        let inner = self
            .children
            .iter()
            .map(AstNode::pretty)
            .collect::<Vec<_>>()
            .join(" ");
        format!("({} {})", self.label, inner)
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a AstNode>) {
        if self.is_leaf() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }

    fn collect_labeled<'a>(&'a self, label: &str, out: &mut Vec<&'a AstNode>) {
        if self.label == label {
            out.push(self);
        }
        for child in &self.children {
            child.collect_labeled(label, out);
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}
