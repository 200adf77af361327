// File: src/ast.rs
//
// Expression tree definitions for the Quasi language.
//
// An expression is a strict binary tree: every node owns its optional left and
// right subtrees. Operator nodes are binary operators (both children), unary
// prefix `+`/`-` (right child only) or parenthesised groups (left child only).
// Scalars and identifiers are leaves.

use crate::errors::SourceLocation;
use crate::lexer::{OperatorKind, Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(f64),
    Identifier(String),
    Operator(OperatorKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: NodeKind,
    pub left: Option<Box<Expr>>,
    pub right: Option<Box<Expr>>,
    pub location: SourceLocation,
}

impl Expr {
    pub fn new(kind: NodeKind, location: SourceLocation) -> Self {
        Expr { kind, left: None, right: None, location }
    }

    /// Builds a childless node from a token. Keywords and type names have no
    /// expression form.
    pub fn from_token(token: &Token) -> Option<Self> {
        let kind = match &token.kind {
            TokenKind::Scalar(n) => NodeKind::Scalar(*n),
            TokenKind::Identifier(name) => NodeKind::Identifier(name.clone()),
            TokenKind::Operator(op) => NodeKind::Operator(*op),
            TokenKind::Keyword(_) | TokenKind::Type(_) => return None,
        };
        Some(Expr::new(kind, token.location()))
    }

    pub fn scalar(value: f64) -> Self {
        Expr::new(NodeKind::Scalar(value), SourceLocation::unknown())
    }

    pub fn identifier(name: &str) -> Self {
        Expr::new(NodeKind::Identifier(name.to_string()), SourceLocation::unknown())
    }

    pub fn binary(op: OperatorKind, left: Expr, right: Expr) -> Self {
        let mut node = Expr::new(NodeKind::Operator(op), SourceLocation::unknown());
        node.left = Some(Box::new(left));
        node.right = Some(Box::new(right));
        node
    }

    pub fn unary(op: OperatorKind, operand: Expr) -> Self {
        let mut node = Expr::new(NodeKind::Operator(op), SourceLocation::unknown());
        node.right = Some(Box::new(operand));
        node
    }

    pub fn group(inner: Expr) -> Self {
        let mut node = Expr::new(NodeKind::Operator(OperatorKind::OpenParen), SourceLocation::unknown());
        node.left = Some(Box::new(inner));
        node
    }

    pub fn op(&self) -> Option<OperatorKind> {
        match self.kind {
            NodeKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self.op(), Some(OperatorKind::Add | OperatorKind::Sub))
            && self.left.is_none()
            && self.right.is_some()
    }

    pub fn is_group(&self) -> bool {
        self.op() == Some(OperatorKind::OpenParen)
    }

    /// An operator applied to two operands
    pub fn is_binary(&self) -> bool {
        self.op().map_or(false, OperatorKind::is_binary) && self.left.is_some()
    }

    /// Binding strength of the node as it stands in the tree. Unary prefix
    /// nodes and closed groups are complete operands and rank as leaves.
    pub fn precedence(&self) -> i32 {
        match self.op() {
            Some(op) if self.is_binary() => op.precedence(),
            _ => 0,
        }
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |l| l.depth());
        let right = self.right.as_ref().map_or(0, |r| r.depth());
        1 + left.max(right)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            NodeKind::Scalar(n) => write!(f, "{}", n),
            NodeKind::Identifier(name) => f.write_str(name),
            NodeKind::Operator(OperatorKind::OpenParen) => match &self.left {
                Some(inner) => write!(f, "({})", inner),
                None => f.write_str("(?)"),
            },
            NodeKind::Operator(op) => match (&self.left, &self.right) {
                (Some(left), Some(right)) => write!(f, "({} {} {})", left, op, right),
                (None, Some(operand)) => write!(f, "({}{})", op, operand),
                (Some(left), None) => write!(f, "({} {} ?)", left, op),
                (None, None) => write!(f, "{}", op),
            },
        }
    }
}
