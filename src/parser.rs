// File: src/parser.rs
//
// Expression parser for the Quasi language.
// Transforms a sequence of tokens into an owned binary expression tree.
//
// The parser works on index ranges of one shared token slice. For each range
// it reads a single operand (scalar, identifier, parenthesised group or unary
// prefix), then the operator that follows it, then recursively parses the
// whole remainder of the range. Operator precedence is restored afterwards by
// rotating the new operator node down the left spine of the parsed remainder
// until it sits beneath every operator that binds looser than it.
//
// Precedence (lower binds looser):
//   (  -5    =  -4    + -  -3    * /  -2    **  -1    leaf  0
//
// `+ - * /` associate to the left, `**` and `=` to the right.

use crate::ast::{Expr, NodeKind};
use crate::errors::ParseError;
use crate::lexer::{OperatorKind, Token, TokenKind};

/// Parser over a borrowed token slice
pub struct Parser<'a> {
    tokens: &'a [Token],
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens }
    }

    /// Parses the whole token slice into one expression tree
    pub fn parse(&self) -> Result<Expr, ParseError> {
        self.parse_range(0, self.tokens.len())
    }

    fn parse_range(&self, start: usize, end: usize) -> Result<Expr, ParseError> {
        if start >= end {
            return Err(ParseError::EmptyInput);
        }

        let (leaf, cursor) = self.parse_operand(start, end)?;
        if cursor >= end {
            return Ok(leaf);
        }

        let token = &self.tokens[cursor];
        let op = match &token.kind {
            TokenKind::Operator(OperatorKind::CloseParen) => {
                return Err(ParseError::UnmatchedParen { location: token.location() });
            }
            TokenKind::Operator(op) if op.is_binary() => *op,
            TokenKind::Operator(op) => {
                return Err(ParseError::UnexpectedOperator { op: *op, location: token.location() });
            }
            other => {
                return Err(ParseError::ExpectedOperator {
                    found: other.to_string(),
                    location: token.location(),
                });
            }
        };

        if cursor + 1 >= end {
            return Err(ParseError::MissingOperand {
                after: op.symbol().to_string(),
                location: token.location(),
            });
        }

        let mut current = Expr::new(NodeKind::Operator(op), token.location());
        current.left = Some(Box::new(leaf));

        let next = self.parse_range(cursor + 1, end)?;
        Ok(reconcile(current, next))
    }

    /// Reads one operand starting at `start`; returns it with the index of the
    /// first token after it.
    fn parse_operand(&self, start: usize, end: usize) -> Result<(Expr, usize), ParseError> {
        let token = &self.tokens[start];
        let location = token.location();

        match &token.kind {
            TokenKind::Scalar(n) => Ok((Expr::new(NodeKind::Scalar(*n), location), start + 1)),
            TokenKind::Identifier(name) => {
                Ok((Expr::new(NodeKind::Identifier(name.clone()), location), start + 1))
            }
            TokenKind::Operator(OperatorKind::OpenParen) => {
                let close = self.matching_paren(start, end)?;
                if close == start + 1 {
                    return Err(ParseError::MissingOperand { after: "(".into(), location });
                }

                let mut group = Expr::new(NodeKind::Operator(OperatorKind::OpenParen), location);
                group.left = Some(Box::new(self.parse_range(start + 1, close)?));
                Ok((group, close + 1))
            }
            TokenKind::Operator(op @ (OperatorKind::Add | OperatorKind::Sub)) => {
                if start + 1 >= end {
                    return Err(ParseError::MissingOperand { after: op.symbol().to_string(), location });
                }

                // a prefix sign applies to exactly one operand
                let (operand, cursor) = self.parse_operand(start + 1, end)?;
                let mut unary = Expr::new(NodeKind::Operator(*op), location);
                unary.right = Some(Box::new(operand));
                Ok((unary, cursor))
            }
            TokenKind::Operator(op) => Err(ParseError::UnexpectedOperator { op: *op, location }),
            TokenKind::Keyword(_) | TokenKind::Type(_) => Err(ParseError::UnexpectedToken {
                found: token.kind.to_string(),
                location,
            }),
        }
    }

    /// Index of the `)` closing the `(` at `open`, searching no further than `end`
    fn matching_paren(&self, open: usize, end: usize) -> Result<usize, ParseError> {
        let mut depth = 1usize;

        for (i, token) in self.tokens[open + 1..end].iter().enumerate() {
            match token.op() {
                Some(OperatorKind::OpenParen) => depth += 1,
                Some(OperatorKind::CloseParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(open + 1 + i);
                    }
                }
                _ => {}
            }
        }

        Err(ParseError::UnmatchedParen { location: self.tokens[open].location() })
    }
}

/// Parses a complete token sequence into an expression tree.
///
/// # Errors
/// `EmptyInput` for an empty slice, `UnmatchedParen` for unbalanced
/// parentheses, `UnexpectedOperator` when an operator other than `(`, `+` or
/// `-` starts an operand, `ExpectedOperator` when two operands are adjacent,
/// `UnexpectedToken` for keywords or type names and `MissingOperand` for an
/// operator or group with nothing to apply to.
pub fn parse(tokens: &[Token]) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}

/// Whether `next`, the tree parsed to the right of `current`, must become
/// `current`'s parent instead of its right child.
fn yields_to(current: &Expr, next: &Expr) -> bool {
    if !next.is_binary() {
        return false;
    }

    let (mine, theirs) = (current.precedence(), next.precedence());
    match current.op() {
        Some(op) if op.is_right_associative() => theirs < mine,
        _ => theirs <= mine,
    }
}

/// Attaches `next` to `current`, rotating down `next`'s left spine so that
/// tighter-binding operators end up closer to the leaves.
fn reconcile(mut current: Expr, mut next: Expr) -> Expr {
    if yields_to(&current, &next) {
        if let Some(operand) = next.left.take() {
            next.left = Some(Box::new(reconcile(current, *operand)));
            return next;
        }
    }

    current.right = Some(Box::new(next));
    current
}
