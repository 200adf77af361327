// File: src/interpreter/mod.rs
//
// Tree-walking evaluator for the Quasi language.
// Computes the scalar value of an expression tree against a mutable
// environment of variable bindings.
//
// Evaluation rules:
// - Scalars evaluate to themselves, identifiers to their binding
// - Binary operators evaluate the left operand before the right one
// - Unary `+`/`-` apply to their right operand
// - `(` groups pass through the value of their inner expression
// - `name = expr` binds the value of `expr` and yields it
//
// All arithmetic is IEEE-754 double precision: division by zero gives an
// infinity or NaN rather than an error.

mod environment;

pub use environment::Environment;

use crate::ast::{Expr, NodeKind};
use crate::errors::{EvalError, QuasiError};
use crate::lexer::{tokenize, OperatorKind};
use crate::parser::parse;

/// Evaluates `expr`, reading and assigning variables in `env`.
///
/// # Errors
/// `UndefinedVariable` for a reference to an unbound name,
/// `InvalidAssignmentTarget` when the left of `=` is not a name and
/// `MalformedTree` for a node missing a required child.
pub fn evaluate(expr: &Expr, env: &mut Environment) -> Result<f64, EvalError> {
    match &expr.kind {
        NodeKind::Operator(op) => eval_operator(*op, expr, env),
        NodeKind::Scalar(n) => Ok(*n),
        NodeKind::Identifier(name) => env.get(name).ok_or_else(|| EvalError::UndefinedVariable {
            name: name.clone(),
            location: expr.location.clone(),
        }),
    }
}

fn eval_operator(op: OperatorKind, expr: &Expr, env: &mut Environment) -> Result<f64, EvalError> {
    match (op, expr.left.as_deref(), expr.right.as_deref()) {
        (OperatorKind::Add, None, Some(operand)) => evaluate(operand, env),
        (OperatorKind::Sub, None, Some(operand)) => Ok(-evaluate(operand, env)?),
        (OperatorKind::OpenParen, Some(inner), None) => evaluate(inner, env),
        (OperatorKind::Assign, Some(target), Some(value)) => assign(target, value, env),
        (op, Some(left), Some(right)) if op.is_binary() => {
            let lhs = evaluate(left, env)?;
            let rhs = evaluate(right, env)?;
            apply(op, lhs, rhs).ok_or_else(|| EvalError::MalformedTree {
                reason: format!("'{}' has no arithmetic meaning", op),
            })
        }
        (op, _, _) if op.is_binary() || op == OperatorKind::OpenParen => {
            Err(EvalError::MalformedTree { reason: format!("'{}' is missing an operand", op) })
        }
        (op, _, _) => {
            Err(EvalError::MalformedTree { reason: format!("'{}' cannot appear in an expression", op) })
        }
    }
}

fn apply(op: OperatorKind, lhs: f64, rhs: f64) -> Option<f64> {
    let value = match op {
        OperatorKind::Add => lhs + rhs,
        OperatorKind::Sub => lhs - rhs,
        OperatorKind::Mul => lhs * rhs,
        OperatorKind::Div => lhs / rhs,
        OperatorKind::Exp => lhs.powf(rhs),
        _ => return None,
    };
    Some(value)
}

fn assign(target: &Expr, value: &Expr, env: &mut Environment) -> Result<f64, EvalError> {
    let name = match &target.kind {
        NodeKind::Identifier(name) => name,
        _ => {
            return Err(EvalError::InvalidAssignmentTarget {
                found: target.to_string(),
                location: target.location.clone(),
            });
        }
    };

    let result = evaluate(value, env)?;
    env.set(name.as_str(), result);
    Ok(result)
}

/// One evaluation session: a long-lived environment fed one line at a time
#[derive(Debug, Default, Clone)]
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter { env: Environment::new() }
    }

    pub fn with_environment(env: Environment) -> Self {
        Interpreter { env }
    }

    /// Tokenizes, parses and evaluates one line of input.
    ///
    /// Returns `Ok(None)` for input with no tokens (blank lines, comments).
    /// Any error aborts only this line; bindings made by earlier lines, and by
    /// assignments that completed before the failure, are kept.
    pub fn eval_line(&mut self, source: &str) -> Result<Option<f64>, QuasiError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Ok(None);
        }

        let expr = parse(&tokens)?;
        Ok(Some(self.eval_expr(&expr)?))
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<f64, EvalError> {
        evaluate(expr, &mut self.env)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Drops every binding
    pub fn reset(&mut self) {
        self.env.clear();
    }
}
