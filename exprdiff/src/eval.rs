//! Numeric evaluation.

use tracing::debug;

use crate::env::Environment;
use crate::error::Result;
use crate::expr::{node_count, BinaryOp, Expr, Leaf, UnaryOp};
use crate::fold::{fold, Child, Handlers};

/// Handlers computing the `f64` value of each node under an
/// [`Environment`].
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'e> {
    env: &'e Environment,
}

impl<'e> Evaluator<'e> {
    /// An evaluator reading variables from `env`.
    pub fn new(env: &'e Environment) -> Self {
        Self { env }
    }
}

impl Handlers for Evaluator<'_> {
    type Output = f64;

    fn nullary(&mut self, leaf: Leaf) -> Result<f64> {
        leaf.value(self.env)
    }

    fn unary(&mut self, op: UnaryOp, arg: Child<'_, f64>) -> Result<f64> {
        Ok(op.apply(arg.value))
    }

    fn binary(&mut self, op: BinaryOp, lhs: Child<'_, f64>, rhs: Child<'_, f64>) -> Result<f64> {
        Ok(op.apply(lhs.value, rhs.value))
    }
}

/// Evaluates `expr` under `env`.
///
/// Division by zero and logarithms of non-positive numbers follow IEEE
/// arithmetic and produce infinities or NaN.
///
/// # Errors
///
/// [`ExprError::UnboundVariable`](crate::ExprError::UnboundVariable)
/// for the first variable (left to right) that `env` does not bind.
///
/// ```
/// use exprdiff::expr::{add, constant, mul, variable};
/// use exprdiff::{evaluate, Environment};
///
/// let e = add(variable(0), mul(variable(0), constant(3.0)));
/// let env = Environment::from([(0, 2.0)]);
/// assert_eq!(evaluate(&env, &e), Ok(8.0));
/// ```
pub fn evaluate(env: &Environment, expr: &Expr) -> Result<f64> {
    debug!(nodes = node_count(expr), bound = env.len(), "evaluate");
    fold(expr, Evaluator::new(env))
}
