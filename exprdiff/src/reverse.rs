//! Reverse-mode differentiation.
//!
//! Two passes over the tree give the whole gradient:
//!
//! 1. [`annotate`] evaluates bottom-up and keeps each node's value.
//! 2. [`backprop`] walks top-down from an adjoint of `1.0` at the root,
//!    handing each child its parent's adjoint times the local partial
//!    derivative, and sums what arrives at each variable.
//!
//! The cost is independent of the number of variables.

use std::collections::BTreeMap;

use tracing::debug;

use crate::env::{Environment, VarId};
use crate::error::Result;
use crate::expr::{node_count, Expr, ExprF, Leaf};
use crate::tagged::{annotate, value_of, Tagged};

/// Propagates adjoints from the root of an annotated tree down to its
/// variables.
///
/// The result binds every variable occurring in `tagged`, including
/// those whose adjoint is zero. A variable reached along several paths
/// (repeated occurrences or a shared subtree) receives the sum of the
/// adjoints along all of them. Adjoints reaching constants are dropped.
///
/// The walk keeps its pending nodes on a heap stack.
pub fn backprop(tagged: &Tagged<f64>) -> Environment {
    let mut adjoints: BTreeMap<VarId, f64> = BTreeMap::new();
    let mut pending: Vec<(&Tagged<f64>, f64)> = vec![(tagged, 1.0)];
    let mut visited = 0usize;

    while let Some((node, adjoint)) = pending.pop() {
        visited += 1;
        match &node.as_out().node {
            ExprF::Leaf(Leaf::Var(id)) => *adjoints.entry(*id).or_insert(0.0) += adjoint,
            ExprF::Leaf(_) => {}
            ExprF::Unary(op, arg) => {
                pending.push((arg, adjoint * op.derivative(value_of(arg))));
            }
            ExprF::Binary(op, lhs, rhs) => {
                let (dl, dr) = op.partials(value_of(lhs), value_of(rhs));
                pending.push((rhs, adjoint * dr));
                pending.push((lhs, adjoint * dl));
            }
        }
    }

    debug!(visited, vars = adjoints.len(), "backprop");
    adjoints.into_iter().collect()
}

/// Gradient of `expr` at `env`: one annotation pass, one backward pass.
///
/// Only variables occurring in `expr` are bound in the result; it is
/// never merged with `env`.
///
/// # Errors
///
/// [`ExprError::UnboundVariable`](crate::ExprError::UnboundVariable)
/// if `expr` reads a variable `env` does not bind.
///
/// ```
/// use exprdiff::expr::{add, mul, variable};
/// use exprdiff::{backward_all_diff, Environment};
///
/// let e = add(variable(0), mul(variable(0), variable(1)));
/// let grad = backward_all_diff(&Environment::from([(0, 2.0), (1, 3.0)]), &e).unwrap();
///
/// assert_eq!(grad, Environment::from([(0, 4.0), (1, 2.0)]));
/// ```
pub fn backward_all_diff(env: &Environment, expr: &Expr) -> Result<Environment> {
    backward_value_and_gradient(env, expr).map(|(_, gradient)| gradient)
}

/// Value and gradient of `expr` at `env` from the same two passes.
pub fn backward_value_and_gradient(env: &Environment, expr: &Expr) -> Result<(f64, Environment)> {
    debug!(nodes = node_count(expr), "backward value and gradient");
    let tagged = annotate(env, expr)?;
    Ok((value_of(&tagged), backprop(&tagged)))
}
