//! Symbolic differentiation.
//!
//! [`differentiate`] turns an expression into a new expression for its
//! derivative with respect to one variable. The rules are applied
//! literally and the result is not simplified, so derivatives grow
//! quickly; they are ordinary [`Expr`] values and can be evaluated,
//! rendered, or differentiated again.
//!
//! ```
//! use exprdiff::expr::{mul, variable};
//! use exprdiff::{differentiate, evaluate, Environment};
//!
//! let e = mul(variable(0), variable(0));
//! let de = differentiate(0, &e).unwrap();
//! assert_eq!(de.to_string(), "((1 * x0) + (x0 * 1))");
//! assert_eq!(evaluate(&Environment::singleton(0, 5.0), &de), Ok(10.0));
//! ```

use tracing::{debug, trace};

use crate::env::{Environment, VarId};
use crate::error::Result;
use crate::eval::evaluate;
use crate::expr::{
    add, cos, div, exp, mul, node_count, one, sin, sub, variables, zero, BinaryOp, Expr, Leaf,
    UnaryOp,
};
use crate::fold::{fold, Child, Handlers};

/// Handlers building `d expr / d var`.
///
/// Each [`Child`] carries both the original subtree (needed by the
/// product, quotient and chain rules) and its derivative.
#[derive(Debug, Clone, Copy)]
pub struct Differentiator {
    var: VarId,
}

impl Differentiator {
    /// Differentiates with respect to `var`.
    pub fn new(var: VarId) -> Self {
        Self { var }
    }
}

impl Handlers for Differentiator {
    type Output = Expr;

    fn nullary(&mut self, leaf: Leaf) -> Result<Expr> {
        Ok(match leaf {
            Leaf::Var(id) if id == self.var => one(),
            _ => zero(),
        })
    }

    fn unary(&mut self, op: UnaryOp, arg: Child<'_, Expr>) -> Result<Expr> {
        let a = arg.expr.clone();
        let da = arg.value;
        Ok(match op {
            UnaryOp::Sin => mul(cos(a), da),
            UnaryOp::Cos => sub(zero(), mul(sin(a), da)),
            UnaryOp::Exp => mul(exp(a), da),
            UnaryOp::Ln => mul(div(one(), a), da),
        })
    }

    fn binary(&mut self, op: BinaryOp, lhs: Child<'_, Expr>, rhs: Child<'_, Expr>) -> Result<Expr> {
        let (a, da) = (lhs.expr, lhs.value);
        let (b, db) = (rhs.expr, rhs.value);
        Ok(match op {
            BinaryOp::Add => add(da, db),
            BinaryOp::Sub => sub(da, db),
            BinaryOp::Mul => add(mul(da, b.clone()), mul(a.clone(), db)),
            BinaryOp::Div => div(
                sub(mul(da, b.clone()), mul(a.clone(), db)),
                mul(b.clone(), b.clone()),
            ),
        })
    }
}

/// The derivative of `expr` with respect to `var`, as a new expression.
///
/// No environment is involved: variables other than `var` differentiate
/// to `Zero`, and a `var` that does not occur yields an expression
/// evaluating to zero.
pub fn differentiate(var: VarId, expr: &Expr) -> Result<Expr> {
    debug!(var, nodes = node_count(expr), "differentiate");
    fold(expr, Differentiator::new(var))
}

/// Gradient of `expr` at `env` by differentiating once per variable
/// occurring in `expr` and evaluating each derivative.
///
/// The result binds exactly the variables of `expr`.
///
/// # Errors
///
/// [`ExprError::UnboundVariable`](crate::ExprError::UnboundVariable)
/// for the first variable of `expr` that `env` does not bind, even one
/// whose derivative no longer mentions it.
pub fn symbolic_gradient(env: &Environment, expr: &Expr) -> Result<Environment> {
    let vars = variables(expr);
    debug!(vars = vars.len(), "symbolic gradient");
    // Derivatives can drop a variable, so check the bindings up front.
    evaluate(env, expr)?;
    vars.into_iter()
        .map(|var| {
            let derivative = differentiate(var, expr)?;
            trace!(var, nodes = node_count(&derivative), "derivative built");
            Ok((var, evaluate(env, &derivative)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExprError;
    use crate::expr::*;
    use approx::assert_relative_eq;

    fn d(var: VarId, e: &Expr) -> Expr {
        differentiate(var, e).unwrap()
    }

    #[test]
    fn leaf_rules() {
        assert_eq!(d(0, &variable(0)), one());
        assert_eq!(d(0, &variable(1)), zero());
        assert_eq!(d(0, &constant(3.0)), zero());
        assert_eq!(d(0, &one()), zero());
        assert_eq!(d(0, &zero()), zero());
    }

    #[test]
    fn rules_are_applied_literally() {
        let x = variable(0);
        let y = variable(1);

        assert_eq!(d(0, &add(x.clone(), y.clone())), add(one(), zero()));
        assert_eq!(d(0, &sub(x.clone(), y.clone())), sub(one(), zero()));
        assert_eq!(
            d(0, &mul(x.clone(), y.clone())),
            add(mul(one(), y.clone()), mul(x.clone(), zero()))
        );
        assert_eq!(
            d(0, &div(x.clone(), y.clone())),
            div(
                sub(mul(one(), y.clone()), mul(x.clone(), zero())),
                mul(y.clone(), y.clone())
            )
        );
        assert_eq!(d(0, &sin(x.clone())), mul(cos(x.clone()), one()));
        assert_eq!(
            d(0, &cos(x.clone())),
            sub(zero(), mul(sin(x.clone()), one()))
        );
        assert_eq!(d(0, &exp(x.clone())), mul(exp(x.clone()), one()));
        assert_eq!(d(0, &ln(x.clone())), mul(div(one(), x), one()));
    }

    #[test]
    fn chain_rule_evaluates_correctly() {
        // d/dx sin(x * x) = 2x cos(x * x)
        let x = variable(0);
        let e = sin(mul(x.clone(), x));
        let env = Environment::singleton(0, 1.3);
        let v = 1.3f64;
        assert_relative_eq!(
            evaluate(&env, &d(0, &e)).unwrap(),
            2.0 * v * (v * v).cos(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn second_derivative() {
        // d²/dx² x³ = 6x
        let e = power(3, variable(0));
        let dd = d(0, &d(0, &e));
        assert_relative_eq!(
            evaluate(&Environment::singleton(0, 2.0), &dd).unwrap(),
            12.0
        );
    }

    #[test]
    fn derivative_needs_no_environment_until_evaluated() {
        let e = mul(variable(0), variable(1));
        let de = d(0, &e);
        assert_eq!(
            evaluate(&Environment::singleton(0, 1.0), &de),
            Err(ExprError::UnboundVariable(1))
        );
    }

    #[test]
    fn gradient_binds_every_occurring_variable() {
        let e = add(variable(0), mul(variable(0), variable(1)));
        let env = Environment::from([(0, 2.0), (1, 3.0), (7, 1.0)]);
        let grad = symbolic_gradient(&env, &e).unwrap();
        assert_eq!(grad, Environment::from([(0, 4.0), (1, 2.0)]));
    }

    #[test]
    fn gradient_reports_variables_lost_by_differentiation() {
        // d/dx0 and d/dx1 of x0 + x1 are constants, yet x0 is unbound.
        let e = add(variable(0), variable(1));
        let env = Environment::singleton(1, 2.0);
        assert_eq!(
            symbolic_gradient(&env, &e),
            Err(ExprError::UnboundVariable(0))
        );
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut e = variable(0);
        for _ in 0..100_000 {
            e = add(e, one());
        }
        let de = d(0, &e);
        assert_eq!(evaluate(&Environment::empty(), &de), Ok(1.0));
    }
}
