//! Forward-mode differentiation with dual numbers.
//!
//! A [`Dual`] carries a value together with its derivative along one
//! seeded variable. Folding an expression over duals yields `f(env)` and
//! `∂f/∂var` from a single traversal. Arithmetic on duals follows
//! `ε² = 0`:
//!
//! - `(a + a′ε) + (b + b′ε) = (a + b) + (a′ + b′)ε`
//! - `(a + a′ε) · (b + b′ε) = ab + (a′b + ab′)ε`
//! - `(a + a′ε) / (b + b′ε) = a/b + ((a′b − ab′) / b²)ε`
//! - `g(a + a′ε) = g(a) + g′(a)·a′ε` for `sin`, `cos`, `ln`, `exp`
//!
//! A full gradient needs one traversal per variable; see
//! [`forward_gradient`]. With the `parallel` feature those traversals
//! run on the rayon pool.

use std::ops::{Add, Div, Mul, Neg, Sub};

use num_traits::Float;
use tracing::{debug, trace};

use crate::env::{Environment, VarId};
use crate::error::Result;
use crate::expr::{node_count, variables, BinaryOp, Expr, Leaf, UnaryOp};
use crate::fold::{fold, fold_then, Child, Handlers};

/// A value paired with its derivative.
///
/// ```
/// use exprdiff::forward::Dual;
///
/// // f(x) = x·sin(x) at x = 2
/// let x = Dual::variable(2.0_f64);
/// let f = x * x.sin();
///
/// assert_eq!(f.value, 2.0 * 2.0_f64.sin());
/// assert_eq!(f.deriv, 2.0_f64.sin() + 2.0 * 2.0_f64.cos());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual<T> {
    /// Primal value.
    pub value: T,
    /// Derivative along the seeded direction.
    pub deriv: T,
}

impl<T: Float> Dual<T> {
    /// A dual with an explicit derivative.
    pub fn new(value: T, deriv: T) -> Self {
        Self { value, deriv }
    }

    /// A quantity that does not depend on the seeded variable.
    pub fn constant(value: T) -> Self {
        Self::new(value, T::zero())
    }

    /// The seeded variable itself.
    pub fn variable(value: T) -> Self {
        Self::new(value, T::one())
    }

    /// `sin(self)`
    pub fn sin(self) -> Self {
        Self::new(self.value.sin(), self.deriv * self.value.cos())
    }

    /// `cos(self)`
    pub fn cos(self) -> Self {
        Self::new(self.value.cos(), -self.deriv * self.value.sin())
    }

    /// `ln(self)`
    pub fn ln(self) -> Self {
        Self::new(self.value.ln(), self.deriv / self.value)
    }

    /// `exp(self)`
    pub fn exp(self) -> Self {
        let e = self.value.exp();
        Self::new(e, self.deriv * e)
    }
}

impl<T: Float> Add for Dual<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.value + rhs.value, self.deriv + rhs.deriv)
    }
}

impl<T: Float> Sub for Dual<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.value - rhs.value, self.deriv - rhs.deriv)
    }
}

impl<T: Float> Mul for Dual<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.value * rhs.value,
            self.deriv * rhs.value + self.value * rhs.deriv,
        )
    }
}

impl<T: Float> Div for Dual<T> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::new(
            self.value / rhs.value,
            (self.deriv * rhs.value - self.value * rhs.deriv) / (rhs.value * rhs.value),
        )
    }
}

impl<T: Float> Neg for Dual<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.value, -self.deriv)
    }
}

/// Handlers folding an expression into a [`Dual`] seeded at one
/// variable.
#[derive(Debug, Clone, Copy)]
pub struct ForwardDiff<'e> {
    env: &'e Environment,
    var: VarId,
}

impl<'e> ForwardDiff<'e> {
    /// Values from `env`, derivative with respect to `var`.
    pub fn new(env: &'e Environment, var: VarId) -> Self {
        Self { env, var }
    }
}

impl Handlers for ForwardDiff<'_> {
    type Output = Dual<f64>;

    fn nullary(&mut self, leaf: Leaf) -> Result<Dual<f64>> {
        let value = leaf.value(self.env)?;
        Ok(match leaf {
            Leaf::Var(id) if id == self.var => Dual::variable(value),
            _ => Dual::constant(value),
        })
    }

    fn unary(&mut self, op: UnaryOp, arg: Child<'_, Dual<f64>>) -> Result<Dual<f64>> {
        let a = arg.value;
        Ok(match op {
            UnaryOp::Sin => a.sin(),
            UnaryOp::Cos => a.cos(),
            UnaryOp::Ln => a.ln(),
            UnaryOp::Exp => a.exp(),
        })
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: Child<'_, Dual<f64>>,
        rhs: Child<'_, Dual<f64>>,
    ) -> Result<Dual<f64>> {
        let (l, r) = (lhs.value, rhs.value);
        Ok(match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
        })
    }
}

/// `∂expr/∂var` at `env`.
///
/// # Errors
///
/// [`ExprError::UnboundVariable`](crate::ExprError::UnboundVariable)
/// if `expr` reads a variable `env` does not bind.
///
/// ```
/// use exprdiff::expr::{add, mul, variable};
/// use exprdiff::{forward_diff, Environment};
///
/// let e = add(variable(0), mul(variable(0), variable(1)));
/// let env = Environment::from([(0, 2.0), (1, 3.0)]);
/// assert_eq!(forward_diff(&env, 0, &e), Ok(4.0));
/// ```
pub fn forward_diff(env: &Environment, var: VarId, expr: &Expr) -> Result<f64> {
    debug!(var, nodes = node_count(expr), "forward diff");
    fold_then(expr, ForwardDiff::new(env, var), |dual| dual.deriv)
}

/// Value and `∂expr/∂var` at `env`, from the same traversal.
pub fn forward_value_and_diff(env: &Environment, var: VarId, expr: &Expr) -> Result<Dual<f64>> {
    debug!(var, nodes = node_count(expr), "forward value and diff");
    fold(expr, ForwardDiff::new(env, var))
}

/// Gradient of `expr` at `env`, one forward traversal per variable
/// occurring in `expr`.
///
/// The result binds exactly the variables of `expr`.
pub fn forward_gradient(env: &Environment, expr: &Expr) -> Result<Environment> {
    let vars: Vec<VarId> = variables(expr).into_iter().collect();
    debug!(vars = vars.len(), nodes = node_count(expr), "forward gradient");
    gradient_over(env, expr, vars)
}

fn partial(env: &Environment, expr: &Expr, var: VarId) -> Result<Environment> {
    let deriv = fold_then(expr, ForwardDiff::new(env, var), |dual| dual.deriv)?;
    trace!(var, deriv, "partial");
    Ok(Environment::singleton(var, deriv))
}

#[cfg(feature = "parallel")]
fn gradient_over(env: &Environment, expr: &Expr, vars: Vec<VarId>) -> Result<Environment> {
    use algebra_core::Semigroup;
    use rayon::prelude::*;

    vars.into_par_iter()
        .map(|var| partial(env, expr, var))
        .try_reduce(Environment::empty, |a, b| Ok(a.combine(&b)))
}

#[cfg(not(feature = "parallel"))]
fn gradient_over(env: &Environment, expr: &Expr, vars: Vec<VarId>) -> Result<Environment> {
    use algebra_core::Monoid;

    let partials = vars
        .into_iter()
        .map(|var| partial(env, expr, var))
        .collect::<Result<Vec<_>>>()?;
    Ok(Environment::concat(partials))
}
