//! Expression trees.
//!
//! An [`Expr`] is the fixed point of the base functor [`ExprF`]. Nodes
//! are grouped by shape ([`Leaf`], unary [`UnaryOp`], binary
//! [`BinaryOp`]) so a traversal can dispatch on arity alone and leave
//! the per-kind behaviour to its handlers.
//!
//! Expressions are immutable. Subtrees sit behind an `Arc`, so reusing
//! a subexpression in several places (or several formulas) costs a
//! reference count, not a copy.
//!
//! ```
//! use exprdiff::expr::{add, mul, sin, variable};
//!
//! let x = variable(0);
//! let y = variable(1);
//! let e = add(mul(x.clone(), y), sin(x));
//! assert_eq!(e.to_string(), "((x0 * x1) + sin(x0))");
//! ```

use std::collections::BTreeSet;
use std::fmt;

use algebra_core::fix::{fold, Fix, Functor, TypeApp};

use crate::env::{Environment, VarId};
use crate::error::Result;

/// A node without children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf {
    /// A literal.
    Const(f64),
    /// The additive identity.
    Zero,
    /// The multiplicative identity.
    One,
    /// A variable, resolved through an [`Environment`].
    Var(VarId),
}

impl Leaf {
    /// The leaf's value; only `Var` consults `env`.
    pub fn value(&self, env: &Environment) -> Result<f64> {
        match *self {
            Leaf::Const(c) => Ok(c),
            Leaf::Zero => Ok(0.0),
            Leaf::One => Ok(1.0),
            Leaf::Var(id) => env.lookup(id),
        }
    }
}

/// Transcendental functions of one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Natural logarithm.
    Ln,
    /// Exponential.
    Exp,
}

impl UnaryOp {
    /// Applies the function.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            UnaryOp::Sin => v.sin(),
            UnaryOp::Cos => v.cos(),
            UnaryOp::Ln => v.ln(),
            UnaryOp::Exp => v.exp(),
        }
    }

    /// The function's derivative evaluated at `v`.
    pub fn derivative(self, v: f64) -> f64 {
        match self {
            UnaryOp::Sin => v.cos(),
            UnaryOp::Cos => -v.sin(),
            UnaryOp::Ln => 1.0 / v,
            UnaryOp::Exp => v.exp(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Ln => "ln",
            UnaryOp::Exp => "exp",
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `l + r`
    Add,
    /// `l - r`
    Sub,
    /// `l * r`
    Mul,
    /// `l / r` (IEEE semantics on a zero divisor)
    Div,
}

impl BinaryOp {
    /// Applies the operator.
    pub fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
        }
    }

    /// Local partial derivatives `(∂/∂l, ∂/∂r)` at `(l, r)`.
    pub fn partials(self, l: f64, r: f64) -> (f64, f64) {
        match self {
            BinaryOp::Add => (1.0, 1.0),
            BinaryOp::Sub => (1.0, -1.0),
            BinaryOp::Mul => (r, l),
            BinaryOp::Div => (1.0 / r, -l / (r * r)),
        }
    }

    fn infix(self) -> &'static str {
        match self {
            BinaryOp::Add => " + ",
            BinaryOp::Sub => " - ",
            BinaryOp::Mul => " * ",
            BinaryOp::Div => " / ",
        }
    }
}

/// One layer of an expression; `X` marks the child positions.
#[derive(Clone, Copy)]
pub enum ExprF<X> {
    /// `Const`, `Zero`, `One` or `Var`.
    Leaf(Leaf),
    /// `Sin`, `Cos`, `Ln` or `Exp` of one child.
    Unary(UnaryOp, X),
    /// `Add`, `Sub`, `Mul` or `Div` of two children.
    Binary(BinaryOp, X, X),
}

/// Type-level tag for [`ExprF`].
pub struct ExprTag;

impl TypeApp for ExprTag {
    type Applied<X> = ExprF<X>;
}

impl Functor for ExprTag {
    fn fmap<X, Y, G>(fx: ExprF<X>, mut g: G) -> ExprF<Y>
    where
        G: FnMut(X) -> Y,
    {
        match fx {
            ExprF::Leaf(leaf) => ExprF::Leaf(leaf),
            ExprF::Unary(op, x) => ExprF::Unary(op, g(x)),
            ExprF::Binary(op, l, r) => {
                let l = g(l);
                ExprF::Binary(op, l, g(r))
            }
        }
    }

    fn borrow<'a, X: 'a>(fx: &'a ExprF<X>) -> ExprF<&'a X> {
        match fx {
            ExprF::Leaf(leaf) => ExprF::Leaf(*leaf),
            ExprF::Unary(op, x) => ExprF::Unary(*op, x),
            ExprF::Binary(op, l, r) => ExprF::Binary(*op, l, r),
        }
    }
}

/// An immutable arithmetic expression.
pub type Expr = Fix<ExprTag>;

/// A literal.
pub fn constant(c: f64) -> Expr {
    Fix::new(ExprF::Leaf(Leaf::Const(c)))
}

/// The variable `x{id}`.
pub fn variable(id: VarId) -> Expr {
    Fix::new(ExprF::Leaf(Leaf::Var(id)))
}

/// `0`
pub fn zero() -> Expr {
    Fix::new(ExprF::Leaf(Leaf::Zero))
}

/// `1`
pub fn one() -> Expr {
    Fix::new(ExprF::Leaf(Leaf::One))
}

fn unary(op: UnaryOp, a: Expr) -> Expr {
    Fix::new(ExprF::Unary(op, a))
}

fn binary(op: BinaryOp, a: Expr, b: Expr) -> Expr {
    Fix::new(ExprF::Binary(op, a, b))
}

/// `a + b`
pub fn add(a: Expr, b: Expr) -> Expr {
    binary(BinaryOp::Add, a, b)
}

/// `a - b`
pub fn sub(a: Expr, b: Expr) -> Expr {
    binary(BinaryOp::Sub, a, b)
}

/// `a * b`
pub fn mul(a: Expr, b: Expr) -> Expr {
    binary(BinaryOp::Mul, a, b)
}

/// `a / b`
pub fn div(a: Expr, b: Expr) -> Expr {
    binary(BinaryOp::Div, a, b)
}

/// `sin(a)`
pub fn sin(a: Expr) -> Expr {
    unary(UnaryOp::Sin, a)
}

/// `cos(a)`
pub fn cos(a: Expr) -> Expr {
    unary(UnaryOp::Cos, a)
}

/// `ln(a)`
pub fn ln(a: Expr) -> Expr {
    unary(UnaryOp::Ln, a)
}

/// `exp(a)`
pub fn exp(a: Expr) -> Expr {
    unary(UnaryOp::Exp, a)
}

/// `0 - a`
pub fn negate(a: Expr) -> Expr {
    sub(zero(), a)
}

/// `a` multiplied by itself `n` times; `power(0, a)` is `one()`.
///
/// Every factor is the same shared subtree.
///
/// ```
/// use exprdiff::expr::{power, variable};
///
/// assert_eq!(power(3, variable(0)).to_string(), "((x0 * x0) * x0)");
/// ```
pub fn power(n: u32, a: Expr) -> Expr {
    match n {
        0 => one(),
        _ => (1..n).fold(a.clone(), |acc, _| mul(acc, a.clone())),
    }
}

/// The ids of every variable occurring in `expr`.
pub fn variables(expr: &Expr) -> BTreeSet<VarId> {
    fold(expr, |layer: ExprF<BTreeSet<VarId>>| match layer {
        ExprF::Leaf(Leaf::Var(id)) => BTreeSet::from([id]),
        ExprF::Leaf(_) => BTreeSet::new(),
        ExprF::Unary(_, vars) => vars,
        ExprF::Binary(_, mut l, mut r) => {
            if l.len() < r.len() {
                std::mem::swap(&mut l, &mut r);
            }
            l.extend(r);
            l
        }
    })
}

/// Number of nodes, counting a shared subtree once per occurrence.
pub fn node_count(expr: &Expr) -> usize {
    fold(expr, |layer: ExprF<usize>| match layer {
        ExprF::Leaf(_) => 1,
        ExprF::Unary(_, n) => n + 1,
        ExprF::Binary(_, l, r) => l + r + 1,
    })
}

/// Length of the longest root-to-leaf path; a lone leaf has depth 1.
pub fn depth(expr: &Expr) -> usize {
    fold(expr, |layer: ExprF<usize>| match layer {
        ExprF::Leaf(_) => 1,
        ExprF::Unary(_, d) => d + 1,
        ExprF::Binary(_, l, r) => l.max(r) + 1,
    })
}

/// Fully parenthesised infix rendering.
pub fn render(expr: &Expr) -> String {
    expr.to_string()
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Const(c) => write!(f, "{c}"),
            Leaf::Zero => f.write_str("0"),
            Leaf::One => f.write_str("1"),
            Leaf::Var(id) => write!(f, "x{id}"),
        }
    }
}

#[derive(Clone, Copy)]
enum Style {
    Infix,
    Debug,
}

enum Piece<'a> {
    Node(&'a Expr),
    Text(&'static str),
}

impl Style {
    /// Writes the part of `layer` that precedes its first child and
    /// schedules the rest.
    fn open<'a>(
        self,
        f: &mut fmt::Formatter<'_>,
        layer: &'a ExprF<Expr>,
        pending: &mut Vec<Piece<'a>>,
    ) -> fmt::Result {
        match (self, layer) {
            (Style::Infix, ExprF::Leaf(leaf)) => fmt::Display::fmt(leaf, f),
            (Style::Infix, ExprF::Unary(op, a)) => {
                pending.extend([Piece::Text(")"), Piece::Node(a)]);
                write!(f, "{}(", op.name())
            }
            (Style::Infix, ExprF::Binary(op, l, r)) => {
                pending.extend([
                    Piece::Text(")"),
                    Piece::Node(r),
                    Piece::Text(op.infix()),
                    Piece::Node(l),
                ]);
                f.write_str("(")
            }
            (Style::Debug, ExprF::Leaf(leaf)) => write!(f, "Leaf({leaf:?})"),
            (Style::Debug, ExprF::Unary(op, a)) => {
                pending.extend([Piece::Text(")"), Piece::Node(a)]);
                write!(f, "Unary({op:?}, ")
            }
            (Style::Debug, ExprF::Binary(op, l, r)) => {
                pending.extend([
                    Piece::Text(")"),
                    Piece::Node(r),
                    Piece::Text(", "),
                    Piece::Node(l),
                ]);
                write!(f, "Binary({op:?}, ")
            }
        }
    }

    /// Writes a whole tree in pre-order; what is still to be written
    /// waits on a heap stack.
    fn write(self, f: &mut fmt::Formatter<'_>, root: &ExprF<Expr>) -> fmt::Result {
        let mut pending = Vec::new();
        self.open(f, root, &mut pending)?;
        while let Some(piece) = pending.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(node) => self.open(f, node.as_out(), &mut pending)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for ExprF<Expr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Style::Infix.write(f, self)
    }
}

impl fmt::Debug for ExprF<Expr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Style::Debug.write(f, self)
    }
}

/// Compares the layers' own data and returns their child pairs.
fn same_head<'a>(a: &'a ExprF<Expr>, b: &'a ExprF<Expr>) -> Option<Vec<(&'a Expr, &'a Expr)>> {
    match (a, b) {
        (ExprF::Leaf(x), ExprF::Leaf(y)) if x == y => Some(Vec::new()),
        (ExprF::Unary(f, x), ExprF::Unary(g, y)) if f == g => Some(vec![(x, y)]),
        (ExprF::Binary(f, xl, xr), ExprF::Binary(g, yl, yr)) if f == g => {
            Some(vec![(xl, yl), (xr, yr)])
        }
        _ => None,
    }
}

// Structural equality on an explicit stack of pending pairs; subtrees
// shared by both sides are skipped.
impl PartialEq for ExprF<Expr> {
    fn eq(&self, other: &Self) -> bool {
        let Some(mut pending) = same_head(self, other) else {
            return false;
        };
        while let Some((a, b)) = pending.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            match same_head(a.as_out(), b.as_out()) {
                Some(children) => pending.extend(children),
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_build_expected_layers() {
        assert!(matches!(zero().as_out(), ExprF::Leaf(Leaf::Zero)));
        assert!(matches!(one().as_out(), ExprF::Leaf(Leaf::One)));
        assert!(matches!(variable(4).as_out(), ExprF::Leaf(Leaf::Var(4))));
        assert!(matches!(
            ln(one()).as_out(),
            ExprF::Unary(UnaryOp::Ln, _)
        ));
        assert!(matches!(
            div(one(), zero()).as_out(),
            ExprF::Binary(BinaryOp::Div, _, _)
        ));
    }

    #[test]
    fn negate_is_zero_minus() {
        assert_eq!(negate(variable(0)), sub(zero(), variable(0)));
    }

    #[test]
    fn power_shares_its_base() {
        let base = exp(variable(1));
        let cube = power(3, base.clone());
        match cube.as_out() {
            ExprF::Binary(BinaryOp::Mul, _, r) => assert!(r.ptr_eq(&base)),
            _ => panic!("expected a product"),
        }
        assert_eq!(power(0, base.clone()), one());
        assert!(power(1, base.clone()).ptr_eq(&base));
    }

    #[test]
    fn variables_are_collected_once() {
        let e = add(mul(variable(2), variable(0)), sin(variable(2)));
        assert_eq!(variables(&e), BTreeSet::from([0, 2]));
        assert!(variables(&constant(1.0)).is_empty());
    }

    #[test]
    fn node_count_and_depth() {
        let e = add(mul(variable(0), variable(1)), sin(variable(0)));
        assert_eq!(node_count(&e), 6);
        assert_eq!(depth(&e), 3);
        assert_eq!(depth(&one()), 1);
    }

    #[test]
    fn render_is_fully_parenthesised() {
        let e = div(one(), add(one(), exp(negate(variable(0)))));
        assert_eq!(render(&e), "(1 / (1 + exp((0 - x0))))");
        assert_eq!(e.to_string(), render(&e));
        assert_eq!(constant(2.5).to_string(), "2.5");
    }

    #[test]
    fn structural_equality() {
        let a = mul(variable(0), cos(variable(1)));
        let b = mul(variable(0), cos(variable(1)));
        assert_eq!(a, b);
        assert_ne!(a, mul(variable(0), sin(variable(1))));
        assert_ne!(constant(1.0), one());
    }

    #[test]
    fn debug_shows_structure() {
        let e = sin(variable(0));
        assert_eq!(format!("{e:?}"), "Unary(Sin, Leaf(Var(0)))");
    }

    #[test]
    fn partials_match_rules() {
        assert_eq!(BinaryOp::Mul.partials(2.0, 5.0), (5.0, 2.0));
        assert_eq!(BinaryOp::Div.partials(3.0, 2.0), (0.5, -0.75));
        assert_eq!(BinaryOp::Sub.partials(1.0, 1.0), (1.0, -1.0));
        assert_eq!(UnaryOp::Ln.derivative(4.0), 0.25);
        assert_eq!(UnaryOp::Cos.derivative(0.0), -0.0);
    }

    #[test]
    fn deep_chain_is_stack_safe() {
        let mut e = variable(0);
        for _ in 0..100_000 {
            e = add(e, one());
        }
        assert_eq!(depth(&e), 100_001);
        assert_eq!(variables(&e), BTreeSet::from([0]));
        drop(e);
    }

    #[test]
    fn deep_equality_and_debug_are_stack_safe() {
        let chain = |leaf: Expr| {
            let mut e = variable(0);
            for _ in 0..200_000 {
                e = add(e, leaf.clone());
            }
            e
        };
        let a = chain(one());
        let b = chain(one());
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, chain(zero()));

        let debug = format!("{a:?}");
        assert!(debug.starts_with("Binary(Add, Binary(Add, "));
        assert!(debug.ends_with("Leaf(One)), Leaf(One))"));
        assert!(a.to_string().ends_with(" + 1) + 1)"));
    }

    #[test]
    fn debug_of_binary_layer() {
        let e = mul(constant(2.0), variable(1));
        assert_eq!(format!("{e:?}"), "Binary(Mul, Leaf(Const(2.0)), Leaf(Var(1)))");
    }
}
