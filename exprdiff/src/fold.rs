//! The fold engine shared by every pass over an [`Expr`].
//!
//! A pass supplies three handlers, one per node shape:
//!
//! - `nullary` for leaves,
//! - `unary` for one-child nodes,
//! - `binary` for two-child nodes.
//!
//! The engine picks the handler from the shape alone and calls it once
//! per node, children before parents and left before right. Everything
//! kind-specific (what `Mul` means, what `Var` reads) lives in the
//! handlers. Each child reaches its parent's handler as a [`Child`]:
//! the original subtree plus the result already folded from it, so a
//! pass such as symbolic differentiation can reuse the subtree itself.
//!
//! Traversal runs on [`algebra_core::fix::try_para`], which keeps its
//! pending work on the heap: a handler may be invoked on a tree of any
//! depth without the native stack growing with it.
//!
//! ```
//! use exprdiff::expr::{add, constant, mul, variable};
//! use exprdiff::fold::{fold_then, from_fns};
//!
//! // Count multiplications and report the count as a string.
//! let e = mul(add(variable(0), constant(2.0)), mul(variable(1), variable(1)));
//! let muls = fold_then(
//!     &e,
//!     from_fns(
//!         |_leaf| Ok(0),
//!         |_op, arg| Ok(arg.value),
//!         |op, lhs, rhs| Ok(lhs.value + rhs.value + (op == exprdiff::expr::BinaryOp::Mul) as u32),
//!     ),
//!     |n| format!("{n} multiplications"),
//! )
//! .unwrap();
//! assert_eq!(muls, "2 multiplications");
//! ```

use algebra_core::fix::try_para;

use crate::error::Result;
use crate::expr::{BinaryOp, Expr, ExprF, Leaf, UnaryOp};

/// A child node as seen by its parent's handler.
#[derive(Debug, Clone, Copy)]
pub struct Child<'a, R> {
    /// The child's subtree, untouched.
    pub expr: &'a Expr,
    /// What the fold produced for that subtree.
    pub value: R,
}

/// The three per-shape handlers of a fold.
pub trait Handlers {
    /// Result type produced at every node.
    type Output;

    /// Handles `Const`, `Zero`, `One` and `Var`.
    fn nullary(&mut self, leaf: Leaf) -> Result<Self::Output>;

    /// Handles `Sin`, `Cos`, `Ln` and `Exp`.
    fn unary(&mut self, op: UnaryOp, arg: Child<'_, Self::Output>) -> Result<Self::Output>;

    /// Handles `Add`, `Sub`, `Mul` and `Div`.
    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: Child<'_, Self::Output>,
        rhs: Child<'_, Self::Output>,
    ) -> Result<Self::Output>;
}

/// Folds `expr` with `handlers`.
///
/// # Errors
///
/// The first error returned by a handler, which also stops the fold.
pub fn fold<H: Handlers>(expr: &Expr, handlers: H) -> Result<H::Output> {
    fold_then(expr, handlers, |answer| answer)
}

/// Folds `expr` with `handlers`, then passes the root's result to the
/// continuation `k`.
pub fn fold_then<H, K, T>(expr: &Expr, mut handlers: H, k: K) -> Result<T>
where
    H: Handlers,
    K: FnOnce(H::Output) -> T,
{
    let answer = try_para(expr, |layer: ExprF<(&Expr, H::Output)>| match layer {
        ExprF::Leaf(leaf) => handlers.nullary(leaf),
        ExprF::Unary(op, (expr, value)) => handlers.unary(op, Child { expr, value }),
        ExprF::Binary(op, (l, lv), (r, rv)) => handlers.binary(
            op,
            Child { expr: l, value: lv },
            Child { expr: r, value: rv },
        ),
    })?;
    Ok(k(answer))
}

/// [`Handlers`] assembled from three closures; see [`from_fns`].
pub struct FnHandlers<N, U, B> {
    nullary: N,
    unary: U,
    binary: B,
}

/// Packages three closures as [`Handlers`].
pub fn from_fns<R, N, U, B>(nullary: N, unary: U, binary: B) -> FnHandlers<N, U, B>
where
    N: FnMut(Leaf) -> Result<R>,
    U: FnMut(UnaryOp, Child<'_, R>) -> Result<R>,
    B: FnMut(BinaryOp, Child<'_, R>, Child<'_, R>) -> Result<R>,
{
    FnHandlers {
        nullary,
        unary,
        binary,
    }
}

impl<R, N, U, B> Handlers for FnHandlers<N, U, B>
where
    N: FnMut(Leaf) -> Result<R>,
    U: FnMut(UnaryOp, Child<'_, R>) -> Result<R>,
    B: FnMut(BinaryOp, Child<'_, R>, Child<'_, R>) -> Result<R>,
{
    type Output = R;

    fn nullary(&mut self, leaf: Leaf) -> Result<R> {
        (self.nullary)(leaf)
    }

    fn unary(&mut self, op: UnaryOp, arg: Child<'_, R>) -> Result<R> {
        (self.unary)(op, arg)
    }

    fn binary(&mut self, op: BinaryOp, lhs: Child<'_, R>, rhs: Child<'_, R>) -> Result<R> {
        (self.binary)(op, lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::error::ExprError;
    use crate::expr::{add, cos, div, one, sin, variable, zero};

    /// Records the order in which handlers fire.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Handlers for &mut Trace {
        type Output = ();

        fn nullary(&mut self, leaf: Leaf) -> Result<()> {
            self.0.push(leaf.to_string());
            Ok(())
        }

        fn unary(&mut self, op: UnaryOp, _arg: Child<'_, ()>) -> Result<()> {
            self.0.push(format!("{op:?}"));
            Ok(())
        }

        fn binary(&mut self, op: BinaryOp, _lhs: Child<'_, ()>, _rhs: Child<'_, ()>) -> Result<()> {
            self.0.push(format!("{op:?}"));
            Ok(())
        }
    }

    #[test]
    fn handlers_fire_bottom_up_left_to_right() {
        let e = div(add(variable(0), one()), sin(zero()));
        let mut trace = Trace::default();
        fold(&e, &mut trace).unwrap();
        assert_eq!(trace.0, vec!["x0", "1", "Add", "0", "Sin", "Div"]);
    }

    #[test]
    fn children_carry_their_subtrees() {
        let inner = cos(variable(3));
        let e = add(inner.clone(), one());
        let rendered = fold(
            &e,
            from_fns(
                |_leaf| Ok(String::new()),
                |_op, arg| Ok(arg.expr.to_string()),
                |_op, lhs, rhs| Ok(format!("{}|{}", lhs.expr, rhs.expr)),
            ),
        )
        .unwrap();
        assert_eq!(rendered, format!("{inner}|1"));
    }

    #[test]
    fn continuation_receives_root_result() {
        let e = add(one(), one());
        let doubled = fold_then(
            &e,
            from_fns(
                |_leaf| Ok(1usize),
                |_op, arg| Ok(arg.value + 1),
                |_op, lhs, rhs| Ok(lhs.value + rhs.value + 1),
            ),
            |count| count * 2,
        );
        assert_eq!(doubled, Ok(6));
    }

    #[test]
    fn handler_error_stops_the_fold() {
        let env = Environment::from([(0, 1.0)]);
        let e = add(variable(0), add(variable(9), variable(0)));
        let mut leaves_seen = 0;
        let result = fold(
            &e,
            from_fns(
                |leaf| {
                    leaves_seen += 1;
                    leaf.value(&env)
                },
                |op, arg| Ok(op.apply(arg.value)),
                |op, lhs, rhs| Ok(op.apply(lhs.value, rhs.value)),
            ),
        );
        assert_eq!(result, Err(ExprError::UnboundVariable(9)));
        assert_eq!(leaves_seen, 2);
    }

    #[test]
    fn deep_unary_chain_is_stack_safe() {
        let mut e = variable(0);
        for _ in 0..100_000 {
            e = sin(e);
        }
        let depth = fold(
            &e,
            from_fns(
                |_leaf| Ok(0u32),
                |_op, arg| Ok(arg.value + 1),
                |_op, lhs, rhs| Ok(lhs.value.max(rhs.value) + 1),
            ),
        );
        assert_eq!(depth, Ok(100_000));
    }
}
