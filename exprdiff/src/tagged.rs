//! Expressions whose nodes carry a tag.
//!
//! A [`Tagged<T>`] mirrors an [`Expr`] node for node: each layer is the
//! same [`ExprF`] shape with a `T` attached. Reverse-mode
//! differentiation tags every node with its value on the way up, then
//! reads those values back on the way down.
//!
//! ```
//! use exprdiff::expr::{add, mul, variable};
//! use exprdiff::tagged::{annotate, strip, value_of};
//! use exprdiff::Environment;
//!
//! let e = add(variable(0), mul(variable(0), variable(1)));
//! let tagged = annotate(&Environment::from([(0, 2.0), (1, 3.0)]), &e).unwrap();
//!
//! assert_eq!(value_of(&tagged), 8.0);
//! assert_eq!(strip(&tagged), e);
//! ```

use std::fmt;
use std::marker::PhantomData;

use algebra_core::fix::{fold as fix_fold, Fix, Functor, TypeApp};
use tracing::debug;

use crate::env::Environment;
use crate::error::Result;
use crate::expr::{node_count, Expr, ExprF, ExprTag};
use crate::fold::{fold, from_fns};

/// One tagged layer.
#[derive(Clone)]
pub struct Ann<T, X> {
    /// The node's tag.
    pub tag: T,
    /// The node itself, children in the hole positions.
    pub node: ExprF<X>,
}

/// Type-level tag for [`Ann`] with tags of type `T`.
pub struct AnnTag<T>(PhantomData<fn() -> T>);

impl<T> TypeApp for AnnTag<T> {
    type Applied<X> = Ann<T, X>;
}

impl<T: Clone> Functor for AnnTag<T> {
    fn fmap<X, Y, G>(fx: Ann<T, X>, g: G) -> Ann<T, Y>
    where
        G: FnMut(X) -> Y,
    {
        Ann {
            tag: fx.tag,
            node: ExprTag::fmap(fx.node, g),
        }
    }

    fn borrow<'a, X: 'a>(fx: &'a Ann<T, X>) -> Ann<T, &'a X> {
        Ann {
            tag: fx.tag.clone(),
            node: ExprTag::borrow(&fx.node),
        }
    }
}

/// An expression tree with a `T` on every node.
pub type Tagged<T> = Fix<AnnTag<T>>;

enum Piece<'a, T: Clone> {
    Node(&'a Tagged<T>),
    Text(&'static str),
}

fn open<'a, T: Clone + fmt::Debug>(
    f: &mut fmt::Formatter<'_>,
    ann: &'a Ann<T, Tagged<T>>,
    pending: &mut Vec<Piece<'a, T>>,
) -> fmt::Result {
    write!(f, "Ann {{ tag: {:?}, ", ann.tag)?;
    match &ann.node {
        ExprF::Leaf(leaf) => write!(f, "leaf: {leaf:?} }}"),
        ExprF::Unary(op, a) => {
            pending.extend([Piece::Text(" }"), Piece::Node(a)]);
            write!(f, "op: {op:?}, arg: ")
        }
        ExprF::Binary(op, l, r) => {
            pending.extend([
                Piece::Text(" }"),
                Piece::Node(r),
                Piece::Text(", rhs: "),
                Piece::Node(l),
            ]);
            write!(f, "op: {op:?}, lhs: ")
        }
    }
}

// Written in pre-order off a heap stack, so deep trees are fine.
impl<T: Clone + fmt::Debug> fmt::Debug for Ann<T, Tagged<T>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = Vec::new();
        open(f, self, &mut pending)?;
        while let Some(piece) = pending.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(node) => open(f, node.as_out(), &mut pending)?,
            }
        }
        Ok(())
    }
}

/// The tag at the root of `tagged`.
pub fn tag_of<T: Clone>(tagged: &Tagged<T>) -> &T {
    &tagged.as_out().tag
}

/// The value recorded at the root of an annotated tree.
pub fn value_of(tagged: &Tagged<f64>) -> f64 {
    *tag_of(tagged)
}

/// Evaluates `expr` under `env`, keeping every intermediate value as
/// the tag of the corresponding node.
///
/// # Errors
///
/// [`ExprError::UnboundVariable`](crate::ExprError::UnboundVariable)
/// as for [`evaluate`](crate::evaluate).
pub fn annotate(env: &Environment, expr: &Expr) -> Result<Tagged<f64>> {
    debug!(nodes = node_count(expr), "annotate");
    fold(
        expr,
        from_fns(
            |leaf| Ok(tagged(leaf.value(env)?, ExprF::Leaf(leaf))),
            |op, arg| {
                let tag = op.apply(value_of(&arg.value));
                Ok(tagged(tag, ExprF::Unary(op, arg.value)))
            },
            |op, lhs, rhs| {
                let tag = op.apply(value_of(&lhs.value), value_of(&rhs.value));
                Ok(tagged(tag, ExprF::Binary(op, lhs.value, rhs.value)))
            },
        ),
    )
}

fn tagged(tag: f64, node: ExprF<Tagged<f64>>) -> Tagged<f64> {
    Fix::new(Ann { tag, node })
}

/// Forgets the tags, recovering an expression of the same shape.
pub fn strip<T: Clone>(tagged: &Tagged<T>) -> Expr {
    fix_fold(tagged, |ann: Ann<T, Expr>| Fix::new(ann.node))
}
