//!
//! Fixed-point types and stack-safe recursion schemes.
//!
//! This module provides the building blocks for recursion schemes in Rust:
//!
//! - [`TypeApp`]: Higher-kinded type encoding
//! - [`Functor`]: Functor on one type parameter
//! - [`Fix`]: Least fixed point (μF), with shared (`Arc`) layers
//! - [`fold`]: Catamorphism / F-algebra eliminator
//! - [`para`] / [`try_para`]: Paramorphism, where the algebra also sees
//!   the original subtrees
//!
//! None of the eliminators recurse on the native call stack. They run
//! an explicit work stack, so a structure nested a million layers deep
//! folds (and drops) as comfortably as a balanced one.
//!
//! # Example: arithmetic
//!
//! ```rust
//! use algebra_core::fix::{fold, Fix, Functor, TypeApp};
//!
//! // Base functor: ArithF<X> = Lit(f64) | Neg(X) | Add(X, X)
//! enum ArithF<X> {
//!     Lit(f64),
//!     Neg(X),
//!     Add(X, X),
//! }
//!
//! struct ArithTag;
//!
//! impl TypeApp for ArithTag {
//!     type Applied<X> = ArithF<X>;
//! }
//!
//! impl Functor for ArithTag {
//!     fn fmap<X, Y, G>(fx: ArithF<X>, mut g: G) -> ArithF<Y>
//!     where
//!         G: FnMut(X) -> Y,
//!     {
//!         match fx {
//!             ArithF::Lit(v) => ArithF::Lit(v),
//!             ArithF::Neg(x) => ArithF::Neg(g(x)),
//!             ArithF::Add(l, r) => {
//!                 let l = g(l);
//!                 ArithF::Add(l, g(r))
//!             }
//!         }
//!     }
//!
//!     fn borrow<'a, X: 'a>(fx: &'a ArithF<X>) -> ArithF<&'a X> {
//!         match fx {
//!             ArithF::Lit(v) => ArithF::Lit(*v),
//!             ArithF::Neg(x) => ArithF::Neg(x),
//!             ArithF::Add(l, r) => ArithF::Add(l, r),
//!         }
//!     }
//! }
//!
//! type Arith = Fix<ArithTag>;
//!
//! fn lit(v: f64) -> Arith {
//!     Fix::new(ArithF::Lit(v))
//! }
//!
//! fn neg(x: Arith) -> Arith {
//!     Fix::new(ArithF::Neg(x))
//! }
//!
//! fn add(l: Arith, r: Arith) -> Arith {
//!     Fix::new(ArithF::Add(l, r))
//! }
//!
//! // -(1 + 2) + 4
//! let e = add(neg(add(lit(1.0), lit(2.0))), lit(4.0));
//!
//! let value: f64 = fold(&e, |layer: ArithF<f64>| match layer {
//!     ArithF::Lit(v) => v,
//!     ArithF::Neg(x) => -x,
//!     ArithF::Add(l, r) => l + r,
//! });
//! assert_eq!(value, 1.0);
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A **type constructor** encoding via associated types.
///
/// Rust lacks higher-kinded types, so we encode `F : Type → Type` as:
/// - A marker type `F` (the "tag")
/// - An associated type `Applied<X>` representing `F(X)`
pub trait TypeApp {
    /// The result of applying this type constructor to `X`.
    type Applied<X>;
}

/// A **functor** for type constructors.
///
/// Laws (not enforced by type system):
///
/// - **Identity**: `fmap id = id`
/// - **Composition**: `fmap g ∘ fmap f = fmap (g ∘ f)`
/// - **Determinism**: `fmap` visits the holes of a layer in the same
///   order, the same number of times, on every call
///
/// The stack-safe eliminators below take a layer apart with one `fmap`
/// and put it back together with another, so they rely on the last law.
pub trait Functor: TypeApp {
    /// Map a function over the holes (type parameter positions).
    fn fmap<X, Y, G>(fx: Self::Applied<X>, g: G) -> Self::Applied<Y>
    where
        G: FnMut(X) -> Y;

    /// View the holes of a borrowed layer by reference.
    ///
    /// Non-hole payload (literals, tags) is copied into the new layer.
    fn borrow<'a, X: 'a>(fx: &'a Self::Applied<X>) -> Self::Applied<&'a X>;
}

/// The **least fixed point** (μF) of a functor F.
///
/// `Fix<F>` satisfies the isomorphism:
///
/// ```text
/// Fix<F> ≅ F(Fix<F>)
/// ```
///
/// witnessed by [`Fix::new`] (`F(Fix F) → Fix F`) and [`Fix::as_out`]
/// (`Fix F → F(Fix F)`, by reference).
///
/// Layers live behind an [`Arc`], so a subtree can be shared by many
/// parents (and many threads) without copying. A value built once is
/// never mutated; "changing" a structure means building a new one that
/// points at the old subtrees.
///
/// # `Send` / `Sync`
///
/// `Fix<F>` is `Send` and `Sync` iff `F::Applied<Fix<F>>` is both.
///
/// # Dropping
///
/// The last owner of a deep structure releases it iteratively, so
/// dropping a long chain does not recurse once per layer.
pub struct Fix<F: Functor>(Option<Arc<F::Applied<Fix<F>>>>);

impl<F: Functor> Fix<F> {
    /// Construct a `Fix` from one layer of the functor.
    ///
    /// This is the "in" morphism: `F(Fix F) → Fix F`
    #[inline]
    pub fn new(node: F::Applied<Fix<F>>) -> Self {
        Fix(Some(Arc::new(node)))
    }

    /// Borrow one layer of the functor.
    ///
    /// This is the "out" morphism: `Fix F → F(Fix F)`
    #[inline]
    pub fn as_out(&self) -> &F::Applied<Fix<F>> {
        match &self.0 {
            Some(node) => node,
            None => unreachable!("Fix is only emptied while it is being dropped"),
        }
    }

    /// `true` when both values share the same top layer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<F: Functor> Clone for Fix<F> {
    fn clone(&self) -> Self {
        Fix(self.0.clone())
    }
}

impl<F: Functor> Drop for Fix<F> {
    fn drop(&mut self) {
        let mut pending: Vec<Arc<F::Applied<Fix<F>>>> = self.0.take().into_iter().collect();
        while let Some(shared) = pending.pop() {
            // Only the last owner takes the layer apart; children are
            // moved onto `pending` before the layer itself is released.
            if let Some(layer) = Arc::into_inner(shared) {
                F::fmap::<Fix<F>, (), _>(layer, |mut child| pending.extend(child.0.take()));
            }
        }
    }
}

impl<F> fmt::Debug for Fix<F>
where
    F: Functor,
    F::Applied<Fix<F>>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_out(), f)
    }
}

impl<F> fmt::Display for Fix<F>
where
    F: Functor,
    F::Applied<Fix<F>>: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_out(), f)
    }
}

/// Equal when both sides share their top layer or the layers compare
/// equal. How deep the comparison recurses is up to the layer's own
/// `PartialEq`.
impl<F> PartialEq for Fix<F>
where
    F: Functor,
    F::Applied<Fix<F>>: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.as_out() == other.as_out()
    }
}

/// A layer asked for more child results than the fold had produced.
///
/// Only a functor that breaks the determinism law can trigger this;
/// for a lawful functor it is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("shape mismatch: layer expects {arity} child result(s) but {available} are available")]
pub struct ShapeMismatch {
    /// Number of holes the layer exposed.
    pub arity: usize,
    /// Number of child results that were on hand.
    pub available: usize,
}

enum Frame<'a, F: Functor> {
    Expand(&'a Fix<F>),
    Collapse(F::Applied<&'a Fix<F>>, usize),
}

/// A fallible **paramorphism**: fold bottom-up, letting the algebra see
/// each child both as the original subtree and as its folded result.
///
/// The algebra runs exactly once per layer, children before parents,
/// holes in `fmap` order. The first `Err` it returns stops the fold.
///
/// # Stack Safety
///
/// The traversal keeps two heap stacks (layers still to visit, results
/// waiting for their parent), so native stack use is constant in the
/// depth of the structure.
///
/// # Example
///
/// ```rust
/// use algebra_core::fix::{try_para, Fix, Functor, ShapeMismatch, TypeApp};
///
/// enum NatF<X> {
///     Zero,
///     Succ(X),
/// }
///
/// struct NatTag;
///
/// impl TypeApp for NatTag {
///     type Applied<X> = NatF<X>;
/// }
///
/// impl Functor for NatTag {
///     fn fmap<X, Y, G: FnMut(X) -> Y>(fx: NatF<X>, mut g: G) -> NatF<Y> {
///         match fx {
///             NatF::Zero => NatF::Zero,
///             NatF::Succ(x) => NatF::Succ(g(x)),
///         }
///     }
///
///     fn borrow<'a, X: 'a>(fx: &'a NatF<X>) -> NatF<&'a X> {
///         match fx {
///             NatF::Zero => NatF::Zero,
///             NatF::Succ(x) => NatF::Succ(x),
///         }
///     }
/// }
///
/// #[derive(Debug, PartialEq)]
/// enum Overflow {
///     TooBig,
///     Shape(ShapeMismatch),
/// }
///
/// impl From<ShapeMismatch> for Overflow {
///     fn from(err: ShapeMismatch) -> Self {
///         Overflow::Shape(err)
///     }
/// }
///
/// let mut n: Fix<NatTag> = Fix::new(NatF::Zero);
/// for _ in 0..300 {
///     n = Fix::new(NatF::Succ(n));
/// }
///
/// let as_u8 = try_para(&n, |layer| match layer {
///     NatF::Zero => Ok(0u8),
///     NatF::Succ((_, k)) => k.checked_add(1).ok_or(Overflow::TooBig),
/// });
/// assert_eq!(as_u8, Err(Overflow::TooBig));
/// ```
pub fn try_para<'a, F, A, E, Alg>(root: &'a Fix<F>, mut alg: Alg) -> Result<A, E>
where
    F: Functor,
    E: From<ShapeMismatch>,
    Alg: FnMut(F::Applied<(&'a Fix<F>, A)>) -> Result<A, E>,
{
    let mut frames = vec![Frame::Expand(root)];
    let mut results: Vec<A> = Vec::new();

    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Expand(node) => {
                let mut children = Vec::new();
                let layer = F::fmap::<&'a Fix<F>, &'a Fix<F>, _>(F::borrow(node.as_out()), |child| {
                    children.push(child);
                    child
                });
                frames.push(Frame::Collapse(layer, children.len()));
                // Reversed, so the leftmost child is folded first and
                // its result lands deepest on the result stack.
                frames.extend(children.into_iter().rev().map(Frame::Expand));
            }
            Frame::Collapse(layer, arity) => {
                let available = results.len();
                let base = available
                    .checked_sub(arity)
                    .ok_or(ShapeMismatch { arity, available })?;
                let mut args = results.split_off(base).into_iter();
                let layer = F::fmap::<&'a Fix<F>, (&'a Fix<F>, A), _>(layer, |child| {
                    match args.next() {
                        Some(value) => (child, value),
                        None => unreachable!("fmap visited more holes than it exposed"),
                    }
                });
                let leftover = args.len();
                if leftover > 0 {
                    return Err(ShapeMismatch {
                        arity,
                        available: arity - leftover,
                    }
                    .into());
                }
                results.push(alg(layer)?);
            }
        }
    }

    let available = results.len();
    match results.pop() {
        Some(answer) if available == 1 => Ok(answer),
        _ => Err(ShapeMismatch {
            arity: 1,
            available,
        }
        .into()),
    }
}

/// An infallible **paramorphism** (see [`try_para`]).
///
/// # Panics
///
/// Panics if `F`'s functor instance is not deterministic.
pub fn para<'a, F, A>(root: &'a Fix<F>, mut alg: impl FnMut(F::Applied<(&'a Fix<F>, A)>) -> A) -> A
where
    F: Functor,
{
    let folded: Result<A, ShapeMismatch> = try_para(root, |layer| Ok(alg(layer)));
    match folded {
        Ok(answer) => answer,
        Err(err) => panic!("lawless functor: {err}"),
    }
}

/// A **catamorphism**: fold a recursive structure using an F-algebra.
///
/// Given an algebra `alg : F(A) → A`, this produces a function
/// `Fix<F> → A` that applies the algebra from the leaves up. Shared
/// subtrees are folded once per reference.
///
/// # Panics
///
/// Panics if `F`'s functor instance is not deterministic.
pub fn fold<F, A>(root: &Fix<F>, mut alg: impl FnMut(F::Applied<A>) -> A) -> A
where
    F: Functor,
{
    para(root, |layer| alg(F::fmap::<(&Fix<F>, A), A, _>(layer, |(_, value)| value)))
}
