#![deny(missing_docs)]
//! # algebra-core: recursion schemes and accumulation algebras
//!
//! **Part of the [exprdiff workspace](../index.html)**
//!
//! This crate holds the two abstractions the expression engine is
//! built on:
//!
//! - [`fix`]: fixed points of functors and **stack-safe** folds over
//!   them ([`fix::fold`], [`fix::para`], [`fix::try_para`])
//! - [`Semigroup`], [`Monoid`], [`CommutativeMonoid`]: the algebra of
//!   merging partial results, used to combine per-variable gradients
//!
//! ## Quick start
//!
//! ```rust
//! use algebra_core::{CommutativeMonoid, Monoid, Semigroup};
//!
//! // Partial sums of adjoints form a commutative monoid
//! #[derive(Clone, Copy, Debug, PartialEq)]
//! struct Adjoint(f64);
//!
//! impl Semigroup for Adjoint {
//!     fn combine(&self, other: &Self) -> Self {
//!         Adjoint(self.0 + other.0)
//!     }
//! }
//!
//! impl Monoid for Adjoint {
//!     fn empty() -> Self {
//!         Adjoint(0.0)
//!     }
//! }
//!
//! impl CommutativeMonoid for Adjoint {}
//!
//! let total = Adjoint::concat([Adjoint(1.0), Adjoint(0.5), Adjoint(2.5)]);
//! assert_eq!(total, Adjoint(4.0));
//! ```

pub mod fix;

/// A **semigroup**: a type with an associative binary operation.
///
/// Laws (not enforced by type system):
///
/// - **Associative**:
///   `a.combine(b).combine(c) == a.combine(b.combine(c))`
///
/// # Example
///
/// ```rust
/// use algebra_core::Semigroup;
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// struct Largest(f64);
///
/// impl Semigroup for Largest {
///     fn combine(&self, other: &Self) -> Self {
///         Largest(self.0.max(other.0))
///     }
/// }
///
/// let mut acc = Largest(1.0);
/// acc.combine_assign(&Largest(3.0));
/// assert_eq!(acc, Largest(3.0));
/// ```
pub trait Semigroup: Sized {
    /// Combine two elements associatively.
    fn combine(&self, other: &Self) -> Self;

    /// In-place combine.
    fn combine_assign(&mut self, other: &Self) {
        *self = self.combine(other);
    }
}

/// A **monoid**: a semigroup with an identity element.
///
/// Laws (not enforced by type system):
///
/// - **Associative**:
///   `a.combine(b).combine(c) == a.combine(b.combine(c))`
/// - **Left identity**: `empty().combine(a) == a`
/// - **Right identity**: `a.combine(empty()) == a`
///
/// The identity is what makes a monoid safe to reduce in parallel:
/// every worker can start from [`Monoid::empty`].
pub trait Monoid: Semigroup {
    /// The identity element.
    fn empty() -> Self;

    /// Fold an iterator using combine, starting from empty.
    fn concat<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        iter.into_iter()
            .fold(Self::empty(), |acc, x| acc.combine(&x))
    }
}

/// A **commutative monoid**: a monoid where combine is commutative.
///
/// Laws (not enforced by type system):
///
/// - **Associative**:
///   `a.combine(b).combine(c) == a.combine(b.combine(c))`
/// - **Commutative**: `a.combine(b) == b.combine(a)`
/// - **Identity**: `a.combine(empty()) == a == empty().combine(a)`
///
/// Commutativity means the order in which partial results arrive does
/// not matter.
pub trait CommutativeMonoid: Monoid {
    // Marker trait - laws are documented above
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Sum(f64);

    impl Semigroup for Sum {
        fn combine(&self, other: &Self) -> Self {
            Sum(self.0 + other.0)
        }
    }

    impl Monoid for Sum {
        fn empty() -> Self {
            Sum(0.0)
        }
    }

    impl CommutativeMonoid for Sum {}

    #[test]
    fn concat_of_nothing_is_empty() {
        assert_eq!(Sum::concat(Vec::new()), Sum::empty());
    }

    #[test]
    fn concat_combines_left_to_right() {
        let total = Sum::concat(vec![Sum(1.0), Sum(2.0), Sum(4.0)]);
        assert_eq!(total, Sum(7.0));
    }

    #[test]
    fn combine_assign_matches_combine() {
        let mut a = Sum(1.5);
        let b = Sum(2.5);
        let expected = a.combine(&b);
        a.combine_assign(&b);
        assert_eq!(a, expected);
    }
}
