//! Variable bindings.
//!
//! An [`Environment`] maps variable ids to values. It never changes
//! once built: [`Environment::update`] returns a new environment and
//! leaves the receiver untouched, so one environment can be handed to
//! many evaluations (or threads) at once.
//!
//! Clones share one map and cost a reference count. Deriving a new
//! environment (`update`, `accumulate`, `combine`) copies the map, so
//! it is O(n); build large environments in one go with
//! [`FromIterator`] instead of a chain of updates.
//!
//! The same type carries gradients. Under [`Semigroup::combine`] two
//! environments merge by adding the values of shared ids, which makes
//! partial gradients from independent passes easy to put together.
//!
//! ```
//! use exprdiff::Environment;
//!
//! let base = Environment::empty().update(0, 2.0);
//! let extended = base.update(1, 3.0);
//!
//! assert_eq!(base.len(), 1);
//! assert_eq!(extended.lookup(1).unwrap(), 3.0);
//! assert!(base.lookup(1).is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use algebra_core::{CommutativeMonoid, Monoid, Semigroup};

use crate::error::{ExprError, Result};

/// Identifier of a variable in an expression.
pub type VarId = usize;

/// An immutable mapping from [`VarId`] to `f64`.
#[derive(Clone, Default, PartialEq)]
pub struct Environment {
    bindings: Arc<BTreeMap<VarId, f64>>,
}

impl Environment {
    /// The environment with no bindings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An environment binding exactly one variable.
    pub fn singleton(id: VarId, value: f64) -> Self {
        Self::empty().update(id, value)
    }

    /// Returns a copy of `self` with `id` bound to `value`, replacing
    /// any previous binding. Copies the map.
    pub fn update(&self, id: VarId, value: f64) -> Self {
        let mut bindings = (*self.bindings).clone();
        bindings.insert(id, value);
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// Returns a copy of `self` with `delta` added to the binding of
    /// `id` (an absent binding counts as `0.0`). Copies the map.
    pub fn accumulate(&self, id: VarId, delta: f64) -> Self {
        let mut bindings = (*self.bindings).clone();
        *bindings.entry(id).or_insert(0.0) += delta;
        Self {
            bindings: Arc::new(bindings),
        }
    }

    /// The value bound to `id`.
    ///
    /// # Errors
    ///
    /// [`ExprError::UnboundVariable`] if `id` has no binding.
    pub fn lookup(&self, id: VarId) -> Result<f64> {
        self.get(id).ok_or(ExprError::UnboundVariable(id))
    }

    /// The value bound to `id`, if any.
    pub fn get(&self, id: VarId) -> Option<f64> {
        self.bindings.get(&id).copied()
    }

    /// `true` if `id` is bound.
    pub fn contains(&self, id: VarId) -> bool {
        self.bindings.contains_key(&id)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.bindings.iter().map(|(&id, &value)| (id, value))
    }
}

impl FromIterator<(VarId, f64)> for Environment {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            bindings: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<const N: usize> From<[(VarId, f64); N]> for Environment {
    fn from(bindings: [(VarId, f64); N]) -> Self {
        bindings.into_iter().collect()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(id, value)| (format!("x{id}"), value)))
            .finish()
    }
}

/// Pointwise sum over the union of bound ids.
impl Semigroup for Environment {
    fn combine(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut bindings = (*self.bindings).clone();
        for (id, value) in other.iter() {
            *bindings.entry(id).or_insert(0.0) += value;
        }
        Self {
            bindings: Arc::new(bindings),
        }
    }
}

impl Monoid for Environment {
    fn empty() -> Self {
        Environment::empty()
    }
}

impl CommutativeMonoid for Environment {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_missing_is_unbound() {
        assert_eq!(
            Environment::empty().lookup(0),
            Err(ExprError::UnboundVariable(0))
        );
    }

    #[test]
    fn update_is_non_destructive() {
        let a = Environment::from([(0, 1.0)]);
        let b = a.update(0, 5.0).update(7, 2.0);

        assert_eq!(a.get(0), Some(1.0));
        assert!(!a.contains(7));
        assert_eq!(b.get(0), Some(5.0));
        assert_eq!(b.get(7), Some(2.0));
    }

    #[test]
    fn clones_share_and_updates_copy() {
        let a = Environment::from([(0, 1.0), (1, 2.0)]);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.bindings, &b.bindings));

        let c = a.update(1, 3.0);
        assert!(!Arc::ptr_eq(&a.bindings, &c.bindings));
        assert_eq!(a.get(1), Some(2.0));
        assert_eq!(b.get(1), Some(2.0));
    }

    #[test]
    fn accumulate_adds_to_existing_binding() {
        let env = Environment::singleton(2, 1.5).accumulate(2, 0.5).accumulate(3, -1.0);
        assert_eq!(env.get(2), Some(2.0));
        assert_eq!(env.get(3), Some(-1.0));
    }

    #[test]
    fn iteration_is_in_id_order() {
        let env: Environment = vec![(5, 0.5), (1, 0.1), (3, 0.3)].into_iter().collect();
        let ids: Vec<VarId> = env.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn combine_sums_shared_ids() {
        let a = Environment::from([(0, 1.0), (1, 2.0)]);
        let b = Environment::from([(1, 3.0), (2, 4.0)]);
        let merged = a.combine(&b);

        assert_eq!(merged, Environment::from([(0, 1.0), (1, 5.0), (2, 4.0)]));
        assert_eq!(merged, b.combine(&a));
    }

    #[test]
    fn empty_is_identity() {
        let a = Environment::from([(4, 0.25)]);
        assert_eq!(a.combine(&Monoid::empty()), a);
        assert_eq!(<Environment as Monoid>::empty().combine(&a), a);
    }

    #[test]
    fn concat_merges_singletons() {
        let grad = Environment::concat(vec![
            Environment::singleton(0, 1.0),
            Environment::singleton(1, 2.0),
            Environment::singleton(0, 3.0),
        ]);
        assert_eq!(grad, Environment::from([(0, 4.0), (1, 2.0)]));
    }

    #[test]
    fn debug_uses_variable_names() {
        let env = Environment::from([(0, 1.0)]);
        assert_eq!(format!("{env:?}"), "{\"x0\": 1.0}");
    }
}
