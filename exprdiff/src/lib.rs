//! Differentiation of arithmetic expression trees.
//!
//! **Part of the [exprdiff workspace](../index.html)**
//!
//! Formulas are immutable trees ([`Expr`]) over variables, literals,
//! `+ - * /` and `sin`, `cos`, `ln`, `exp`. On the same tree this crate
//! computes:
//!
//! - **Evaluation**: [`evaluate`] under an [`Environment`]
//! - **Symbolic differentiation**: [`differentiate`] builds the
//!   derivative as a new expression
//! - **Forward-mode AD**: [`forward_diff`] folds the tree over dual
//!   numbers ([`Dual`]), one traversal per variable
//! - **Reverse-mode AD**: [`backward_all_diff`] annotates the tree with
//!   values and backpropagates, one pass for the whole gradient
//!
//! Every pass is a set of three handlers run by the same fold engine
//! ([`fold`](mod@fold)), which dispatches on node shape and keeps its
//! work on the heap. Trees of any depth can be traversed and dropped.
//!
//! # Example
//!
//! ```
//! use exprdiff::expr::{add, div, exp, mul, one, sin, variable};
//! use exprdiff::{backward_all_diff, differentiate, evaluate, forward_diff, Environment};
//!
//! // f(x, y) = 1 / (1 + exp(x·y + sin x))
//! let (x, y) = (variable(0), variable(1));
//! let f = div(one(), add(one(), exp(add(mul(x.clone(), y), sin(x)))));
//! let env = Environment::from([(0, 1.0), (1, 1.0)]);
//!
//! let symbolic = evaluate(&env, &differentiate(0, &f).unwrap()).unwrap();
//! let forward = forward_diff(&env, 0, &f).unwrap();
//! let reverse = backward_all_diff(&env, &f).unwrap();
//!
//! assert!((symbolic - -0.181974).abs() < 1e-5);
//! assert!((forward - symbolic).abs() < 1e-12);
//! assert!((reverse.get(0).unwrap() - symbolic).abs() < 1e-12);
//! assert!((reverse.get(1).unwrap() - -0.118142).abs() < 1e-5);
//! ```
//!
//! # Gradients
//!
//! All three modes can produce a full gradient as an [`Environment`]
//! binding exactly the variables that occur in the expression:
//! [`symbolic_gradient`], [`forward_gradient`] and
//! [`backward_all_diff`]. Environments form a commutative monoid under
//! pointwise addition ([`algebra_core::Monoid`]), which is how partial
//! results are merged.
//!
//! # Features
//!
//! - `parallel` (default): [`forward_gradient`] runs its per-variable
//!   traversals on the rayon thread pool.

pub mod env;
pub mod error;
pub mod eval;
pub mod expr;
pub mod fold;
pub mod forward;
pub mod reverse;
pub mod symbolic;
pub mod tagged;

pub use env::{Environment, VarId};
pub use error::{ExprError, Result};
pub use eval::evaluate;
pub use expr::Expr;
pub use forward::{forward_diff, forward_gradient, forward_value_and_diff, Dual};
pub use reverse::{backprop, backward_all_diff, backward_value_and_gradient};
pub use symbolic::{differentiate, symbolic_gradient};
pub use tagged::{annotate, Tagged};
