//! Error types for evaluation and differentiation.

use algebra_core::fix::ShapeMismatch;
use thiserror::Error;

use crate::env::VarId;

/// Errors raised by the passes over an expression.
///
/// Floating-point domain problems (`ln` of a non-positive number,
/// division by zero) are not errors: they surface as IEEE NaN or
/// infinity in the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// The expression reads a variable the environment does not bind.
    #[error("unbound variable: x{0}")]
    UnboundVariable(VarId),

    /// The fold engine paired a node with the wrong number of child
    /// results. Indicates a bug in the engine, never bad input.
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),
}

/// Result alias used throughout the crate.
pub type Result<T, E = ExprError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_variable_display() {
        assert_eq!(ExprError::UnboundVariable(3).to_string(), "unbound variable: x3");
    }

    #[test]
    fn shape_mismatch_converts() {
        let err: ExprError = ShapeMismatch {
            arity: 2,
            available: 0,
        }
        .into();
        assert!(matches!(err, ExprError::ShapeMismatch(_)));
        assert!(err.to_string().starts_with("shape mismatch"));
    }
}
