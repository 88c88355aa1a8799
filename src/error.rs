use thiserror::Error;

use crate::optimizer::Requirement;

/// Errors raised by the optimization engine.
///
/// Numerical degeneracies (zero gradients, duplicate points, non-convex fits)
/// are handled where they occur and never show up here. Everything in this
/// enum is a caller defect that should be fixed before running again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("convergence criterion `{criterion}` requires `{argument}` but it was not supplied")]
    MissingArgument {
        criterion: &'static str,
        argument: &'static str,
    },

    #[error("optimization method is missing required components: {0:?}")]
    MissingComponents(Vec<Requirement>),

    #[error("discrete design space exceeds the representable index range")]
    SpaceTooLarge,

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

/// Result type for optimization operations
pub type Result<T> = std::result::Result<T, Error>;
