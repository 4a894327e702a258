//! Common error types for MathDrill components.

use thiserror::Error;

use crate::types::Operation;

/// Errors surfaced by question generation and answer verification
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrillError {
    /// Operation set is empty or a tag is not one of the four operations
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A constraint violates its own invariants (lower > upper, multiple 0, ...)
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    /// Bounds make an operation impossible to satisfy
    #[error("Unsatisfiable constraints for {operation}: {reason}")]
    UnsatisfiableConstraints {
        operation: Operation,
        reason: String,
    },

    /// Time or attempt budget ran out before the batch was complete
    #[error("Question generation timed out after {produced} of {requested} questions")]
    GenerationTimeout { produced: usize, requested: usize },

    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DrillError {
    /// Returns the HTTP status code a caller should map this error to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidOperation(_) => 400,
            Self::InvalidConstraint(_) => 400,
            Self::UnsatisfiableConstraints { .. } => 422,
            Self::GenerationTimeout { .. } => 504,
            Self::InvalidInput(_) => 400,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if the caller may retry (with relaxed parameters or a longer budget)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationTimeout { .. })
    }
}
