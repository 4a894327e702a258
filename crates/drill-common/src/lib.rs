//! # Drill Common
//!
//! Shared types, errors, and constants used across MathDrill components.
//!
//! ## Modules
//! - `types` - Core data structures (Operation, OperandConstraint, Question, etc.)
//! - `error` - Common error type
//! - `constants` - Shared configuration constants

pub mod constants;
pub mod error;
pub mod types;

pub use error::DrillError;
pub use types::*;
