//! Arithmetic question generation and answer verification.
//!
//! - `generator` - batch loop with attempt ceilings and a deadline
//! - `rules` - per-operation strict and simple constructors
//! - `schedule` - even operation distribution
//! - `multiples` - sampling over "multiple of" domains
//! - `verifier` - canonical answers and submission checks

mod generator;
mod multiples;
mod rules;
mod schedule;
mod verifier;

pub use generator::QuestionGenerator;
pub use multiples::Multiples;
pub use rules::OperationRules;
pub use schedule::OperationSchedule;
pub use verifier::{AnswerVerifier, DivisionMode, apply};
