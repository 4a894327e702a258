//! # Drill - MathDrill question engine
//!
//! Builds batches of arithmetic practice questions under operand, answer
//! and difficulty constraints, and checks submitted answers.
//!
//! ## Architecture
//! ```text
//! GenerationRequest → QuestionGenerator → QuestionBatch
//!                          ↑ (blocking pool, raced against a timer)
//!                     DrillService ← caller (session / HTTP layer)
//! ```

pub mod questions;
pub mod service;
pub mod session;

pub use questions::{AnswerVerifier, DivisionMode, QuestionGenerator};
pub use service::DrillService;
pub use session::SessionPreset;
