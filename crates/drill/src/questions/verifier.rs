//! Answer verification.
//!
//! The canonical result of `(a, b, operation)` is computed by [`apply`],
//! which the generator also uses to fill in `correct_answer`.

use drill_common::{AnswerSubmission, DrillError, Operation, SubmittedAnswer};
use serde::{Deserialize, Serialize};

/// How division results are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivisionMode {
    /// Compare against the exact (possibly fractional) quotient
    #[default]
    Exact,
    /// Compare against the quotient truncated toward zero
    Truncating,
}

/// Canonical integer result, `None` on overflow, division by zero, or an
/// inexact quotient in exact mode
pub fn apply(operation: Operation, a: i64, b: i64, mode: DivisionMode) -> Option<i64> {
    match operation {
        Operation::Addition => a.checked_add(b),
        Operation::Subtraction => a.checked_sub(b),
        Operation::Multiplication => a.checked_mul(b),
        Operation::Division => match mode {
            DivisionMode::Exact if b != 0 && a.checked_rem(b) != Some(0) => None,
            _ => a.checked_div(b),
        },
    }
}

/// Answer verifier service
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerVerifier {
    pub division_mode: DivisionMode,
}

impl AnswerVerifier {
    pub fn new(division_mode: DivisionMode) -> Self {
        Self { division_mode }
    }

    pub fn expected_answer(&self, a: i64, b: i64, operation: Operation) -> Option<i64> {
        apply(operation, a, b, self.division_mode)
    }

    /// Compare a submission against the canonical result by numeric equality
    pub fn verify(&self, a: i64, b: i64, operation: Operation, submitted: &SubmittedAnswer) -> bool {
        if let Some(expected) = self.expected_answer(a, b, operation) {
            return submitted.as_integer() == Some(expected);
        }

        // Exact mode with a fractional quotient: value * b must equal a
        if operation == Operation::Division
            && self.division_mode == DivisionMode::Exact
            && b != 0
        {
            let Some(value) = submitted.as_number() else {
                return false;
            };
            let tolerance = 1e-9 * (a.unsigned_abs().max(1) as f64);
            return (value * b as f64 - a as f64).abs() <= tolerance;
        }

        false
    }

    /// Verify with the operation given as a tag (`"division"`, `"/"`, ...)
    pub fn verify_tagged(
        &self,
        a: i64,
        b: i64,
        operation: &str,
        submitted: &SubmittedAnswer,
    ) -> Result<bool, DrillError> {
        let operation: Operation = operation.parse()?;
        Ok(self.verify(a, b, operation, submitted))
    }

    pub fn verify_submission(&self, submission: &AnswerSubmission) -> Result<bool, DrillError> {
        let correct = self.verify_tagged(
            submission.operand_a,
            submission.operand_b,
            &submission.operation,
            &submission.submitted_answer,
        )?;

        tracing::debug!(
            operand_a = submission.operand_a,
            operand_b = submission.operand_b,
            operation = %submission.operation,
            correct,
            "Verified answer"
        );

        Ok(correct)
    }
}
