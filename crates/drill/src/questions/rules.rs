//! Per-operation rules that turn random operands into valid questions.
//!
//! Two constructors exist for every operation:
//! - `strict`: draws raw operands and applies the full policy (answer bounds,
//!   degenerate-pair rejection, difficulty floor). Division is built from a
//!   divisor and a quotient instead of rejection sampling.
//! - `simple`: narrows the second operand to the values that keep the result
//!   inside the answer bounds. Only correctness rules apply.

use drill_common::constants::SIMPLE_OPERAND_TRIES;
use drill_common::{
    DifficultyPolicy, DrillError, GenerationRequest, NumberRange, OperandConstraint, Operation,
    Question,
};
use rand::Rng;

use super::multiples::{Multiples, div_ceil, div_floor, gcd};
use super::verifier::{DivisionMode, apply};

/// Operand domains and policy for one request
#[derive(Debug, Clone)]
pub struct OperationRules {
    operand_a: OperandConstraint,
    operand_b: OperandConstraint,
    a: Multiples,
    b: Multiples,
    answer: NumberRange,
    policy: DifficultyPolicy,
}

impl OperationRules {
    pub fn new(request: &GenerationRequest) -> Self {
        Self {
            operand_a: request.operand_a,
            operand_b: request.operand_b,
            a: Multiples::of(&request.operand_a),
            b: Multiples::of(&request.operand_b),
            answer: request.answer_bounds,
            policy: request.policy,
        }
    }

    /// Reject operations the bounds make impossible, without sampling
    pub fn check_feasible(&self, operation: Operation) -> Result<(), DrillError> {
        let unsatisfiable = |reason: String| DrillError::UnsatisfiableConstraints { operation, reason };

        let (Some(a_min), Some(a_max)) = (self.a.min(), self.a.max()) else {
            return Err(unsatisfiable(format!(
                "operand A has no multiple of {} in {}",
                self.operand_a.multiple, self.operand_a.bounds
            )));
        };
        let (Some(b_min), Some(b_max)) = (self.b.min(), self.b.max()) else {
            return Err(unsatisfiable(format!(
                "operand B has no multiple of {} in {}",
                self.operand_b.multiple, self.operand_b.bounds
            )));
        };
        let answer = self.answer;

        match operation {
            Operation::Addition => {
                if a_min + b_min > answer.upper {
                    return Err(unsatisfiable(format!(
                        "smallest sum {} exceeds answer upper bound {}",
                        a_min + b_min,
                        answer.upper
                    )));
                }
                if a_max + b_max < answer.lower {
                    return Err(unsatisfiable(format!(
                        "largest sum {} is below answer lower bound {}",
                        a_max + b_max,
                        answer.lower
                    )));
                }
            }
            Operation::Subtraction => {
                // A swapped pair has its minuend admitted by A and its
                // subtrahend by B, so direct pairs cover every reachable case
                if a_max < b_min {
                    return Err(unsatisfiable(format!(
                        "every operand B value exceeds operand A maximum {}",
                        a_max
                    )));
                }
                let widest = a_max - b_min;
                let gap = (a_min - b_max).max(0);
                if widest < answer.lower {
                    return Err(unsatisfiable(format!(
                        "largest difference {} is below answer lower bound {}",
                        widest, answer.lower
                    )));
                }
                if gap > answer.upper {
                    return Err(unsatisfiable(format!(
                        "smallest difference {} exceeds answer upper bound {}",
                        gap, answer.upper
                    )));
                }
            }
            Operation::Multiplication => {
                if a_min * b_min > answer.upper {
                    return Err(unsatisfiable(format!(
                        "smallest product {} exceeds answer upper bound {}",
                        a_min * b_min,
                        answer.upper
                    )));
                }
                if a_max * b_max < answer.lower {
                    return Err(unsatisfiable(format!(
                        "largest product {} is below answer lower bound {}",
                        a_max * b_max,
                        answer.lower
                    )));
                }
            }
            Operation::Division => {
                let divisors = self.b.within(1, i64::MAX);
                let (Some(d_min), Some(d_max)) = (divisors.min(), divisors.max()) else {
                    return Err(unsatisfiable("operand B admits no non-zero divisor".to_string()));
                };
                let largest_quotient = div_floor(a_max, d_min);
                let smallest_quotient = div_ceil(a_min, d_max);
                if largest_quotient < answer.lower || smallest_quotient > answer.upper {
                    return Err(unsatisfiable(format!(
                        "quotients {}..={} miss answer bounds {}",
                        smallest_quotient, largest_quotient, answer
                    )));
                }
            }
        }

        Ok(())
    }

    /// Candidate under the full policy, `None` if the draw was rejected
    pub fn strict<R: Rng + ?Sized>(&self, operation: Operation, rng: &mut R) -> Option<Question> {
        let degenerate = self.policy.reject_degenerate;

        match operation {
            Operation::Addition => {
                let a = self.a.sample(rng)?;
                let b = self.b.sample(rng)?;
                if degenerate && (a == 0 || b == 0 || a == b) {
                    return None;
                }
                if !self.meets_floor(a.min(b), self.scale(operation)) {
                    return None;
                }
                self.finish(operation, a, b)
            }
            Operation::Subtraction => {
                let mut a = self.a.sample(rng)?;
                let mut b = self.b.sample(rng)?;
                if a < b {
                    // Swapped values must still satisfy their new sides
                    if !(self.operand_a.admits(b) && self.operand_b.admits(a)) {
                        return None;
                    }
                    std::mem::swap(&mut a, &mut b);
                }
                if degenerate && (b == 0 || a == b) {
                    return None;
                }
                if !self.meets_floor(b, self.scale(operation)) {
                    return None;
                }
                self.finish(operation, a, b)
            }
            Operation::Multiplication => {
                let a = self.a.sample(rng)?;
                // Products are sparse in the answer range, so narrow the second factor
                let b = if a > 0 {
                    self.b
                        .within(div_ceil(self.answer.lower, a), div_floor(self.answer.upper, a))
                        .sample(rng)?
                } else {
                    self.b.sample(rng)?
                };
                if degenerate && (a <= 1 || b <= 1 || a == b) {
                    return None;
                }
                if !self.meets_floor(a.min(b), self.scale(operation)) {
                    return None;
                }
                self.finish(operation, a, b)
            }
            Operation::Division => {
                // b = 1 and q = 1 (a == b) are trivial
                let smallest = if degenerate { 2 } else { 1 };
                let b = self.b.within(smallest, i64::MAX).sample(rng)?;
                let q = self
                    .quotients(b)
                    .within(if degenerate { 2 } else { i64::MIN }, i64::MAX)
                    .sample(rng)?;
                if !self.meets_floor(b.min(q), self.scale(operation)) {
                    return None;
                }
                self.finish(operation, q * b, b)
            }
        }
    }

    /// Candidate under correctness rules only
    pub fn simple<R: Rng + ?Sized>(&self, operation: Operation, rng: &mut R) -> Option<Question> {
        let answer = self.answer;

        for _ in 0..SIMPLE_OPERAND_TRIES {
            let candidate = match operation {
                Operation::Addition => self.a.sample(rng).and_then(|a| {
                    let b = self
                        .b
                        .within(answer.lower.saturating_sub(a), answer.upper.saturating_sub(a))
                        .sample(rng)?;
                    Some((a, b))
                }),
                Operation::Subtraction => self.a.sample(rng).and_then(|a| {
                    // b <= a - max(lower, 0) keeps the minuend first
                    let b = self
                        .b
                        .within(
                            a.saturating_sub(answer.upper),
                            a.saturating_sub(answer.lower.max(0)),
                        )
                        .sample(rng)?;
                    Some((a, b))
                }),
                Operation::Multiplication => self.a.sample(rng).and_then(|a| {
                    let b = if a == 0 {
                        if !answer.contains(0) {
                            return None;
                        }
                        self.b.sample(rng)?
                    } else {
                        self.b
                            .within(div_ceil(answer.lower, a), div_floor(answer.upper, a))
                            .sample(rng)?
                    };
                    Some((a, b))
                }),
                Operation::Division => self.b.within(1, i64::MAX).sample(rng).and_then(|b| {
                    let q = self.quotients(b).sample(rng)?;
                    Some((q * b, b))
                }),
            };

            if let Some((a, b)) = candidate {
                return self.finish(operation, a, b);
            }
        }

        None
    }

    /// Quotients `q` for divisor `b` such that `q * b` satisfies operand A
    /// and `q` lies within the answer bounds
    fn quotients(&self, b: i64) -> Multiples {
        let step = self.operand_a.multiple / gcd(self.operand_a.multiple, b);
        let bounds = self.operand_a.bounds;
        Multiples::new(
            self.answer.lower.max(div_ceil(bounds.lower, b)),
            self.answer.upper.min(div_floor(bounds.upper, b)),
            step,
        )
    }

    /// Magnitude the smaller operand is measured against.
    ///
    /// Additive operations use the largest reachable result, multiplicative
    /// ones its square root.
    fn scale(&self, operation: Operation) -> f64 {
        let a_max = self.a.max().unwrap_or(0);
        let b_max = self.b.max().unwrap_or(0);
        let upper = self.answer.upper;
        match operation {
            Operation::Addition => upper.min(a_max + b_max) as f64,
            Operation::Subtraction => upper.min(a_max.max(b_max)) as f64,
            Operation::Multiplication => (upper.min(a_max * b_max).max(0) as f64).sqrt(),
            Operation::Division => (a_max as f64).sqrt(),
        }
    }

    fn meets_floor(&self, smaller: i64, scale: f64) -> bool {
        let floor = self.policy.difficulty_floor;
        if floor <= 0.0 || scale <= 0.0 {
            return true;
        }
        smaller as f64 / scale >= floor
    }

    /// Compute the answer and enforce the answer bounds
    fn finish(&self, operation: Operation, a: i64, b: i64) -> Option<Question> {
        let correct_answer = apply(operation, a, b, DivisionMode::Exact)?;
        self.answer.contains(correct_answer).then_some(Question {
            operand_a: a,
            operand_b: b,
            operation,
            correct_answer,
        })
    }
}
