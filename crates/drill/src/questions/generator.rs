//! Question batch generation.
//!
//! Each slot gets an operation from the [`OperationSchedule`], then draws
//! candidates until one is valid and not already in the batch:
//! - attempts `0..max` use the strict constructor
//! - attempts `max..2*max` use the simple constructor
//! - after `2*max` a repeat seen along the way is accepted and flagged,
//!   otherwise the call fails with `GenerationTimeout`
//!
//! The deadline is checked on every attempt.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use drill_common::{DrillError, GenerationRequest, Question, QuestionBatch, SeedMode};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::rules::OperationRules;
use super::schedule::OperationSchedule;

/// Question generator service
#[derive(Debug, Clone)]
pub struct QuestionGenerator {
    /// Strict attempts per slot before the simple fallback
    pub max_attempts_per_question: u32,
    /// Budget for requests that do not carry their own
    pub default_time_budget: Duration,
}

impl QuestionGenerator {
    pub fn new(max_attempts_per_question: u32, default_time_budget: Duration) -> Self {
        Self {
            max_attempts_per_question: max_attempts_per_question.max(1),
            default_time_budget,
        }
    }

    /// Budget that applies to `request`
    pub fn time_budget(&self, request: &GenerationRequest) -> Duration {
        request.time_budget.unwrap_or(self.default_time_budget)
    }

    /// Generate a full batch, all-or-nothing
    pub fn generate(&self, request: &GenerationRequest) -> Result<QuestionBatch, DrillError> {
        self.generate_cancellable(request, &AtomicBool::new(false))
    }

    /// Like [`generate`](Self::generate), but also stops once `cancel` is set
    pub fn generate_cancellable(
        &self,
        request: &GenerationRequest,
        cancel: &AtomicBool,
    ) -> Result<QuestionBatch, DrillError> {
        request.validate()?;

        let requested = request.question_count;
        let operations = request.distinct_operations();
        let rules = OperationRules::new(request);
        for operation in &operations {
            rules.check_feasible(*operation)?;
        }

        let budget = self.time_budget(request);
        let deadline = Instant::now().checked_add(budget);
        let seed = resolve_seed(request.seed_mode);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut schedule = OperationSchedule::new(operations)?;

        tracing::debug!(
            requested,
            seed_mode = ?request.seed_mode,
            seed,
            budget_ms = budget.as_millis() as u64,
            "Generating question batch"
        );

        let strict_limit = self.max_attempts_per_question;
        let total_limit = strict_limit.saturating_mul(2);

        let mut seen = HashSet::with_capacity(requested);
        let mut questions: Vec<Question> = Vec::with_capacity(requested);
        let mut fallback_slots = Vec::new();
        let mut repeated_slots = Vec::new();

        for slot in 0..requested {
            let operation = schedule.next(&mut rng);
            let mut attempts = 0u32;
            let mut repeat = None;

            let question = loop {
                let expired = deadline.is_some_and(|d| Instant::now() >= d);
                if expired || cancel.load(Ordering::Relaxed) {
                    tracing::warn!(
                        produced = questions.len(),
                        requested,
                        cancelled = !expired,
                        "Question generation ran out of time"
                    );
                    return Err(DrillError::GenerationTimeout {
                        produced: questions.len(),
                        requested,
                    });
                }

                if attempts >= total_limit {
                    match repeat {
                        Some(question) => {
                            tracing::warn!(slot, %operation, "Accepting repeated question");
                            repeated_slots.push(slot);
                            break question;
                        }
                        None => {
                            tracing::warn!(
                                slot,
                                %operation,
                                attempts,
                                "Attempt budget exhausted without a valid question"
                            );
                            return Err(DrillError::GenerationTimeout {
                                produced: questions.len(),
                                requested,
                            });
                        }
                    }
                }

                let candidate = if attempts < strict_limit {
                    rules.strict(operation, &mut rng)
                } else {
                    rules.simple(operation, &mut rng)
                };
                attempts += 1;

                match candidate {
                    Some(question) if seen.insert(question.key()) => {
                        if attempts > strict_limit {
                            tracing::debug!(slot, %operation, "Slot filled by simple question");
                            fallback_slots.push(slot);
                        }
                        break question;
                    }
                    Some(question) => repeat = Some(question),
                    None => {}
                }
            };

            questions.push(question);
        }

        tracing::debug!(
            produced = questions.len(),
            fallbacks = fallback_slots.len(),
            repeats = repeated_slots.len(),
            "Question batch ready"
        );

        Ok(QuestionBatch {
            questions,
            seed_mode: request.seed_mode,
            seed,
            fallback_slots,
            repeated_slots,
            generated_at: chrono::Utc::now().timestamp(),
        })
    }
}

/// Seed for the request's random stream
fn resolve_seed(mode: SeedMode) -> u64 {
    match mode {
        SeedMode::Deterministic { seed } => seed,
        SeedMode::Entropy => chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| chrono::Utc::now().timestamp_micros()) as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_common::constants::{DEFAULT_MAX_ATTEMPTS_PER_QUESTION, DEFAULT_TIME_BUDGET_MS};
    use drill_common::{DifficultyPolicy, NumberRange, OperandConstraint, Operation};
    use std::collections::HashMap;

    fn generator() -> QuestionGenerator {
        QuestionGenerator::new(
            DEFAULT_MAX_ATTEMPTS_PER_QUESTION,
            Duration::from_millis(DEFAULT_TIME_BUDGET_MS),
        )
    }

    fn range(lower: i64, upper: i64) -> NumberRange {
        NumberRange::new(lower, upper).unwrap()
    }

    fn assert_valid(batch: &QuestionBatch, answer: NumberRange) {
        for q in &batch.questions {
            let expected = match q.operation {
                Operation::Addition => q.operand_a + q.operand_b,
                Operation::Subtraction => q.operand_a - q.operand_b,
                Operation::Multiplication => q.operand_a * q.operand_b,
                Operation::Division => {
                    assert_eq!(q.operand_a % q.operand_b, 0, "{q}");
                    q.operand_a / q.operand_b
                }
            };
            assert_eq!(q.correct_answer, expected, "{q}");
            assert!(answer.contains(q.correct_answer), "{q} = {}", q.correct_answer);
        }
    }

    #[test]
    fn test_small_addition_batch() {
        let request = GenerationRequest::new(5, range(1, 10), vec![Operation::Addition]);
        let batch = generator().generate(&request).unwrap();

        assert_eq!(batch.len(), 5);
        assert_valid(&batch, range(1, 10));
        let keys: HashSet<_> = batch.questions.iter().map(Question::key).collect();
        assert_eq!(keys.len(), 5);
        for q in &batch.questions {
            assert!(q.operand_a + q.operand_b <= 10);
        }
    }

    #[test]
    fn test_required_multiple_on_operand_a() {
        let request = GenerationRequest::new(4, range(1, 100), vec![Operation::Multiplication])
            .with_operands(
                OperandConstraint::new(range(1, 20), 5).unwrap(),
                OperandConstraint::new(range(1, 20), 1).unwrap(),
            );
        let batch = generator().generate(&request).unwrap();

        assert_eq!(batch.len(), 4);
        assert_valid(&batch, range(1, 100));
        for q in &batch.questions {
            assert!([5, 10, 15, 20].contains(&q.operand_a), "{q}");
        }
    }

    #[test]
    fn test_operations_evenly_distributed() {
        let request = GenerationRequest::new(14, range(1, 50), Operation::ALL.to_vec())
            .with_seed_mode(SeedMode::Deterministic { seed: 99 });
        let batch = generator().generate(&request).unwrap();

        assert_valid(&batch, range(1, 50));
        let mut counts: HashMap<Operation, usize> = HashMap::new();
        for q in &batch.questions {
            *counts.entry(q.operation).or_default() += 1;
        }
        // 14 over 4 operations: floor 3, ceil 4
        for op in Operation::ALL {
            let count = counts.get(&op).copied().unwrap_or(0);
            assert!(count == 3 || count == 4, "{op}: {count}");
        }
    }

    #[test]
    fn test_no_duplicates_in_larger_batch() {
        let request = GenerationRequest::new(40, range(1, 100), Operation::ALL.to_vec());
        let batch = generator().generate(&request).unwrap();

        assert_eq!(batch.len(), 40);
        assert!(!batch.has_repeats());
        let keys: HashSet<_> = batch.questions.iter().map(Question::key).collect();
        assert_eq!(keys.len(), 40);
    }

    #[test]
    fn test_deterministic_mode_reproduces_batch() {
        let request = GenerationRequest::new(12, range(1, 20), Operation::ALL.to_vec())
            .with_seed_mode(SeedMode::from_session_id("session-7c1e"));
        let first = generator().generate(&request).unwrap();
        let second = generator().generate(&request).unwrap();

        assert_eq!(first.questions, second.questions);
        assert_eq!(first.seed, second.seed);
        assert_eq!(first.seed_mode, request.seed_mode);
    }

    #[test]
    fn test_empty_operations_rejected() {
        let request = GenerationRequest::new(5, range(1, 10), vec![]);
        assert!(matches!(
            generator().generate(&request),
            Err(DrillError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_contradictory_bounds_fail_fast() {
        let request = GenerationRequest::new(5, range(1, 1), vec![Operation::Multiplication])
            .with_operands(
                OperandConstraint::range(5, 10).unwrap(),
                OperandConstraint::range(5, 10).unwrap(),
            )
            .with_time_budget(Duration::from_millis(200));

        let started = Instant::now();
        let result = generator().generate(&request);
        assert!(matches!(
            result,
            Err(DrillError::UnsatisfiableConstraints { .. })
        ));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn test_subtrahends_above_minuends_fail_fast() {
        let request = GenerationRequest::new(3, range(0, 100), vec![Operation::Subtraction])
            .with_operands(
                OperandConstraint::range(1, 5).unwrap(),
                OperandConstraint::range(10, 20).unwrap(),
            );
        assert!(matches!(
            generator().generate(&request),
            Err(DrillError::UnsatisfiableConstraints {
                operation: Operation::Subtraction,
                ..
            })
        ));
    }

    #[test]
    fn test_sampling_dead_end_times_out() {
        // Sums are 20, 30, 40: the range check passes but none lands in 25..=29
        let tens = OperandConstraint::new(range(10, 20), 10).unwrap();
        let request = GenerationRequest::new(3, range(25, 29), vec![Operation::Addition])
            .with_operands(tens, tens)
            .with_time_budget(Duration::from_millis(500));

        assert!(matches!(
            generator().generate(&request),
            Err(DrillError::GenerationTimeout {
                produced: 0,
                requested: 3
            })
        ));
    }

    #[test]
    fn test_zero_budget_times_out() {
        let request = GenerationRequest::new(5, range(1, 10), vec![Operation::Addition])
            .with_time_budget(Duration::ZERO);
        assert!(matches!(
            generator().generate(&request),
            Err(DrillError::GenerationTimeout { produced: 0, .. })
        ));
    }

    #[test]
    fn test_cancel_flag_stops_generation() {
        let request = GenerationRequest::new(5, range(1, 10), vec![Operation::Addition]);
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            generator().generate_cancellable(&request, &cancel),
            Err(DrillError::GenerationTimeout { .. })
        ));
    }

    #[test]
    fn test_exhausted_domain_flags_repeats() {
        // Only 1+1, 1+2, 2+1 and 2+2 exist
        let request = GenerationRequest::new(6, range(1, 4), vec![Operation::Addition])
            .with_operands(
                OperandConstraint::range(1, 2).unwrap(),
                OperandConstraint::range(1, 2).unwrap(),
            )
            .with_policy(DifficultyPolicy::relaxed());
        let batch = QuestionGenerator::new(200, Duration::from_secs(2))
            .generate(&request)
            .unwrap();

        assert_eq!(batch.len(), 6);
        assert_valid(&batch, range(1, 4));
        assert_eq!(batch.repeated_slots.len(), 2);
        assert!(batch.has_repeats());
    }

    #[test]
    fn test_strict_ceiling_falls_back_to_simple() {
        // Strict policy cannot be met: every operand pair is degenerate
        let ones = OperandConstraint::range(1, 1).unwrap();
        let request = GenerationRequest::new(1, range(1, 10), vec![Operation::Multiplication])
            .with_operands(ones, OperandConstraint::range(1, 5).unwrap());
        let batch = generator().generate(&request).unwrap();

        assert_eq!(batch.fallback_slots, vec![0]);
        assert_eq!(batch.questions[0].operand_a, 1);
    }
}
