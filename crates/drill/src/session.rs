//! Session presets and answer checks against re-derived questions.
//!
//! A session with a deterministic seed never needs its questions stored:
//! the batch is regenerated from the same request and indexed.

use drill_common::{
    AnswerCheck, DifficultyLevel, DrillError, GenerationRequest, NumberRange, Operation, Question,
    QuestionBatch, SeedMode, SubmittedAnswer,
};
use serde::{Deserialize, Serialize};

use crate::questions::{AnswerVerifier, QuestionGenerator};

/// Settings a practice session is created with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPreset {
    pub session_id: String,
    pub difficulty: DifficultyLevel,
    pub question_count: usize,
    /// Shared range for both operands and the answer
    pub range: NumberRange,
    pub operations: Vec<Operation>,
}

impl SessionPreset {
    /// Overall time the learner gets for the whole session
    pub fn time_limit_secs(&self) -> u64 {
        self.difficulty.time_limit_secs()
    }

    /// Deterministic request seeded from the session id
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest::new(self.question_count, self.range, self.operations.clone())
            .with_policy(self.difficulty.policy())
            .with_seed_mode(SeedMode::from_session_id(&self.session_id))
    }
}

/// Re-derivation only makes sense for a reproducible stream
pub fn require_deterministic(request: &GenerationRequest) -> Result<(), DrillError> {
    if !request.seed_mode.is_deterministic() {
        return Err(DrillError::InvalidInput(
            "questions can only be re-derived from a deterministic seed".to_string(),
        ));
    }
    Ok(())
}

/// Question at `index` of a batch
pub fn pick(batch: &QuestionBatch, index: usize) -> Result<Question, DrillError> {
    batch.questions.get(index).copied().ok_or_else(|| {
        DrillError::InvalidInput(format!(
            "question index {} out of range for a batch of {}",
            index,
            batch.len()
        ))
    })
}

pub fn grade(verifier: &AnswerVerifier, question: &Question, submitted: &SubmittedAnswer) -> AnswerCheck {
    AnswerCheck {
        is_correct: verifier.verify(
            question.operand_a,
            question.operand_b,
            question.operation,
            submitted,
        ),
        correct_answer: question.correct_answer,
    }
}

/// Regenerate the session's batch and return question `index`
pub fn nth_question(
    generator: &QuestionGenerator,
    request: &GenerationRequest,
    index: usize,
) -> Result<Question, DrillError> {
    require_deterministic(request)?;
    let batch = generator.generate(request)?;
    pick(&batch, index)
}

/// Check a submitted answer for question `index` of a deterministic session
pub fn check_answer(
    generator: &QuestionGenerator,
    verifier: &AnswerVerifier,
    request: &GenerationRequest,
    index: usize,
    submitted: &SubmittedAnswer,
) -> Result<AnswerCheck, DrillError> {
    let question = nth_question(generator, request, index)?;
    Ok(grade(verifier, &question, submitted))
}
