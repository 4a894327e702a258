//! Async façade over the generator and verifier.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use drill_common::{
    AnswerCheck, AnswerSubmission, DrillError, GenerationRequest, Question, QuestionBatch,
    SubmittedAnswer,
};

use crate::questions::{AnswerVerifier, QuestionGenerator};
use crate::session;

/// Shared question services
#[derive(Clone)]
pub struct DrillService {
    /// Question generator
    pub generator: Arc<QuestionGenerator>,

    /// Answer verifier
    pub verifier: Arc<AnswerVerifier>,

    /// Extra time granted past the request budget before the race is lost
    pub timeout_grace: Duration,
}

impl DrillService {
    pub fn new(generator: QuestionGenerator, verifier: AnswerVerifier, timeout_grace: Duration) -> Self {
        Self {
            generator: Arc::new(generator),
            verifier: Arc::new(verifier),
            timeout_grace,
        }
    }

    /// Run generation on the blocking pool, raced against the request budget
    pub async fn generate(&self, request: GenerationRequest) -> Result<QuestionBatch, DrillError> {
        let budget = self.generator.time_budget(&request);
        let requested = request.question_count;
        let cancel = Arc::new(AtomicBool::new(false));

        let generator = self.generator.clone();
        let flag = cancel.clone();
        let task = tokio::task::spawn_blocking(move || generator.generate_cancellable(&request, &flag));

        match tokio::time::timeout(budget.saturating_add(self.timeout_grace), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(DrillError::Internal(format!("generation task failed: {e}"))),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                tracing::warn!(
                    requested,
                    budget_ms = budget.as_millis() as u64,
                    "Generation timer fired before the batch was ready"
                );
                Err(DrillError::GenerationTimeout {
                    produced: 0,
                    requested,
                })
            }
        }
    }

    /// Question `index` of a deterministic session
    pub async fn question_at(&self, request: GenerationRequest, index: usize) -> Result<Question, DrillError> {
        session::require_deterministic(&request)?;
        let batch = self.generate(request).await?;
        session::pick(&batch, index)
    }

    pub async fn check_answer(
        &self,
        request: GenerationRequest,
        index: usize,
        submitted: &SubmittedAnswer,
    ) -> Result<AnswerCheck, DrillError> {
        let question = self.question_at(request, index).await?;
        Ok(session::grade(&self.verifier, &question, submitted))
    }

    pub fn verify(&self, submission: &AnswerSubmission) -> Result<bool, DrillError> {
        self.verifier.verify_submission(submission)
    }
}
