use exam_core::model::{
    Course, ExamSession, OptionKey, QuestionId, QuestionPool, SessionId, SettingsError,
    Submission,
};
use exam_core::scoring::ScoreReport;

use super::plan::QuestionSampler;
use crate::context::ExamContext;
use crate::error::SessionError;

/// Owns the session lifecycle: sampling, answer selection and submission.
#[derive(Debug)]
pub struct SessionManager {
    context: ExamContext,
    sampler: QuestionSampler,
}

impl SessionManager {
    #[must_use]
    pub fn new(context: ExamContext, sampler: QuestionSampler) -> Self {
        Self { context, sampler }
    }

    #[must_use]
    pub fn context(&self) -> &ExamContext {
        &self.context
    }

    /// Open an active session over `min(sample_size, pool.len())` random questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` when the pool has no questions and
    /// `SessionError::InvalidSettings` when `sample_size` is zero.
    pub fn start(
        &self,
        course: &Course,
        pool: &QuestionPool,
        sample_size: usize,
    ) -> Result<ExamSession, SessionError> {
        if pool.is_empty() {
            tracing::warn!(course = %course.code(), "no questions to sample");
            return Err(SessionError::EmptyPool);
        }
        if sample_size == 0 {
            return Err(SettingsError::ZeroSampleSize.into());
        }

        let plan = self.sampler.sample(pool, sample_size);
        if plan.is_short() {
            tracing::debug!(
                course = %course.code(),
                requested = plan.requested,
                available = plan.pool_size,
                "pool smaller than sample size"
            );
        }

        let sampled = QuestionPool::new(plan.questions)?;
        let session = ExamSession::new(
            SessionId::random(),
            self.context.learner.id(),
            course,
            sampled,
            self.context.clock.now(),
        )?;

        tracing::info!(
            session = %session.id(),
            learner = %session.user_id(),
            course = %course.code(),
            questions = session.questions().len(),
            "exam session started"
        );
        Ok(session)
    }

    /// Start with the configured sample size.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::start`].
    pub fn start_default(
        &self,
        course: &Course,
        pool: &QuestionPool,
    ) -> Result<ExamSession, SessionError> {
        let size = usize::try_from(self.context.settings.sample_size()).unwrap_or(usize::MAX);
        self.start(course, pool, size)
    }

    /// Set or overwrite the answer for one question.
    ///
    /// # Errors
    ///
    /// `InvalidState` once completed, `UnknownQuestion` for ids outside the
    /// sample, and `UnknownOption` under the strict option policy.
    pub fn select_answer(
        &self,
        session: &mut ExamSession,
        question: QuestionId,
        key: OptionKey,
    ) -> Result<(), SessionError> {
        let policy = self.context.settings.option_policy();
        match session.select_answer(question, key.clone(), policy) {
            Ok(previous) => {
                tracing::debug!(
                    session = %session.id(),
                    %question,
                    selected = %key,
                    replaced = previous.is_some(),
                    "answer selected"
                );
                Ok(())
            }
            Err(err) => {
                let err = SessionError::from(err);
                if matches!(err, SessionError::UnknownQuestion(_)) {
                    tracing::error!(session = %session.id(), %question, "answer for question outside the sample");
                }
                Err(err)
            }
        }
    }

    /// Complete the session and grade it. Unanswered questions count as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session was already submitted;
    /// the first score is kept.
    pub fn submit<'s>(
        &self,
        session: &'s mut ExamSession,
        forced: bool,
    ) -> Result<&'s ScoreReport, SessionError> {
        let submission = if forced {
            Submission::Forced
        } else {
            Submission::Manual
        };
        let id = session.id();
        let answered = session.answered_count();
        let report = session.complete(self.context.clock.now(), submission)?;

        tracing::info!(
            session = %id,
            forced,
            answered,
            correct = report.correct_count(),
            total = report.total(),
            percentage = report.percentage(),
            "exam submitted"
        );
        Ok(report)
    }
}
