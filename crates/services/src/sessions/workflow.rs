use std::sync::Arc;

use exam_core::model::{CourseId, ExamSession, QuestionPool};
use storage::repository::{
    AttemptRecord, AttemptRepository, CourseRepository, QuestionRepository, Storage,
};

use super::manager::SessionManager;
use super::timer::TimedExam;
use crate::context::ExamContext;
use crate::error::SessionError;
use crate::notify::{Notice, Notifier};

/// Orchestrates exam start: course lookup, daily limit, sampling and attempt tracking.
#[derive(Clone)]
pub struct ExamService {
    manager: Arc<SessionManager>,
    courses: Arc<dyn CourseRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ExamService {
    #[must_use]
    pub fn new(
        manager: Arc<SessionManager>,
        courses: Arc<dyn CourseRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            manager,
            courses,
            questions,
            attempts,
            notifier,
        }
    }

    #[must_use]
    pub fn from_storage(
        manager: Arc<SessionManager>,
        storage: &Storage,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            manager,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.attempts),
            notifier,
        )
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    #[must_use]
    pub fn context(&self) -> &ExamContext {
        self.manager.context()
    }

    /// Exams the learner may still start today; `None` when unlimited.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if attempts cannot be counted.
    pub async fn remaining_attempts(&self) -> Result<Option<u32>, SessionError> {
        let context = self.context();
        if context.learner.is_subscribed() {
            return Ok(None);
        }
        let used = self
            .attempts
            .count_attempts_since(context.learner.id(), context.clock.start_of_day())
            .await?;
        Ok(Some(context.settings.free_daily_limit().saturating_sub(used)))
    }

    /// Start an untimed session for a course.
    ///
    /// # Errors
    ///
    /// `CourseNotFound`, `DailyLimitReached` for free learners over the limit,
    /// `EmptyPool` when the course has no questions, or `Storage`.
    pub async fn start_exam(&self, course_id: CourseId) -> Result<ExamSession, SessionError> {
        let result = self.open_session(course_id).await;
        self.reported(result)
    }

    /// Start a session and its countdown.
    ///
    /// # Errors
    ///
    /// See [`ExamService::start_exam`].
    pub async fn start_timed(&self, course_id: CourseId) -> Result<TimedExam, SessionError> {
        let session = self.start_exam(course_id).await?;
        Ok(TimedExam::spawn(
            Arc::clone(&self.manager),
            session,
            Arc::clone(&self.notifier),
        ))
    }

    async fn open_session(&self, course_id: CourseId) -> Result<ExamSession, SessionError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(SessionError::CourseNotFound(course_id))?;

        if let Some(0) = self.remaining_attempts().await? {
            let limit = self.context().settings.free_daily_limit();
            tracing::info!(learner = %self.context().learner.id(), limit, "daily exam limit reached");
            return Err(SessionError::DailyLimitReached { limit });
        }

        let pool = QuestionPool::new(self.questions.questions_for_course(course_id).await?)?;
        let session = self.manager.start_default(&course, &pool)?;

        self.attempts
            .record_attempt(&AttemptRecord {
                user_id: session.user_id(),
                course_id,
                started_at: session.started_at(),
            })
            .await?;

        Ok(session)
    }

    fn reported<T>(&self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(err) = &result {
            self.notifier.notify(Notice::for_error(err));
        }
        result
    }
}
