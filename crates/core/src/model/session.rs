use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{
    Course, CourseId, OptionKey, OptionPolicy, QuestionId, QuestionPool, SessionId, UserId,
};
use crate::scoring::{ScoreReport, score_answers};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStateError {
    #[error("no questions available for this course")]
    EmptyPool,

    #[error("session already completed")]
    Completed,

    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error("option {key} is not a choice for question {question}")]
    UnknownOption { question: QuestionId, key: OptionKey },
}

/// How a session reached completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The learner submitted.
    Manual,
    /// The countdown ran out.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Completed(Submission),
}

/// One learner's attempt at a sampled set of questions.
///
/// `Active` is the only mutable phase; `Completed` is terminal.
#[derive(Debug, Clone)]
pub struct ExamSession {
    id: SessionId,
    user_id: UserId,
    course_id: CourseId,
    course_name: String,
    questions: QuestionPool,
    answers: HashMap<QuestionId, OptionKey>,
    phase: SessionPhase,
    report: Option<ScoreReport>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Open an active session over an already sampled question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::EmptyPool` if `questions` is empty.
    pub fn new(
        id: SessionId,
        user_id: UserId,
        course: &Course,
        questions: QuestionPool,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::EmptyPool);
        }

        Ok(Self {
            id,
            user_id,
            course_id: course.id(),
            course_name: course.display_name(),
            questions,
            answers: HashMap::new(),
            phase: SessionPhase::Active,
            report: None,
            started_at,
            ended_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionPool {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, OptionKey> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: QuestionId) -> Option<&OptionKey> {
        self.answers.get(&question)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.phase, SessionPhase::Completed(_))
    }

    #[must_use]
    pub fn submission(&self) -> Option<Submission> {
        match self.phase {
            SessionPhase::Active => None,
            SessionPhase::Completed(kind) => Some(kind),
        }
    }

    /// Unrounded percentage; `None` until completed.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.report.as_ref().map(ScoreReport::percentage)
    }

    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn time_taken(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Record (or overwrite) the selected option for a question.
    ///
    /// Returns the previously selected option, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` once the session is finished,
    /// `UnknownQuestion` for ids outside the sampled set and, under
    /// `OptionPolicy::Strict`, `UnknownOption` for keys the question does not offer.
    pub fn select_answer(
        &mut self,
        question: QuestionId,
        key: OptionKey,
        policy: OptionPolicy,
    ) -> Result<Option<OptionKey>, SessionStateError> {
        if self.is_completed() {
            return Err(SessionStateError::Completed);
        }
        let Some(found) = self.questions.get(question) else {
            return Err(SessionStateError::UnknownQuestion(question));
        };
        if policy == OptionPolicy::Strict && !found.has_option(&key) {
            return Err(SessionStateError::UnknownOption { question, key });
        }

        Ok(self.answers.insert(question, key))
    }

    /// Transition `Active -> Completed`, grading every sampled question.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` if the session was already submitted;
    /// the stored score is left untouched in that case.
    pub fn complete(
        &mut self,
        ended_at: DateTime<Utc>,
        submission: Submission,
    ) -> Result<&ScoreReport, SessionStateError> {
        if self.is_completed() {
            return Err(SessionStateError::Completed);
        }

        let report = score_answers(self.questions.questions(), &self.answers);
        self.phase = SessionPhase::Completed(submission);
        self.ended_at = Some(ended_at);
        Ok(self.report.insert(report))
    }
}
