use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{Course, CourseId, Question, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One started exam, kept only to enforce the free-plan daily limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub started_at: DateTime<Utc>,
}

/// Read access to the course catalogue.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or update a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another course already uses the code.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Fetch a course by its code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_course_by_code(&self, code: &str) -> Result<Option<Course>, StorageError>;

    /// All courses ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;
}

/// Question bank. The exam engine only reads from it.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question's course is unknown.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Every question of a course, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_course(&self, course_id: CourseId)
    -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append a started exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError>;

    /// Number of exams the user started at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_attempts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u32, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<BTreeMap<CourseId, Course>>>,
    questions: Arc<Mutex<HashMap<CourseId, BTreeMap<u64, Question>>>>,
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        let code_taken = guard
            .values()
            .any(|existing| existing.code() == course.code() && existing.id() != course.id());
        if code_taken {
            return Err(StorageError::Conflict);
        }
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_course_by_code(&self, code: &str) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let wanted = code.trim();
        Ok(guard
            .values()
            .find(|course| course.code().eq_ignore_ascii_case(wanted))
            .cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(courses)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let course_known = self
            .courses
            .lock()
            .map_err(poisoned)?
            .contains_key(&question.course_id());
        if !course_known {
            return Err(StorageError::NotFound);
        }

        let mut guard = self.questions.lock().map_err(poisoned)?;
        for bank in guard.values_mut() {
            bank.remove(&question.id().value());
        }
        guard
            .entry(question.course_id())
            .or_default()
            .insert(question.id().value(), question.clone());
        Ok(())
    }

    async fn questions_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard
            .get(&course_id)
            .map(|bank| bank.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        guard.push(attempt.clone());
        Ok(())
    }

    async fn count_attempts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let count = guard
            .iter()
            .filter(|a| a.user_id == user_id && a.started_at >= since)
            .count();
        u32::try_from(count).map_err(|_| StorageError::Serialization("attempt count overflow".into()))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            courses,
            questions,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{QuestionDraft, QuestionId, Semester};
    use exam_core::time::fixed_now;

    fn build_course(id: u64, code: &str) -> Course {
        Course::new(CourseId::new(id), code, "Use of English", 100, Semester::First).unwrap()
    }

    fn build_question(id: u64, course_id: CourseId) -> Question {
        QuestionDraft {
            course_id,
            year: 2021,
            prompt: format!("Q{id}"),
            options: vec![("a".into(), "A".into()), ("b".into(), "B".into())],
            correct: "a".into(),
            explanation: None,
        }
        .validate(QuestionId::new(id))
        .unwrap()
    }

    #[tokio::test]
    async fn questions_are_grouped_by_course_and_ordered() {
        let repo = InMemoryRepository::new();
        let course = build_course(6, "GSS101");
        repo.upsert_course(&course).await.unwrap();

        for id in [3, 1, 2] {
            repo.upsert_question(&build_question(id, course.id()))
                .await
                .unwrap();
        }

        let ids: Vec<u64> = repo
            .questions_for_course(course.id())
            .await
            .unwrap()
            .iter()
            .map(|q| q.id().value())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(repo
            .questions_for_course(CourseId::new(99))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn question_for_unknown_course_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = repo
            .upsert_question(&build_question(1, CourseId::new(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn course_codes_are_unique() {
        let repo = InMemoryRepository::new();
        repo.upsert_course(&build_course(1, "GSS101")).await.unwrap();
        let err = repo
            .upsert_course(&build_course(2, "GSS101"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let found = repo.find_course_by_code("gss101").await.unwrap();
        assert_eq!(found.map(|c| c.id()), Some(CourseId::new(1)));
    }

    #[tokio::test]
    async fn attempts_are_counted_per_user_since_cutoff() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let now = fixed_now();
        for offset in [0, 1, 30] {
            repo.record_attempt(&AttemptRecord {
                user_id: user,
                course_id: CourseId::new(6),
                started_at: now - Duration::hours(offset),
            })
            .await
            .unwrap();
        }
        repo.record_attempt(&AttemptRecord {
            user_id: UserId::new(2),
            course_id: CourseId::new(6),
            started_at: now,
        })
        .await
        .unwrap();

        let count = repo
            .count_attempts_since(user, now - Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
