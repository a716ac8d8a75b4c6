//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{
    CourseId, OptionKey, PoolError, QuestionId, SessionStateError, SettingsError,
};
use storage::repository::StorageError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this course")]
    EmptyPool,
    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),
    #[error("option {key} is not a choice for question {question}")]
    UnknownOption { question: QuestionId, key: OptionKey },
    #[error("session already completed")]
    InvalidState,
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("free plan allows {limit} exams per day")]
    DailyLimitReached { limit: u32 },
    #[error("invalid exam settings: {0}")]
    InvalidSettings(#[from] SettingsError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SessionStateError> for SessionError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::EmptyPool => SessionError::EmptyPool,
            SessionStateError::Completed => SessionError::InvalidState,
            SessionStateError::UnknownQuestion(id) => SessionError::UnknownQuestion(id),
            SessionStateError::UnknownOption { question, key } => {
                SessionError::UnknownOption { question, key }
            }
        }
    }
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_map_to_session_errors() {
        let question = QuestionId::new(4);
        let key = OptionKey::new("e").unwrap();

        assert!(matches!(
            SessionError::from(SessionStateError::EmptyPool),
            SessionError::EmptyPool
        ));
        assert!(matches!(
            SessionError::from(SessionStateError::Completed),
            SessionError::InvalidState
        ));
        assert!(matches!(
            SessionError::from(SessionStateError::UnknownQuestion(question)),
            SessionError::UnknownQuestion(id) if id == question
        ));
        assert!(matches!(
            SessionError::from(SessionStateError::UnknownOption { question, key: key.clone() }),
            SessionError::UnknownOption { key: k, .. } if k == key
        ));
    }
}
