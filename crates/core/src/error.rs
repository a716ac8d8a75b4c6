use thiserror::Error;

use crate::model::{CourseError, PoolError, QuestionError, SessionStateError, SettingsError};

/// Umbrella over the domain validation errors, handy for binaries and seeding code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
