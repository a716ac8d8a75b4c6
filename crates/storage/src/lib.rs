#![forbid(unsafe_code)]

pub mod fixtures;
pub mod repository;
pub mod sqlite;

pub use repository::{
    AttemptRecord, AttemptRepository, CourseRepository, InMemoryRepository, QuestionRepository,
    Storage, StorageError,
};
