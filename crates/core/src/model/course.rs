use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CourseId;

/// Code prefix shared by general-studies courses, the ones offered as timed exams.
pub const GENERAL_STUDIES_PREFIX: &str = "GSS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course code cannot be empty")]
    EmptyCode,

    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course level must be a multiple of 100 between 100 and 900, got {0}")]
    InvalidLevel(u16),

    #[error("unknown semester: {0}")]
    InvalidSemester(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Semester::First => "first",
            Semester::Second => "second",
        }
    }

    /// Parse the lowercase storage form.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::InvalidSemester` for anything but `first`/`second`.
    pub fn parse(raw: &str) -> Result<Self, CourseError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Semester::First),
            "second" => Ok(Semester::Second),
            other => Err(CourseError::InvalidSemester(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    code: String,
    title: String,
    level: u16,
    semester: Semester,
}

impl Course {
    /// Creates a validated course. The code is uppercased.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if code/title are blank or the level is not 100..=900 in steps of 100.
    pub fn new(
        id: CourseId,
        code: impl Into<String>,
        title: impl Into<String>,
        level: u16,
        semester: Semester,
    ) -> Result<Self, CourseError> {
        let code = code.into().trim().to_uppercase();
        if code.is_empty() {
            return Err(CourseError::EmptyCode);
        }
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if !(100..=900).contains(&level) || level % 100 != 0 {
            return Err(CourseError::InvalidLevel(level));
        }

        Ok(Self {
            id,
            code,
            title,
            level,
            semester,
        })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn level(&self) -> u16 {
        self.level
    }

    #[must_use]
    pub fn semester(&self) -> Semester {
        self.semester
    }

    /// `"GSS101: Use of English"`
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}: {}", self.code, self.title)
    }

    #[must_use]
    pub fn is_general_studies(&self) -> bool {
        self.code.starts_with(GENERAL_STUDIES_PREFIX)
    }
}
