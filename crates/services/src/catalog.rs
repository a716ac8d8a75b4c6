use std::sync::Arc;

use exam_core::model::{Course, CourseId, GENERAL_STUDIES_PREFIX, Semester};
use storage::repository::{CourseRepository, QuestionRepository, Storage};

use crate::error::CatalogError;

/// Narrows a course list. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub code_prefix: Option<String>,
    pub level: Option<u16>,
    pub semester: Option<Semester>,
    /// Case-insensitive match against code or title.
    pub query: Option<String>,
}

impl CourseFilter {
    /// Courses offered on the CBT screen.
    #[must_use]
    pub fn general_studies() -> Self {
        Self {
            code_prefix: Some(GENERAL_STUDIES_PREFIX.to_owned()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn matches(&self, course: &Course) -> bool {
        let prefix_ok = self.code_prefix.as_ref().is_none_or(|prefix| {
            course
                .code()
                .starts_with(&prefix.trim().to_ascii_uppercase())
        });
        if !prefix_ok {
            return false;
        }
        if self.level.is_some_and(|level| level != course.level()) {
            return false;
        }
        if self.semester.is_some_and(|semester| semester != course.semester()) {
            return false;
        }
        if let Some(query) = &self.query {
            let needle = query.trim().to_lowercase();
            if !needle.is_empty()
                && !course.code().to_lowercase().contains(&needle)
                && !course.title().to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    #[must_use]
    pub fn apply(&self, courses: Vec<Course>) -> Vec<Course> {
        courses.into_iter().filter(|c| self.matches(c)).collect()
    }
}

/// A course row for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseListItem {
    pub course: Course,
    pub question_count: usize,
}

/// Read-side access to the course catalogue.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { courses, questions }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.courses), Arc::clone(&storage.questions))
    }

    /// Courses matching `filter`, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, CatalogError> {
        Ok(filter.apply(self.courses.list_courses().await?))
    }

    /// Courses matching `filter` with their question counts.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_with_counts(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<CourseListItem>, CatalogError> {
        let courses = self.list_courses(filter).await?;
        let mut items = Vec::with_capacity(courses.len());
        for course in courses {
            let question_count = self.questions.questions_for_course(course.id()).await?.len();
            items.push(CourseListItem {
                course,
                question_count,
            });
        }
        Ok(items)
    }

    /// Resolve a numeric id or a course code.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn find_course(&self, selector: &str) -> Result<Option<Course>, CatalogError> {
        let selector = selector.trim();
        if let Ok(id) = selector.parse::<CourseId>() {
            return Ok(self.courses.get_course(id).await?);
        }
        Ok(self.courses.find_course_by_code(selector).await?)
    }
}
