//! Demo course catalogue used by the `seed` binary and the in-memory app mode.

use exam_core::model::{Course, CourseId, Question, QuestionDraft, QuestionId, Semester};

use crate::repository::{Storage, StorageError};

/// Questions generated per course.
pub const QUESTIONS_PER_COURSE: u64 = 10;

const COURSES: [(u64, &str, &str, u16, Semester); 8] = [
    (1, "CSC101", "Introduction to Computer Science", 100, Semester::First),
    (2, "CSC102", "Introduction to Programming", 100, Semester::Second),
    (3, "CSC201", "Data Structures", 200, Semester::First),
    (4, "CSC301", "Database Systems", 300, Semester::First),
    (5, "PHY101", "General Physics I", 100, Semester::First),
    (6, "GSS101", "Use of English", 100, Semester::First),
    (7, "GSS102", "Philosophy and Logic", 100, Semester::Second),
    (8, "GSS201", "Peace Studies and Conflict Resolution", 200, Semester::First),
];

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub courses: Vec<Course>,
    pub questions: Vec<Question>,
}

impl DemoCatalog {
    #[must_use]
    pub fn questions_for(&self, course_id: CourseId) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.course_id() == course_id)
            .collect()
    }
}

/// Build the demo catalogue. Correct answers rotate deterministically so runs are repeatable.
///
/// # Errors
///
/// Returns `exam_core::Error` if a generated course or question fails validation.
pub fn demo_catalog() -> Result<DemoCatalog, exam_core::Error> {
    let mut courses = Vec::with_capacity(COURSES.len());
    let mut questions = Vec::new();

    for (id, code, title, level, semester) in COURSES {
        let course = Course::new(CourseId::new(id), code, title, level, semester)?;

        for n in 1..=QUESTIONS_PER_COURSE {
            let rotation = usize::try_from((id * 3 + n) % 4).unwrap_or(0);
            let draft = QuestionDraft {
                course_id: course.id(),
                year: 2020 + u16::try_from(n % 5).unwrap_or(0),
                prompt: format!(
                    "Sample question {n} for {code}: What is the correct answer to this {} question?",
                    title.to_lowercase()
                ),
                options: KEYS
                    .iter()
                    .map(|key| {
                        (
                            (*key).to_string(),
                            format!("Option {} explanation", key.to_uppercase()),
                        )
                    })
                    .collect(),
                correct: KEYS[rotation].to_string(),
                explanation: Some("This is the explanation for the correct answer.".into()),
            };
            questions.push(draft.validate(QuestionId::new(id * 100 + n))?);
        }

        courses.push(course);
    }

    Ok(DemoCatalog { courses, questions })
}

/// Write every course and question of `catalog` into `storage`.
///
/// # Errors
///
/// Returns `StorageError` if any upsert fails.
pub async fn load_catalog(storage: &Storage, catalog: &DemoCatalog) -> Result<(), StorageError> {
    for course in &catalog.courses {
        storage.courses.upsert_course(course).await?;
    }
    for question in &catalog.questions {
        storage.questions.upsert_question(question).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_ten_questions_per_course() {
        let catalog = demo_catalog().unwrap();
        assert_eq!(catalog.courses.len(), 8);
        for course in &catalog.courses {
            assert_eq!(
                catalog.questions_for(course.id()).len() as u64,
                QUESTIONS_PER_COURSE
            );
        }
    }

    #[test]
    fn catalog_is_deterministic() {
        let a = demo_catalog().unwrap();
        let b = demo_catalog().unwrap();
        assert_eq!(a.questions, b.questions);
    }

    #[tokio::test]
    async fn loads_into_in_memory_storage() {
        let storage = Storage::in_memory();
        let catalog = demo_catalog().unwrap();
        load_catalog(&storage, &catalog).await.unwrap();

        let gss = storage
            .courses
            .find_course_by_code("GSS101")
            .await
            .unwrap()
            .unwrap();
        let questions = storage.questions.questions_for_course(gss.id()).await.unwrap();
        assert_eq!(questions.len(), 10);
    }
}
