use exam_core::model::{CourseId, Question};

use super::SqliteRepository;
use super::mapping::{conn, course_id_to_i64, map_question_row, options_to_json, u64_to_i64};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO questions (id, course_id, year, prompt, options, correct, explanation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                course_id = excluded.course_id,
                year = excluded.year,
                prompt = excluded.prompt,
                options = excluded.options,
                correct = excluded.correct,
                explanation = excluded.explanation
            ",
        )
        .bind(u64_to_i64("question_id", question.id().value())?)
        .bind(course_id_to_i64(question.course_id())?)
        .bind(i64::from(question.year()))
        .bind(question.prompt())
        .bind(options_to_json(question.options())?)
        .bind(question.correct_key().as_str())
        .bind(question.explanation())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StorageError::NotFound)
            }
            Err(e) => Err(conn(e)),
        }
    }

    async fn questions_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, year, prompt, options, correct, explanation
            FROM questions
            WHERE course_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(course_id_to_i64(course_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }
}
