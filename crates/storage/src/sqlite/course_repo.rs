use exam_core::model::{Course, CourseId};

use super::SqliteRepository;
use super::mapping::{conn, course_id_to_i64, map_course_row};
use crate::repository::{CourseRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO courses (id, code, title, level, semester)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                code = excluded.code,
                title = excluded.title,
                level = excluded.level,
                semester = excluded.semester
            ",
        )
        .bind(course_id_to_i64(course.id())?)
        .bind(course.code())
        .bind(course.title())
        .bind(i64::from(course.level()))
        .bind(course.semester().as_str())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::Conflict)
            }
            Err(e) => Err(conn(e)),
        }
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query("SELECT id, code, title, level, semester FROM courses WHERE id = ?1")
            .bind(course_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn find_course_by_code(&self, code: &str) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            "SELECT id, code, title, level, semester FROM courses WHERE code = ?1 COLLATE NOCASE",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query("SELECT id, code, title, level, semester FROM courses ORDER BY code ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_course_row).collect()
    }
}
