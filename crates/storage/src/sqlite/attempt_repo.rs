use chrono::{DateTime, Utc};
use exam_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, course_id_to_i64, ser, user_id_to_i64};
use crate::repository::{AttemptRecord, AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO exam_attempts (user_id, course_id, started_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(user_id_to_i64(attempt.user_id)?)
        .bind(course_id_to_i64(attempt.course_id)?)
        .bind(attempt.started_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn count_attempts_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS attempts
            FROM exam_attempts
            WHERE user_id = ?1 AND started_at >= ?2
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let count: i64 = row.try_get("attempts").map_err(ser)?;
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid attempt count: {count}")))
    }
}
