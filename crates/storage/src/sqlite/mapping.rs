use std::collections::BTreeMap;

use exam_core::model::{
    Course, CourseId, OptionKey, Question, QuestionDraft, QuestionId, Semester, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn course_id_to_i64(id: CourseId) -> Result<i64, StorageError> {
    u64_to_i64("course_id", id.value())
}

pub(crate) fn user_id_to_i64(id: UserId) -> Result<i64, StorageError> {
    u64_to_i64("user_id", id.value())
}

/// Options are stored as a JSON object: `{"a": "...", "b": "..."}`.
pub(crate) fn options_to_json(
    options: &BTreeMap<OptionKey, String>,
) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

fn options_from_json(raw: &str) -> Result<Vec<(String, String)>, StorageError> {
    let parsed: BTreeMap<String, String> = serde_json::from_str(raw).map_err(ser)?;
    Ok(parsed.into_iter().collect())
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let id = course_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let level_i64: i64 = row.try_get("level").map_err(ser)?;
    let level = u16::try_from(level_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid level: {level_i64}")))?;
    let semester_str: String = row.try_get("semester").map_err(ser)?;
    let semester = Semester::parse(&semester_str).map_err(ser)?;

    Course::new(
        id,
        row.try_get::<String, _>("code").map_err(ser)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        level,
        semester,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let course_id = course_id_from_i64(row.try_get("course_id").map_err(ser)?)?;
    let year_i64: i64 = row.try_get("year").map_err(ser)?;
    let year = u16::try_from(year_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid year: {year_i64}")))?;
    let options_raw: String = row.try_get("options").map_err(ser)?;

    QuestionDraft {
        course_id,
        year,
        prompt: row.try_get("prompt").map_err(ser)?,
        options: options_from_json(&options_raw)?,
        correct: row.try_get("correct").map_err(ser)?,
        explanation: row.try_get("explanation").map_err(ser)?,
    }
    .validate(id)
    .map_err(ser)
}
