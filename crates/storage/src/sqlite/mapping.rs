use skillpath_core::model::{AssessmentId, AssessmentResult, PersonalizationId, ScoredAssessment};
use skillpath_core::session::SessionPhase;
use sqlx::Row;

use crate::repository::{ScoredAssessmentRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Loading => "loading",
        SessionPhase::InProgress => "in_progress",
        SessionPhase::Complete => "complete",
        SessionPhase::Error => "error",
    }
}

pub(crate) fn map_result_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ScoredAssessmentRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let assessment_id: String = row.try_get("assessment_id").map_err(ser)?;
    let personalization_id: String = row.try_get("personalization_id").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let max_score = u32_from_i64("max_score", row.try_get::<i64, _>("max_score").map_err(ser)?)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    let result = AssessmentResult {
        score,
        max_score,
        assessment_id: AssessmentId::new(assessment_id),
        personalization_id: PersonalizationId::new(personalization_id),
    };
    Ok(ScoredAssessmentRow::new(
        id,
        ScoredAssessment::new(result, completed_at),
    ))
}
