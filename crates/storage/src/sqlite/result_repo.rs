use async_trait::async_trait;
use skillpath_core::model::ScoredAssessment;

use super::SqliteRepository;
use super::mapping::{conn, map_result_row};
use crate::repository::{AssessmentResultRepository, ScoredAssessmentRow, StorageError};

#[async_trait]
impl AssessmentResultRepository for SqliteRepository {
    async fn append_result(&self, scored: &ScoredAssessment) -> Result<i64, StorageError> {
        let result = &scored.result;
        let res = sqlx::query(
            r"
                INSERT INTO assessment_results (
                    assessment_id, personalization_id, score, max_score, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(result.assessment_id.as_str())
        .bind(result.personalization_id.as_str())
        .bind(i64::from(result.score))
        .bind(i64::from(result.max_score))
        .bind(scored.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<ScoredAssessment, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, assessment_id, personalization_id, score, max_score, completed_at
                FROM assessment_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row).map(|r| r.scored)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<ScoredAssessmentRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, assessment_id, personalization_id, score, max_score, completed_at
                FROM assessment_results
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }
}
