use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skillpath_core::model::AssessmentId;
use skillpath_core::session::SessionSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, phase_label, ser};
use crate::repository::{SessionSnapshotRepository, StorageError};

#[async_trait]
impl SessionSnapshotRepository for SqliteRepository {
    async fn save_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO session_snapshots (assessment_id, attempt, phase, payload, saved_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(assessment_id) DO UPDATE SET
                    attempt = excluded.attempt,
                    phase = excluded.phase,
                    payload = excluded.payload,
                    saved_at = excluded.saved_at
            ",
        )
        .bind(snapshot.assessment_id.as_str())
        .bind(i64::from(snapshot.attempt))
        .bind(phase_label(snapshot.phase))
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_snapshot(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query("SELECT payload FROM session_snapshots WHERE assessment_id = ?1")
            .bind(assessment_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;
        serde_json::from_str(&payload).map(Some).map_err(ser)
    }

    async fn delete_snapshot(&self, assessment_id: &AssessmentId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM session_snapshots WHERE assessment_id = ?1")
            .bind(assessment_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
