use std::sync::Arc;

use tracing::debug;

use skillpath_core::Clock;
use skillpath_core::model::{AssessmentId, AssessmentResult, ScoredAssessment};
use skillpath_core::session::AssessmentSession;
use storage::repository::{
    AssessmentResultRepository, ScoredAssessmentRow, SessionSnapshotRepository, Storage,
};

use crate::error::SessionStoreError;

/// Explicit save/load boundary for sessions and scored results.
#[derive(Clone)]
pub struct SessionStore {
    clock: Clock,
    snapshots: Arc<dyn SessionSnapshotRepository>,
    results: Arc<dyn AssessmentResultRepository>,
}

impl SessionStore {
    #[must_use]
    pub fn new(
        clock: Clock,
        snapshots: Arc<dyn SessionSnapshotRepository>,
        results: Arc<dyn AssessmentResultRepository>,
    ) -> Self {
        Self {
            clock,
            snapshots,
            results,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.snapshots),
            Arc::clone(&storage.results),
        )
    }

    /// Persist the session's current state, replacing any earlier snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if persistence fails.
    pub async fn save(&self, session: &AssessmentSession) -> Result<(), SessionStoreError> {
        self.snapshots
            .save_snapshot(&session.snapshot(), self.clock.now())
            .await?;
        debug!(assessment = %session.assessment_id(), phase = %session.phase(), "session saved");
        Ok(())
    }

    /// Load and re-validate a saved session.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` on read failures or
    /// `SessionStoreError::Snapshot` if the saved state violates session invariants.
    pub async fn load(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Option<AssessmentSession>, SessionStoreError> {
        let Some(snapshot) = self.snapshots.load_snapshot(assessment_id).await? else {
            return Ok(None);
        };
        Ok(Some(AssessmentSession::restore(snapshot)?))
    }

    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if the delete fails.
    pub async fn discard(&self, assessment_id: &AssessmentId) -> Result<bool, SessionStoreError> {
        Ok(self.snapshots.delete_snapshot(assessment_id).await?)
    }

    /// Append a scoring result to the history, stamped with the store's clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if persistence fails.
    pub async fn record_result(&self, result: &AssessmentResult) -> Result<i64, SessionStoreError> {
        let scored = ScoredAssessment::new(result.clone(), self.clock.now());
        Ok(self.results.append_result(&scored).await?)
    }

    /// A single recorded result by its history id.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` with `StorageError::NotFound` for an
    /// unknown id, or on read failures.
    pub async fn result(&self, id: i64) -> Result<ScoredAssessment, SessionStoreError> {
        Ok(self.results.get_result(id).await?)
    }

    /// Most recent results first.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` on read failures.
    pub async fn history(&self, limit: u32) -> Result<Vec<ScoredAssessmentRow>, SessionStoreError> {
        Ok(self.results.list_results(limit).await?)
    }
}
