use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skillpath_core::model::{AssessmentId, ScoredAssessment};
use skillpath_core::session::SessionSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted scoring result with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredAssessmentRow {
    pub id: i64,
    pub scored: ScoredAssessment,
}

impl ScoredAssessmentRow {
    #[must_use]
    pub fn new(id: i64, scored: ScoredAssessment) -> Self {
        Self { id, scored }
    }
}

/// Save/load boundary for in-flight assessment sessions.
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Insert or replace the snapshot for its assessment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch the latest snapshot for an assessment, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn load_snapshot(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Remove the snapshot for an assessment. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn delete_snapshot(&self, assessment_id: &AssessmentId) -> Result<bool, StorageError>;
}

/// Append-only history of scored assessments.
#[async_trait]
pub trait AssessmentResultRepository: Send + Sync {
    /// Append a scored result and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, scored: &ScoredAssessment) -> Result<i64, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<ScoredAssessment, StorageError>;

    /// Most recent results first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_results(&self, limit: u32) -> Result<Vec<ScoredAssessmentRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<AssessmentId, SessionSnapshot>>>,
    results: Arc<Mutex<Vec<ScoredAssessment>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionSnapshotRepository for InMemoryRepository {
    async fn save_snapshot(
        &self,
        snapshot: &SessionSnapshot,
        _saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.snapshots.lock().map_err(poisoned)?;
        guard.insert(snapshot.assessment_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self.snapshots.lock().map_err(poisoned)?;
        Ok(guard.get(assessment_id).cloned())
    }

    async fn delete_snapshot(&self, assessment_id: &AssessmentId) -> Result<bool, StorageError> {
        let mut guard = self.snapshots.lock().map_err(poisoned)?;
        Ok(guard.remove(assessment_id).is_some())
    }
}

#[async_trait]
impl AssessmentResultRepository for InMemoryRepository {
    async fn append_result(&self, scored: &ScoredAssessment) -> Result<i64, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        guard.push(scored.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("id overflow".into()))
    }

    async fn get_result(&self, id: i64) -> Result<ScoredAssessment, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let index = id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or(StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<ScoredAssessmentRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows: Vec<ScoredAssessmentRow> = guard
            .iter()
            .enumerate()
            .map(|(i, scored)| {
                ScoredAssessmentRow::new(i64::try_from(i + 1).unwrap_or(i64::MAX), scored.clone())
            })
            .collect();
        rows.sort_by(|a, b| {
            b.scored
                .completed_at
                .cmp(&a.scored.completed_at)
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SessionSnapshotRepository>,
    pub results: Arc<dyn AssessmentResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let snapshots: Arc<dyn SessionSnapshotRepository> = Arc::new(repo.clone());
        let results: Arc<dyn AssessmentResultRepository> = Arc::new(repo);
        Self { snapshots, results }
    }
}
