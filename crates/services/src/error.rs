//! Shared error types for the services crate.

use thiserror::Error;

use skillpath_core::model::ConfigurationError;
use skillpath_core::reconcile::ReconcileError;
use skillpath_core::session::{SessionError, SnapshotError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::flow::FlowStage;

/// Errors emitted by `AssessmentApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("invalid assessment service URL: {0}")]
    InvalidBaseUrl(String),
    #[error("assessment service timed out")]
    Timeout,
    #[error("assessment service request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("assessment service returned an unreadable response: {0}")]
    Decode(String),
    #[error(transparent)]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Http(err)
        }
    }
}

/// Errors emitted by `ConfigurationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationServiceError {
    #[error("describe what you want to learn first")]
    EmptyPrompt,
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `SessionStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Errors emitted by `FlowController`. Each one is also shown on the error banner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("not available while in the {stage} stage")]
    WrongStage { stage: FlowStage },
    #[error("a request is already in progress")]
    RequestOutstanding,
    #[error("no assessment is open")]
    NoSession,
    #[error("there is no failed submission to retry")]
    NothingToRetry,
    #[error("the response belongs to an earlier attempt and was ignored")]
    Stale,
    #[error(transparent)]
    Configure(#[from] ConfigurationServiceError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
