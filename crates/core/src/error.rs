use thiserror::Error;

use crate::model::{ConfigurationError, QuestionError};
use crate::reconcile::ReconcileError;
use crate::session::{SessionError, SnapshotError};

/// Any domain error raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
