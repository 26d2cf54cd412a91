//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tracker_core::TrackerError;

/// Errors emitted by `TrackerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerServiceError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("tracker state lock poisoned")]
    Poisoned,
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error("no signed-in profile")]
    SignedOut,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl From<TrackerServiceError> for AppServicesError {
    fn from(err: TrackerServiceError) -> Self {
        match err {
            TrackerServiceError::Tracker(err) => Self::Tracker(err),
            TrackerServiceError::Storage(err) => Self::Storage(err),
            TrackerServiceError::Poisoned => {
                Self::Storage(StorageError::Connection("tracker state lock poisoned".into()))
            }
        }
    }
}
