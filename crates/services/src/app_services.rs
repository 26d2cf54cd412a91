use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::dashboard::Dashboard;
use crate::error::AppServicesError;
use crate::profile_service::ProfileService;
use crate::tracker_service::TrackerService;

/// Assembles app-facing services over one store.
#[derive(Clone)]
pub struct AppServices {
    tracker: Arc<TrackerService>,
    profile: Arc<ProfileService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or loading the
    /// stored state fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock).await
    }

    /// Build services over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if loading the (empty) state fails.
    pub async fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock).await
    }

    /// # Errors
    ///
    /// Returns `AppServicesError` if the stored state cannot be loaded.
    pub async fn from_storage(storage: Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let tracker = Arc::new(TrackerService::load(clock, Arc::clone(&storage.kv)).await?);
        let profile = Arc::new(ProfileService::new(Arc::clone(&storage.kv)));
        Ok(Self { tracker, profile })
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<TrackerService> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn profile(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profile)
    }

    /// Current dashboard view.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the tracker state is unavailable.
    pub fn dashboard(&self) -> Result<Dashboard, AppServicesError> {
        let state = self.tracker.snapshot()?;
        Ok(Dashboard::from_state(&state))
    }
}
