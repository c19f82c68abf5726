use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::api::{ApiConfig, AssessmentApi, HttpAssessmentApi};
use crate::error::AppServicesError;
use crate::flow::{FlowController, FlowSettings, Navigator};
use crate::session_store::SessionStore;

/// Assembles the app-facing services over `SQLite` storage and the HTTP API.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    api: Arc<dyn AssessmentApi>,
    store: Arc<SessionStore>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the API
    /// configuration is unusable.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        api_config: ApiConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api: Arc<dyn AssessmentApi> = Arc::new(HttpAssessmentApi::new(api_config)?);
        Ok(Self::from_parts(clock, api, &storage))
    }

    /// Assemble services from an existing storage and API implementation.
    #[must_use]
    pub fn from_parts(clock: Clock, api: Arc<dyn AssessmentApi>, storage: &Storage) -> Self {
        Self {
            clock,
            api,
            store: Arc::new(SessionStore::from_storage(clock, storage)),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn AssessmentApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub fn session_store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// A fresh flow controller wired to this app's API and store.
    #[must_use]
    pub fn flow_controller(
        &self,
        navigator: Arc<dyn Navigator>,
        settings: FlowSettings,
    ) -> FlowController {
        FlowController::new(self.api(), navigator, self.clock)
            .with_store(self.session_store())
            .with_settings(settings)
    }
}
