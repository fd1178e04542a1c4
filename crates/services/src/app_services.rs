use std::sync::Arc;

use storage::repository::{KeyValueStore, Storage};
use trivia_core::{EngineSettings, QuestionCatalog};

use crate::Clock;
use crate::error::EngineError;
use crate::sessions::SessionManager;

/// Assembles the catalog, storage backend and settings the engine runs on.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<QuestionCatalog>,
    storage: Storage,
    settings: EngineSettings,
    clock: Clock,
}

impl AppServices {
    /// Build services on the bundled catalog, backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if the bundled catalog is invalid or storage
    /// initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        settings: EngineSettings,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        let storage = Storage::sqlite(db_url).await?;
        let catalog = Arc::new(QuestionCatalog::bundled()?);
        tracing::info!(questions = catalog.len(), "catalog loaded");
        Ok(Self::new(catalog, storage, settings, clock))
    }

    /// Build services on the bundled catalog with volatile storage.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Catalog` if the bundled catalog is invalid.
    pub fn in_memory(settings: EngineSettings, clock: Clock) -> Result<Self, EngineError> {
        let catalog = Arc::new(QuestionCatalog::bundled()?);
        Ok(Self::new(catalog, Storage::in_memory(), settings, clock))
    }

    #[must_use]
    pub fn new(
        catalog: Arc<QuestionCatalog>,
        storage: Storage,
        settings: EngineSettings,
        clock: Clock,
    ) -> Self {
        Self {
            catalog,
            storage,
            settings,
            clock,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<QuestionCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Resume the saved session, or start a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Runtime` when called outside a tokio runtime.
    pub async fn open_session(&self) -> Result<SessionManager, EngineError> {
        SessionManager::hydrate(
            Arc::clone(&self.catalog),
            Arc::clone(&self.storage.kv),
            self.settings.clone(),
            self.clock,
        )
        .await
    }

    /// Delete the saved session without opening it. Returns whether it succeeded.
    pub async fn clear_saved_session(&self) -> bool {
        match self.storage.kv.remove(self.settings.storage_key()).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "could not clear saved session");
                false
            }
        }
    }
}
