//! Dependency initialization and wiring for the search provider.

use std::sync::Arc;

use tracing::info;

use search_provider_repository::{OpenSearchStore, SearchProvider};

use crate::config::Settings;
use crate::StartupError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The provider, connected and with active aliases in place.
    pub provider: SearchProvider,
    pub document_types: Vec<String>,
}

impl Dependencies {
    /// Initialize all dependencies from `settings`.
    ///
    /// The server must answer the health check. Every configured document
    /// type then gets its active alias if it has none.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(StartupError)` - If initialization fails
    pub async fn new(settings: Settings) -> Result<Self, StartupError> {
        info!(
            server = %settings.provider.server,
            scope = %settings.provider.scope,
            document_types = ?settings.document_types,
            "Initializing dependencies"
        );

        let store = OpenSearchStore::new(&settings.provider)?;
        let provider = SearchProvider::new(settings.provider, Arc::new(store))?;

        let health = provider.health_check().await;
        if !health.healthy {
            return Err(StartupError::config(health.description));
        }
        info!("Search server connection verified");

        provider
            .add_active_alias(&settings.document_types)
            .await;

        Ok(Self {
            provider,
            document_types: settings.document_types,
        })
    }
}
