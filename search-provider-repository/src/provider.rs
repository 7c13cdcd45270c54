//! Search provider facade.
//!
//! This module provides the entry point application code uses to index,
//! search, suggest, and manage the indices of each document type.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use search_provider_shared::{
    IndexDocument, IndexingResult, SearchRequest, SearchResponse, SuggestionRequest,
    SuggestionResponse,
};

use crate::config::ProviderConfig;
use crate::document::DocumentAdapter;
use crate::errors::{SearchError, StoreContext};
use crate::indexing::BulkIndexer;
use crate::interfaces::{QueryBuilder, SearchStore};
use crate::lifecycle::{validate_document_type, AliasKind, IndexLifecycle, IndexNaming};
use crate::query::{build_suggest_query, SimpleQueryBuilder};
use crate::response::{parse_search_response, parse_suggestions};
use crate::schema::SchemaRegistry;

/// Result of a [`SearchProvider::health_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub description: String,
}

impl HealthStatus {
    pub fn healthy(description: impl Into<String>) -> Self {
        Self {
            healthy: true,
            description: description.into(),
        }
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self {
            healthy: false,
            description: description.into(),
        }
    }
}

/// The main entry point of the search provider.
///
/// Composes the document store, the schema registry, the index lifecycle
/// and the bulk indexer. Every operation addresses a document type, which
/// is resolved to its active or backup alias.
pub struct SearchProvider {
    config: ProviderConfig,
    store: Arc<dyn SearchStore>,
    schema: Arc<SchemaRegistry>,
    lifecycle: Arc<IndexLifecycle>,
    indexer: BulkIndexer,
    query_builder: Arc<dyn QueryBuilder>,
    context: StoreContext,
}

impl SearchProvider {
    /// Create a provider with the default [`SimpleQueryBuilder`].
    pub fn new(config: ProviderConfig, store: Arc<dyn SearchStore>) -> Result<Self, SearchError> {
        Self::with_query_builder(config, store, Arc::new(SimpleQueryBuilder::new()))
    }

    /// Create a provider with a custom query builder.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ConfigurationError`] when the server address or
    /// the indexing settings are invalid.
    pub fn with_query_builder(
        config: ProviderConfig,
        store: Arc<dyn SearchStore>,
        query_builder: Arc<dyn QueryBuilder>,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let context = StoreContext::new(config.server_url()?.as_str(), &config.scope);
        let schema = Arc::new(SchemaRegistry::new(Arc::clone(&store)));
        let lifecycle = Arc::new(IndexLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&schema),
            Arc::clone(&query_builder),
            IndexNaming::new(&config),
            config.indexing.clone(),
            context.clone(),
        ));
        let indexer = BulkIndexer::new(
            Arc::clone(&store),
            Arc::clone(&schema),
            Arc::clone(&lifecycle),
            DocumentAdapter::default(),
            context.clone(),
        );

        Ok(Self {
            config,
            store,
            schema,
            lifecycle,
            indexer,
            query_builder,
            context,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Index or replace documents through the active alias.
    ///
    /// # Arguments
    ///
    /// * `document_type` - The document type, e.g. `Product`
    /// * `documents` - The documents to write
    ///
    /// # Returns
    ///
    /// * `Ok(IndexingResult)` - One item per document; failures of single
    ///   documents are reported as items
    /// * `Err(SearchError)` - If the target index could not be prepared
    pub async fn index(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        if Self::is_empty_batch(document_type, documents)? {
            return Ok(IndexingResult::default());
        }
        self.indexer.index(document_type, documents).await
    }

    /// Merge documents into existing documents of the active alias.
    ///
    /// Fields not yet in the mapping are not registered; the store decides
    /// how to map them.
    pub async fn index_partial(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        if Self::is_empty_batch(document_type, documents)? {
            return Ok(IndexingResult::default());
        }
        self.indexer.index_partial(document_type, documents).await
    }

    /// Index documents through the backup alias for a full reindex, to be
    /// followed by [`swap_index`](Self::swap_index).
    pub async fn index_with_backup(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        if Self::is_empty_batch(document_type, documents)? {
            return Ok(IndexingResult::default());
        }
        self.indexer.index_with_backup(document_type, documents).await
    }

    /// Delete documents by id from the active alias.
    pub async fn remove(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        if Self::is_empty_batch(document_type, documents)? {
            return Ok(IndexingResult::default());
        }
        self.indexer.remove(document_type, documents).await
    }

    /// Make the backup index of `document_type` the active one and the
    /// active index the backup.
    pub async fn swap_index(&self, document_type: &str) -> Result<(), SearchError> {
        self.lifecycle.swap_index(document_type).await
    }

    /// Delete the backup index of `document_type`. Deleting a missing
    /// backup index succeeds.
    pub async fn delete_index(&self, document_type: &str) -> Result<(), SearchError> {
        self.lifecycle.delete_backup_index(document_type).await
    }

    /// Search documents of `document_type`.
    #[instrument(skip(self, request))]
    pub async fn search(
        &self,
        document_type: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        validate_document_type(document_type)?;

        let alias = self
            .lifecycle
            .alias_name(AliasKind::select(request.use_backup_index), document_type);
        let known = self
            .schema
            .get_mapping(&alias)
            .await
            .map_err(|e| self.context.error("Failed to load mapping", e))?;

        let body = self.query_builder.build_query(request, &alias, &known);
        debug!(alias = %alias, query = %body, "Executing search");

        let raw = self
            .store
            .search(&[alias.clone()], body)
            .await
            .map_err(|e| self.context.error("Search request failed", e))?;

        let response = parse_search_response(&raw, request);
        debug!(
            alias = %alias,
            total = response.total_count,
            returned = response.documents.len(),
            "Search completed"
        );
        Ok(response)
    }

    /// Completion suggestions for `request.query` over the requested
    /// suggestable fields.
    #[instrument(skip(self, request))]
    pub async fn suggest(
        &self,
        document_type: &str,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, SearchError> {
        validate_document_type(document_type)?;
        if request.fields.is_empty() {
            return Ok(SuggestionResponse::default());
        }

        let alias = self
            .lifecycle
            .alias_name(AliasKind::select(request.use_backup_index), document_type);
        let raw = self
            .store
            .search(&[alias], build_suggest_query(request))
            .await
            .map_err(|e| self.context.error("Suggestion request failed", e))?;

        Ok(parse_suggestions(&raw, request))
    }

    /// Attach the active alias to the default index of each document type
    /// that has none. Failures are logged per type.
    pub async fn add_active_alias<I, S>(&self, document_types: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lifecycle.add_active_alias(document_types).await
    }

    /// Ping the store with the health-check timeout.
    pub async fn health_check(&self) -> HealthStatus {
        match self.store.ping(self.config.health_check_timeout).await {
            Ok(true) => {
                info!(server = %self.context.server_url, "Search server is reachable");
                HealthStatus::healthy("Elastic server is reachable")
            }
            Ok(false) => {
                warn!(server = %self.context.server_url, "Search server did not answer the ping");
                HealthStatus::unhealthy("No connection to Elastic-server.\nPing was not answered")
            }
            Err(e) => {
                warn!(server = %self.context.server_url, error = %e, "Search server is unreachable");
                HealthStatus::unhealthy(format!("No connection to Elastic-server.\n{}", e))
            }
        }
    }

    /// Validate the document type, and report batches with nothing to do.
    fn is_empty_batch(
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<bool, SearchError> {
        validate_document_type(document_type)?;
        if documents.iter().any(|document| document.id.is_empty()) {
            return Err(SearchError::invalid_argument("All documents must have an id"));
        }
        Ok(documents.is_empty())
    }
}
