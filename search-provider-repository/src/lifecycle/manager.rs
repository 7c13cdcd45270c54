//! Alias-based index lifecycle.
//!
//! Every document type has an `active` alias that serves searches and a
//! `backup` alias that receives full reindexing. A swap exchanges them
//! atomically, so searches never see a half-built index.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use search_provider_shared::{SearchRequest, SortingField, INDEXATION_DATE_FIELD_NAME};

use crate::config::IndexingSettings;
use crate::errors::{SearchError, StoreContext};
use crate::interfaces::{QueryBuilder, SearchStore};
use crate::lifecycle::index_config::create_index_body;
use crate::lifecycle::naming::{random_index_suffix, AliasKind, IndexNaming};
use crate::schema::{PropertySet, SchemaRegistry};
use crate::types::AliasAction;

/// Creates, swaps, and cleans up the physical indices behind the aliases.
pub struct IndexLifecycle {
    store: Arc<dyn SearchStore>,
    schema: Arc<SchemaRegistry>,
    query_builder: Arc<dyn QueryBuilder>,
    naming: IndexNaming,
    settings: IndexingSettings,
    context: StoreContext,
}

impl IndexLifecycle {
    pub fn new(
        store: Arc<dyn SearchStore>,
        schema: Arc<SchemaRegistry>,
        query_builder: Arc<dyn QueryBuilder>,
        naming: IndexNaming,
        settings: IndexingSettings,
        context: StoreContext,
    ) -> Self {
        Self {
            store,
            schema,
            query_builder,
            naming,
            settings,
            context,
        }
    }

    pub fn naming(&self) -> &IndexNaming {
        &self.naming
    }

    pub fn alias_name(&self, kind: AliasKind, document_type: &str) -> String {
        self.naming.alias_name(kind, document_type)
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        self.store.index_exists(index).await.map_err(|e| {
            self.context
                .error(format!("Index check call failed for index: {}", index), e)
        })
    }

    /// Create `index` with the provider's analysis settings and `alias`
    /// attached.
    #[instrument(skip(self))]
    pub async fn create_index(&self, index: &str, alias: &str) -> Result<(), SearchError> {
        self.store
            .create_index(index, create_index_body(&self.settings, alias))
            .await
            .map_err(|e| self.context.error("Failed to create index", e))?;

        info!(index = %index, alias = %alias, "Created index");
        Ok(())
    }

    /// Make sure `alias` resolves to an index, creating a new randomly
    /// suffixed index for it if needed.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If a new index was created
    /// * `Ok(false)` - If the alias already existed
    pub async fn ensure_index(&self, document_type: &str, alias: &str) -> Result<bool, SearchError> {
        if self.index_exists(alias).await? {
            return Ok(false);
        }

        let index = self
            .naming
            .index_name_with_suffix(document_type, &random_index_suffix());
        self.create_index(&index, alias).await?;
        Ok(true)
    }

    /// Exchange the active and backup aliases of `document_type`.
    ///
    /// When the active alias is missing it is first attached to the
    /// default index, which is created if necessary. The exchange itself is
    /// one atomic alias update.
    #[instrument(skip(self))]
    pub async fn swap_index(&self, document_type: &str) -> Result<(), SearchError> {
        validate_document_type(document_type)?;

        let active_alias = self.alias_name(AliasKind::Active, document_type);
        let backup_alias = self.alias_name(AliasKind::Backup, document_type);

        if !self.index_exists(&active_alias).await? {
            let default_index = self.naming.index_name(document_type);
            if !self.index_exists(&default_index).await? {
                self.create_index(&default_index, &active_alias).await?;
            } else {
                self.store
                    .put_alias(&default_index, &active_alias)
                    .await
                    .map_err(|e| self.context.error("Failed to put alias", e))?;
            }
        }

        let Some(active_index) = self.first_index_of(&active_alias).await? else {
            warn!(alias = %active_alias, "Active alias resolves to no index, nothing to swap");
            return Ok(());
        };
        let backup_index = self.first_index_of(&backup_alias).await?;

        let mut actions = vec![AliasAction::remove(&active_index, &active_alias)];
        if let Some(backup_index) = &backup_index {
            actions.push(AliasAction::remove(backup_index, &backup_alias));
            actions.push(AliasAction::add(backup_index, &active_alias));
        }
        actions.push(AliasAction::add(&active_index, &backup_alias));

        self.store.update_aliases(actions).await.map_err(|e| {
            self.context.error(
                format!(
                    "Failed to swap indexes for the document type: {}",
                    document_type
                ),
                e,
            )
        })?;

        self.schema.invalidate(&backup_alias);
        self.schema.invalidate(&active_alias);

        info!(
            document_type = %document_type,
            active = backup_index.as_deref().unwrap_or("-"),
            backup = %active_index,
            "Swapped indexes"
        );
        Ok(())
    }

    /// Delete the index behind the backup alias of `document_type`.
    ///
    /// A missing backup index is not an error.
    #[instrument(skip(self))]
    pub async fn delete_backup_index(&self, document_type: &str) -> Result<(), SearchError> {
        validate_document_type(document_type)?;

        let backup_alias = self.alias_name(AliasKind::Backup, document_type);

        if let Some(index) = self.first_index_of(&backup_alias).await? {
            match self.store.delete_index(&[index.clone()]).await {
                Ok(()) => info!(index = %index, "Deleted backup index"),
                Err(e) if e.is_not_found() => debug!(index = %index, "Backup index already gone"),
                Err(e) => return Err(self.context.error("Failed to delete index", e)),
            }
        }

        self.schema.invalidate(&backup_alias);
        Ok(())
    }

    /// Delete stray indices behind the active alias of `document_type`.
    ///
    /// When the alias points at more than one index, the index holding the
    /// most recently indexed document is kept and every other one is
    /// deleted. Does nothing when disabled in the settings.
    #[instrument(skip(self))]
    pub async fn delete_duplicate_indexes(&self, document_type: &str) -> Result<(), SearchError> {
        if !self.settings.delete_duplicate_indexes {
            return Ok(());
        }

        let active_alias = self.alias_name(AliasKind::Active, document_type);
        let indices = self
            .store
            .get_alias_indices(&active_alias)
            .await
            .map_err(|e| self.context.error("Failed to resolve active alias", e))?;

        if indices.len() <= 1 {
            return Ok(());
        }

        let request = SearchRequest {
            sorting: vec![SortingField::descending(INDEXATION_DATE_FIELD_NAME)],
            take: 1,
            ..SearchRequest::default()
        };
        let body = self
            .query_builder
            .build_query(&request, &active_alias, &PropertySet::new());

        let response = self
            .store
            .search(&indices, body)
            .await
            .map_err(|e| self.context.error("Failed to find the latest index", e))?;

        let Some(latest) = latest_hit_index(&response) else {
            warn!(alias = %active_alias, "No documents to choose the latest index from");
            return Ok(());
        };

        let stale: Vec<String> = indices.into_iter().filter(|index| index != latest).collect();
        if stale.is_empty() {
            return Ok(());
        }

        warn!(
            alias = %active_alias,
            kept = %latest,
            deleted = ?stale,
            "Deleting duplicate indexes"
        );
        self.store
            .delete_index(&stale)
            .await
            .map_err(|e| self.context.error("Failed to delete duplicate indexes", e))
    }

    /// Attach the active alias to the default index of every document type
    /// that has no active alias yet. Failures are logged and skipped.
    pub async fn add_active_alias<I, S>(&self, document_types: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for document_type in document_types {
            let document_type = document_type.as_ref();
            if let Err(e) = self.attach_active_alias(document_type).await {
                error!(
                    document_type = %document_type,
                    error = %e,
                    "Error while putting an active alias on a default index"
                );
            }
        }
    }

    async fn attach_active_alias(&self, document_type: &str) -> Result<(), SearchError> {
        let active_alias = self.alias_name(AliasKind::Active, document_type);
        if self.index_exists(&active_alias).await? {
            return Ok(());
        }

        let default_index = self.naming.index_name(document_type);
        if self.index_exists(&default_index).await? {
            self.store
                .put_alias(&default_index, &active_alias)
                .await
                .map_err(|e| self.context.error("Failed to put alias", e))?;
            info!(index = %default_index, alias = %active_alias, "Attached active alias");
        }
        Ok(())
    }

    async fn first_index_of(&self, alias: &str) -> Result<Option<String>, SearchError> {
        let indices = self
            .store
            .get_alias_indices(alias)
            .await
            .map_err(|e| self.context.error(format!("Failed to resolve alias {}", alias), e))?;
        Ok(indices.into_iter().next())
    }
}

pub(crate) fn validate_document_type(document_type: &str) -> Result<(), SearchError> {
    if document_type.trim().is_empty() {
        return Err(SearchError::invalid_argument("document_type is required"));
    }
    Ok(())
}

fn latest_hit_index(response: &Value) -> Option<&str> {
    response
        .pointer("/hits/hits/0/_index")
        .and_then(Value::as_str)
        .filter(|index| !index.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::memory::MemoryStore;
    use crate::query::SimpleQueryBuilder;
    use crate::types::BulkOperation;
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        lifecycle: IndexLifecycle,
    }

    fn fixture(settings: IndexingSettings) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let schema = Arc::new(SchemaRegistry::new(store.clone()));
        let config = ProviderConfig::new("localhost").with_scope("test");
        let lifecycle = IndexLifecycle::new(
            store.clone(),
            schema,
            Arc::new(SimpleQueryBuilder::new()),
            IndexNaming::new(&config),
            settings,
            StoreContext::new("http://localhost/", "test"),
        );
        Fixture { store, lifecycle }
    }

    async fn index_doc(store: &MemoryStore, index: &str, id: &str, date: &str) {
        store
            .bulk(
                index,
                vec![BulkOperation::Index {
                    id: id.to_string(),
                    source: json!({ "indexationdate": date }),
                }],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_swap_bootstraps_default_index() {
        let f = fixture(IndexingSettings::default());

        f.lifecycle.swap_index("Product").await.unwrap();

        assert_eq!(
            f.store.get_alias_indices("test-product-backup").await.unwrap(),
            vec!["test-product".to_string()]
        );
        assert!(f
            .store
            .get_alias_indices("test-product-active")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_swap_is_self_inverse() {
        let f = fixture(IndexingSettings::default());
        f.lifecycle
            .create_index("test-product-a", "test-product-active")
            .await
            .unwrap();
        f.lifecycle
            .create_index("test-product-b", "test-product-backup")
            .await
            .unwrap();

        f.lifecycle.swap_index("Product").await.unwrap();
        assert_eq!(
            f.store.get_alias_indices("test-product-active").await.unwrap(),
            vec!["test-product-b".to_string()]
        );
        assert_eq!(
            f.store.get_alias_indices("test-product-backup").await.unwrap(),
            vec!["test-product-a".to_string()]
        );

        f.lifecycle.swap_index("Product").await.unwrap();
        assert_eq!(
            f.store.get_alias_indices("test-product-active").await.unwrap(),
            vec!["test-product-a".to_string()]
        );
        assert_eq!(
            f.store.get_alias_indices("test-product-backup").await.unwrap(),
            vec!["test-product-b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_backup_index_is_idempotent() {
        let f = fixture(IndexingSettings::default());
        f.lifecycle
            .create_index("test-product-b", "test-product-backup")
            .await
            .unwrap();

        f.lifecycle.delete_backup_index("Product").await.unwrap();
        assert!(!f.store.index_exists("test-product-b").await.unwrap());

        f.lifecycle.delete_backup_index("Product").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_duplicate_indexes_keeps_latest() {
        let f = fixture(IndexingSettings::default());
        f.lifecycle
            .create_index("test-product-old", "test-product-active")
            .await
            .unwrap();
        f.lifecycle
            .create_index("test-product-new", "test-product-active")
            .await
            .unwrap();
        index_doc(&f.store, "test-product-old", "1", "2024-01-01T00:00:00.000Z").await;
        index_doc(&f.store, "test-product-new", "2", "2024-06-01T00:00:00.000Z").await;

        f.lifecycle.delete_duplicate_indexes("Product").await.unwrap();

        assert_eq!(
            f.store.get_alias_indices("test-product-active").await.unwrap(),
            vec!["test-product-new".to_string()]
        );
        assert!(!f.store.index_exists("test-product-old").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_duplicate_indexes_disabled() {
        let f = fixture(IndexingSettings {
            delete_duplicate_indexes: false,
            ..IndexingSettings::default()
        });
        f.lifecycle
            .create_index("test-product-old", "test-product-active")
            .await
            .unwrap();
        f.lifecycle
            .create_index("test-product-new", "test-product-active")
            .await
            .unwrap();
        index_doc(&f.store, "test-product-new", "2", "2024-06-01T00:00:00.000Z").await;

        f.lifecycle.delete_duplicate_indexes("Product").await.unwrap();

        assert_eq!(
            f.store
                .get_alias_indices("test-product-active")
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_add_active_alias_attaches_to_default_index() {
        let f = fixture(IndexingSettings::default());
        f.store
            .create_index("test-member", json!({}))
            .await
            .unwrap();

        f.lifecycle.add_active_alias(["Member", "Product"]).await;

        assert_eq!(
            f.store.get_alias_indices("test-member-active").await.unwrap(),
            vec!["test-member".to_string()]
        );
        assert!(!f.store.index_exists("test-product-active").await.unwrap());
    }

    #[tokio::test]
    async fn test_swap_requires_document_type() {
        let f = fixture(IndexingSettings::default());
        assert!(matches!(
            f.lifecycle.swap_index(" ").await,
            Err(SearchError::InvalidArgument(_))
        ));
    }
}
