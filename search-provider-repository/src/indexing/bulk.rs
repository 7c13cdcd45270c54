//! Bulk indexing pipeline.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use search_provider_shared::{
    IndexDocument, IndexingParameters, IndexingResult, IndexingResultItem, SearchDocument,
};

use crate::document::DocumentAdapter;
use crate::errors::{SearchError, StoreContext};
use crate::interfaces::SearchStore;
use crate::lifecycle::{validate_document_type, AliasKind, IndexLifecycle};
use crate::schema::{PropertySet, SchemaRegistry};
use crate::types::{BulkItem, BulkOperation};

/// Id of the result item reported when a whole bulk request fails.
pub const BATCH_FAILURE_ITEM_ID: &str = "Elasticsearch Server";

/// Position of an input document in the result list.
enum Slot {
    Submitted,
    Rejected(IndexingResultItem),
}

/// Writes batches of documents through one bulk request each.
///
/// Every call prepares the target index first: duplicate indices are
/// cleaned up, the index is created when missing, and newly discovered
/// properties are registered before any document is written.
pub struct BulkIndexer {
    store: Arc<dyn SearchStore>,
    schema: Arc<SchemaRegistry>,
    lifecycle: Arc<IndexLifecycle>,
    adapter: DocumentAdapter,
    context: StoreContext,
}

impl BulkIndexer {
    pub fn new(
        store: Arc<dyn SearchStore>,
        schema: Arc<SchemaRegistry>,
        lifecycle: Arc<IndexLifecycle>,
        adapter: DocumentAdapter,
        context: StoreContext,
    ) -> Self {
        Self {
            store,
            schema,
            lifecycle,
            adapter,
            context,
        }
    }

    /// Index or replace `documents` through the active alias.
    pub async fn index(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        self.index_with(document_type, documents, IndexingParameters::default())
            .await
    }

    /// Merge `documents` into existing documents of the active alias.
    pub async fn index_partial(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        self.index_with(document_type, documents, IndexingParameters::partial_update())
            .await
    }

    /// Index `documents` through the backup alias, for a full reindex.
    pub async fn index_with_backup(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        self.index_with(document_type, documents, IndexingParameters::reindex())
            .await
    }

    /// Delete documents by id from the active alias.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn remove(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
    ) -> Result<IndexingResult, SearchError> {
        validate_document_type(document_type)?;

        let alias = self.lifecycle.alias_name(AliasKind::Active, document_type);
        let operations: Vec<BulkOperation> = documents
            .iter()
            .map(|document| BulkOperation::Delete {
                id: document.id.clone(),
            })
            .collect();

        let slots = documents.iter().map(|_| Slot::Submitted).collect();
        let result = self.submit(&alias, operations, slots).await;
        info!(
            alias = %alias,
            succeeded = result.succeeded_count(),
            failed = result.failed_count(),
            "Removed documents"
        );
        Ok(result)
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn index_with(
        &self,
        document_type: &str,
        documents: &[IndexDocument],
        parameters: IndexingParameters,
    ) -> Result<IndexingResult, SearchError> {
        validate_document_type(document_type)?;

        self.lifecycle.delete_duplicate_indexes(document_type).await?;

        let alias = self
            .lifecycle
            .alias_name(AliasKind::select(parameters.reindex), document_type);
        let known = self
            .schema
            .get_mapping(&alias)
            .await
            .map_err(|e| self.context.error("Failed to load mapping", e))?;

        let (converted, slots, discovered) = self.convert(documents, &known);

        let created = self.lifecycle.ensure_index(document_type, &alias).await?;
        if created {
            self.schema.invalidate(&alias);
            let mut all = (*known).clone();
            all.merge_missing(&discovered);
            self.register(&alias, &all).await?;
        } else if !parameters.partial_update && !discovered.is_empty() {
            self.register(&alias, &discovered).await?;
        }

        let operations = converted
            .into_iter()
            .map(|document| {
                if parameters.partial_update {
                    BulkOperation::Update {
                        id: document.id.clone(),
                        doc: document.to_source(),
                    }
                } else {
                    BulkOperation::Index {
                        id: document.id.clone(),
                        source: document.to_source(),
                    }
                }
            })
            .collect();

        let result = self.submit(&alias, operations, slots).await;
        info!(
            alias = %alias,
            reindex = parameters.reindex,
            partial = parameters.partial_update,
            succeeded = result.succeeded_count(),
            failed = result.failed_count(),
            "Indexed documents"
        );
        Ok(result)
    }

    /// Convert every document, collecting the properties discovered across
    /// the batch. Documents that fail conversion become rejected slots and
    /// contribute no properties.
    fn convert(
        &self,
        documents: &[IndexDocument],
        known: &PropertySet,
    ) -> (Vec<SearchDocument>, Vec<Slot>, PropertySet) {
        let mut working = known.clone();
        let mut discovered = PropertySet::new();
        let mut converted = Vec::with_capacity(documents.len());
        let mut slots = Vec::with_capacity(documents.len());

        for document in documents {
            match self.adapter.to_provider_document(document, &working) {
                Ok(adapted) => {
                    working.merge_missing(&adapted.discovered);
                    discovered.merge_missing(&adapted.discovered);
                    converted.push(adapted.document);
                    slots.push(Slot::Submitted);
                }
                Err(e) => {
                    warn!(id = %document.id, error = %e, "Failed to convert document");
                    slots.push(Slot::Rejected(IndexingResultItem::failed(
                        &document.id,
                        e.to_string(),
                    )));
                }
            }
        }

        (converted, slots, discovered)
    }

    async fn register(&self, alias: &str, properties: &PropertySet) -> Result<(), SearchError> {
        self.schema
            .apply_new_properties(alias, properties)
            .await
            .map_err(|e| self.context.error("Failed to submit mapping", e))
    }

    /// Send one bulk request and refresh the alias.
    ///
    /// `slots` holds one entry per input document, in input order.
    async fn submit(
        &self,
        alias: &str,
        operations: Vec<BulkOperation>,
        slots: Vec<Slot>,
    ) -> IndexingResult {
        if operations.is_empty() {
            return IndexingResult::new(slots.into_iter().filter_map(Slot::rejected).collect());
        }

        let submitted: Vec<String> = operations.iter().map(|op| op.id().to_string()).collect();
        let response = self.store.bulk(alias, operations).await;

        if let Err(e) = self.store.refresh(alias).await {
            warn!(alias = %alias, error = %e, "Failed to refresh index");
        }

        match response {
            Ok(response) => {
                debug!(alias = %alias, items = response.items.len(), "Bulk request completed");
                IndexingResult::new(merge_items(slots, submitted, response.items))
            }
            Err(e) => {
                warn!(alias = %alias, error = %e, "Bulk request failed");
                let mut items = vec![IndexingResultItem::failed(BATCH_FAILURE_ITEM_ID, e.to_string())];
                items.extend(slots.into_iter().filter_map(Slot::rejected));
                IndexingResult::new(items)
            }
        }
    }
}

impl Slot {
    fn rejected(self) -> Option<IndexingResultItem> {
        match self {
            Self::Rejected(item) => Some(item),
            Self::Submitted => None,
        }
    }
}

/// Interleave bulk items with rejected documents in input order.
fn merge_items(
    slots: Vec<Slot>,
    submitted: Vec<String>,
    bulk_items: Vec<BulkItem>,
) -> Vec<IndexingResultItem> {
    let mut bulk_items = bulk_items.into_iter();
    let mut submitted = submitted.into_iter();

    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Rejected(item) => item,
            Slot::Submitted => {
                let id = submitted.next().unwrap_or_default();
                match bulk_items.next() {
                    Some(item) if item.succeeded => IndexingResultItem::succeeded(id),
                    Some(item) => IndexingResultItem::failed(
                        id,
                        item.error.unwrap_or_else(|| "Unknown error".to_string()),
                    ),
                    None => IndexingResultItem::failed(id, "No response for document"),
                }
            }
        })
        .collect()
}
