//! Provider scenarios against the in-memory store.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;

use search_provider_repository::{MemoryStore, ProviderConfig, SearchProvider, SearchStore};
use search_provider_shared::{
    AggregationRequest, FieldValue, FieldValueType, IndexDocument, IndexDocumentField,
    SearchRequest,
};

const ACTIVE: &str = "catalog-product-active";
const BACKUP: &str = "catalog-product-backup";

fn provider() -> (Arc<MemoryStore>, Arc<SearchProvider>) {
    let store = Arc::new(MemoryStore::new());
    let config = ProviderConfig::new("localhost:9200").with_scope("Catalog");
    let provider = SearchProvider::new(config, store.clone()).unwrap();
    (store, Arc::new(provider))
}

fn product(id: &str, color: &str, version: i32) -> IndexDocument {
    let mut document = IndexDocument::new(id);
    document
        .add_filterable_string("Color", color)
        .add_filterable_integer("Version", version);
    document
}

async fn ids(provider: &SearchProvider, use_backup_index: bool) -> Vec<String> {
    let request = SearchRequest {
        take: 100,
        use_backup_index,
        ..SearchRequest::default()
    };
    let mut ids: Vec<String> = provider
        .search("Product", &request)
        .await
        .unwrap()
        .documents
        .into_iter()
        .map(|document| document.id)
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn color_aggregation_counts_each_value() {
    let (_, provider) = provider();
    let documents = [
        ("1", "Red"),
        ("2", "Red"),
        ("3", "Black"),
        ("4", "Silver"),
        ("5", "Red"),
    ]
    .map(|(id, color)| product(id, color, 1));
    provider.index("Product", &documents).await.unwrap();

    let request = SearchRequest {
        take: 0,
        aggregations: vec![AggregationRequest::term("Color")],
        ..SearchRequest::default()
    };
    let response = provider.search("Product", &request).await.unwrap();

    assert_eq!(response.total_count, 5);
    assert!(response.documents.is_empty());
    let colors = response.aggregation("color").unwrap();
    assert_eq!(colors.values.len(), 3);
    assert_eq!(colors.count_of("Red"), 3);
    assert_eq!(colors.count_of("Black"), 1);
    assert_eq!(colors.count_of("Silver"), 1);
}

#[tokio::test]
async fn one_bad_document_fails_alone() {
    let (store, provider) = provider();
    let mut documents: Vec<IndexDocument> =
        (1..=5).map(|i| product(&i.to_string(), "Red", 1)).collect();
    documents[3].add(IndexDocumentField::new(
        "Payload",
        FieldValue::Json(json!({ "nested": [1, 2] })),
        FieldValueType::Undefined,
    ));

    let result = provider.index("Product", &documents).await.unwrap();

    assert_eq!(result.items.len(), 5);
    assert_eq!(result.succeeded_count(), 4);
    let failed: Vec<&str> = result.failed_items().map(|item| item.id.as_str()).collect();
    assert_eq!(failed, vec!["4"]);
    assert_eq!(store.document_count(ACTIVE), 4);
}

#[tokio::test]
async fn reindex_twice_then_swap() {
    let (store, provider) = provider();
    provider
        .index("Product", &[product("1", "Red", 1), product("2", "Red", 1)])
        .await
        .unwrap();

    let rebuilt = [product("1", "Black", 2), product("3", "Black", 2)];
    provider.index_with_backup("Product", &rebuilt).await.unwrap();
    provider.index_with_backup("Product", &rebuilt).await.unwrap();

    assert_eq!(ids(&provider, false).await, vec!["1", "2"]);
    assert_eq!(store.document_count(BACKUP), 2);

    provider.swap_index("Product").await.unwrap();

    assert_eq!(ids(&provider, false).await, vec!["1", "3"]);
    assert_eq!(ids(&provider, true).await, vec!["1", "2"]);
    assert_eq!(store.document(ACTIVE, "1").unwrap()["version"], 2);

    provider.delete_index("Product").await.unwrap();
    assert!(!store.index_exists(BACKUP).await.unwrap());
    assert_eq!(ids(&provider, false).await, vec!["1", "3"]);
}

#[tokio::test]
async fn swapping_twice_restores_aliases() {
    let (store, provider) = provider();
    provider.index("Product", &[product("1", "Red", 1)]).await.unwrap();
    provider
        .index_with_backup("Product", &[product("2", "Red", 2)])
        .await
        .unwrap();
    let active = store.get_alias_indices(ACTIVE).await.unwrap();
    let backup = store.get_alias_indices(BACKUP).await.unwrap();

    provider.swap_index("Product").await.unwrap();
    assert_eq!(store.get_alias_indices(ACTIVE).await.unwrap(), backup);
    assert_eq!(store.get_alias_indices(BACKUP).await.unwrap(), active);

    provider.swap_index("Product").await.unwrap();
    assert_eq!(store.get_alias_indices(ACTIVE).await.unwrap(), active);
    assert_eq!(store.get_alias_indices(BACKUP).await.unwrap(), backup);
}

#[tokio::test]
async fn deleting_the_backup_twice_succeeds() {
    let (store, provider) = provider();
    provider
        .index_with_backup("Product", &[product("1", "Red", 1)])
        .await
        .unwrap();

    provider.delete_index("Product").await.unwrap();
    provider.delete_index("Product").await.unwrap();

    assert!(!store.index_exists(BACKUP).await.unwrap());
}

#[tokio::test]
async fn concurrent_batches_register_a_field_once() {
    let (store, provider) = provider();
    provider.index("Product", &[product("0", "Red", 1)]).await.unwrap();

    let tasks = (1..=8).map(|i| {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            let mut document = product(&i.to_string(), "Red", 1);
            document.add_filterable_string("Brand", "Acme");
            provider.index("Product", &[document]).await
        })
    });
    for result in join_all(tasks).await {
        assert!(result.unwrap().unwrap().is_success());
    }

    let registrations = store
        .put_mapping_calls()
        .into_iter()
        .filter(|properties| properties.contains("brand"))
        .count();
    assert_eq!(registrations, 1);
    assert_eq!(store.document_count(ACTIVE), 9);
}

#[tokio::test]
async fn removed_documents_disappear_from_search() {
    let (_, provider) = provider();
    provider
        .index("Product", &[product("1", "Red", 1), product("2", "Red", 1)])
        .await
        .unwrap();

    let result = provider
        .remove("Product", &[IndexDocument::new("2"), IndexDocument::new("9")])
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(ids(&provider, false).await, vec!["1"]);
}
