//! OpenSearch store implementation.
//!
//! This module provides the concrete implementation of `SearchStore` using
//! the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetAliasParts,
        IndicesGetMappingParts, IndicesPutAliasParts, IndicesPutMappingParts,
        IndicesRefreshParts,
    },
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

use crate::config::ProviderConfig;
use crate::errors::{SearchError, StoreError};
use crate::interfaces::SearchStore;
use crate::schema::PropertySet;
use crate::types::{AliasAction, BulkOperation, BulkResponse};

/// OpenSearch store implementation.
///
/// Talks to a single node with the configured credentials and request
/// timeout. Elasticsearch clusters speak the same API for every call made
/// here.
///
/// # Example
///
/// ```ignore
/// use search_provider_repository::{OpenSearchStore, ProviderConfig, SearchProvider};
///
/// let config = ProviderConfig::new("localhost:9200").with_scope("catalog");
/// let store = OpenSearchStore::new(&config)?;
/// let provider = SearchProvider::new(config, Arc::new(store))?;
/// ```
pub struct OpenSearchStore {
    client: OpenSearch,
}

impl OpenSearchStore {
    /// Create a store connected to the server of `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Server address, credentials and request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchStore)` - A new store instance
    /// * `Err(SearchError)` - If the address is invalid or the transport
    ///   cannot be built
    pub fn new(config: &ProviderConfig) -> Result<Self, SearchError> {
        let url = config.server_url()?;

        let conn_pool = SingleNodeConnectionPool::new(url.clone());
        let mut builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(config.request_timeout);
        if let Some((user, key)) = config.credentials() {
            builder = builder.auth(Credentials::Basic(user, key));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchError::configuration(format!("Failed to build transport: {}", e)))?;

        info!(url = %url, "Created OpenSearch store");

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }
}

/// Check the response status: 404 becomes [`StoreError::NotFound`], any
/// other failure [`StoreError::InvalidResponse`] with the response body.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status.as_u16() == 404 {
        debug!(body = %body, "Store resource not found");
        return Err(StoreError::not_found(body));
    }
    error!(status = %status, body = %body, "Store request failed");
    Err(StoreError::invalid_response(status.as_u16(), body))
}

async fn json_body(response: Response) -> Result<Value, StoreError> {
    check(response)
        .await?
        .json::<Value>()
        .await
        .map_err(|e| StoreError::parse(e.to_string()))
}

/// Properties of every index in a get-mapping response, merged.
fn merge_mappings(body: &Value) -> Result<PropertySet, StoreError> {
    let mut merged = PropertySet::new();
    if let Some(indices) = body.as_object() {
        for index in indices.values() {
            if let Some(mappings) = index.get("mappings") {
                merged.merge_missing(&PropertySet::from_mapping(mappings)?);
            }
        }
    }
    Ok(merged)
}

/// Indices of a get-alias response, in response order.
fn alias_indices(body: &Value) -> Vec<String> {
    body.as_object()
        .map(|indices| indices.keys().cloned().collect())
        .unwrap_or_default()
}

#[async_trait]
impl SearchStore for OpenSearchStore {
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await?;

        match response.status_code().as_u16() {
            404 => Ok(false),
            _ => check(response).await.map(|_| true),
        }
    }

    #[instrument(skip(self, body))]
    async fn create_index(&self, index: &str, body: Value) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    async fn get_mapping(&self, index: &str) -> Result<Option<PropertySet>, StoreError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[index]))
            .send()
            .await?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }
        let body = json_body(response).await?;
        merge_mappings(&body).map(Some)
    }

    #[instrument(skip(self, properties), fields(count = properties.len()))]
    async fn put_mapping(&self, index: &str, properties: &PropertySet) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(properties.to_mapping())
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    async fn get_alias_indices(&self, alias: &str) -> Result<Vec<String>, StoreError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        Ok(alias_indices(&json_body(response).await?))
    }

    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(&[index], alias))
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    #[instrument(skip(self, actions), fields(count = actions.len()))]
    async fn update_aliases(&self, actions: Vec<AliasAction>) -> Result<(), StoreError> {
        let actions: Vec<Value> = actions.iter().map(AliasAction::to_json).collect();
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, indices: &[String]) -> Result<(), StoreError> {
        let names: Vec<&str> = indices.iter().map(String::as_str).collect();
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&names))
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    #[instrument(skip(self, operations), fields(count = operations.len()))]
    async fn bulk(
        &self,
        index: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<BulkResponse, StoreError> {
        let body: Vec<JsonBody<Value>> = operations
            .iter()
            .flat_map(BulkOperation::to_lines)
            .map(JsonBody::from)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await?;

        let body = json_body(response).await?;
        Ok(BulkResponse::from_body(&body))
    }

    async fn refresh(&self, index: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await?;

        check(response).await.map(|_| ())
    }

    #[instrument(skip(self, body))]
    async fn search(&self, indices: &[String], body: Value) -> Result<Value, StoreError> {
        let names: Vec<&str> = indices.iter().map(String::as_str).collect();
        let response = self
            .client
            .search(SearchParts::Index(&names))
            .body(body)
            .send()
            .await?;

        json_body(response).await
    }

    async fn ping(&self, timeout: Duration) -> Result<bool, StoreError> {
        let response = self
            .client
            .ping()
            .request_timeout(timeout)
            .send()
            .await?;

        Ok(response.status_code().is_success())
    }
}
