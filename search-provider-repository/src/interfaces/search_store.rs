//! Document store trait definition.
//!
//! This module defines the abstract interface over an index-and-alias
//! document store, allowing for different backend implementations
//! (OpenSearch, Elasticsearch, in-memory).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use crate::schema::PropertySet;
use crate::types::{AliasAction, BulkOperation, BulkResponse};

/// Abstract interface for the document store.
///
/// Every method is one round trip. Index arguments accept either a physical
/// index name or an alias, as the store API does.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, StoreError>`. Missing indices are reported
/// as [`StoreError::NotFound`] where the caller may want to tolerate them.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Check whether an index or alias exists.
    ///
    /// # Arguments
    ///
    /// * `index` - Physical index name or alias
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index or alias exists
    /// * `Ok(false)` - If it does not
    /// * `Err(StoreError)` - If the request fails
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError>;

    /// Create a physical index.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the new index
    /// * `body` - Settings, mappings and aliases of the new index
    async fn create_index(&self, index: &str, body: Value) -> Result<(), StoreError>;

    /// Get the top-level properties of an index mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(PropertySet))` - The known properties
    /// * `Ok(None)` - If the index does not exist
    /// * `Err(StoreError)` - If the request fails
    async fn get_mapping(&self, index: &str) -> Result<Option<PropertySet>, StoreError>;

    /// Add properties to an index mapping.
    ///
    /// Only new names should be submitted: the store rejects a changed type
    /// for an existing property.
    async fn put_mapping(&self, index: &str, properties: &PropertySet) -> Result<(), StoreError>;

    /// Resolve an alias to the physical indices it points at.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - The index names, empty when the alias is missing
    /// * `Err(StoreError)` - If the request fails
    async fn get_alias_indices(&self, alias: &str) -> Result<Vec<String>, StoreError>;

    /// Attach `alias` to `index`.
    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), StoreError>;

    /// Apply alias actions atomically: either all of them or none.
    async fn update_aliases(&self, actions: Vec<AliasAction>) -> Result<(), StoreError>;

    /// Delete physical indices.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the indices were deleted
    /// * `Err(StoreError::NotFound)` - If one of them does not exist
    /// * `Err(StoreError)` - If the request fails
    async fn delete_index(&self, indices: &[String]) -> Result<(), StoreError>;

    /// Submit one bulk request against `index`.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkResponse)` - One item per operation, in request order
    /// * `Err(StoreError)` - If the request as a whole was rejected
    async fn bulk(
        &self,
        index: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<BulkResponse, StoreError>;

    /// Make recent writes to `index` visible to search.
    async fn refresh(&self, index: &str) -> Result<(), StoreError>;

    /// Run a native query across `indices` and return the raw response body.
    async fn search(&self, indices: &[String], body: Value) -> Result<Value, StoreError>;

    /// Check that the store is reachable within `timeout`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the store answered successfully
    /// * `Ok(false)` - If it answered with an error status
    /// * `Err(StoreError)` - If the ping could not be sent or timed out
    async fn ping(&self, timeout: Duration) -> Result<bool, StoreError>;
}
