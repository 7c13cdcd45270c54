//! Query builder trait definition.

use serde_json::Value;

use search_provider_shared::SearchRequest;

use crate::schema::PropertySet;

/// Translates a [`SearchRequest`] into a native store query.
///
/// Implementations must name aggregations by
/// [`AggregationRequest::response_id`](search_provider_shared::AggregationRequest::response_id),
/// and range values by `"{response_id}-{value id lower-cased}"`, so that the
/// response can be reconstructed.
pub trait QueryBuilder: Send + Sync {
    /// Build the query body.
    ///
    /// # Arguments
    ///
    /// * `request` - The search parameters
    /// * `index_alias` - The alias the query runs against
    /// * `known` - The properties currently mapped under the alias
    fn build_query(&self, request: &SearchRequest, index_alias: &str, known: &PropertySet)
        -> Value;
}
