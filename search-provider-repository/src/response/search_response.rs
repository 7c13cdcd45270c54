//! Search response parsing.

use serde_json::Value;

use search_provider_shared::{SearchDocument, SearchRequest, SearchResponse};

use crate::response::build_aggregations;

/// Convert a raw search response.
///
/// The total is read from `hits.total.value`, or from `hits.total` when
/// the store reports a bare number.
pub fn parse_search_response(raw: &Value, request: &SearchRequest) -> SearchResponse {
    let hits = raw.get("hits");

    let total_count = hits
        .and_then(|hits| hits.get("total"))
        .and_then(|total| total.get("value").unwrap_or(total).as_u64())
        .unwrap_or(0);

    let documents = hits
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
        .map(|hits| hits.iter().filter_map(parse_hit).collect())
        .unwrap_or_default();

    let aggregations = raw
        .get("aggregations")
        .map(|aggregations| build_aggregations(aggregations, &request.aggregations))
        .unwrap_or_default();

    SearchResponse {
        total_count,
        documents,
        aggregations,
    }
}

fn parse_hit(hit: &Value) -> Option<SearchDocument> {
    let id = hit.get("_id")?.as_str()?;
    let mut document = SearchDocument::new(id);
    if let Some(Value::Object(source)) = hit.get("_source") {
        document.fields = source.clone();
    }
    Some(document)
}
