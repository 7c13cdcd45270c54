//! Query bodies for searches and suggestions.
//!
//! This module provides [`SimpleQueryBuilder`], which matches every
//! document and attaches sorting, paging and aggregations, plus the
//! completion-suggester body used by suggestion calls.

use serde_json::{json, Map, Value};

use search_provider_shared::{
    AggregationRequest, RangeAggregationRequest, RangeAggregationValue, SearchRequest,
    SortingField, SuggestionRequest, TermAggregationRequest,
};

use crate::document::normalize_field_name;
use crate::interfaces::QueryBuilder;
use crate::schema::{PropertySet, COMPLETION_SUB_FIELD, RAW_SUB_FIELD};

/// Builds match-all queries with sorting, paging and aggregations.
#[derive(Debug, Clone, Default)]
pub struct SimpleQueryBuilder;

impl SimpleQueryBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl QueryBuilder for SimpleQueryBuilder {
    fn build_query(&self, request: &SearchRequest, _index_alias: &str, known: &PropertySet) -> Value {
        let mut body = json!({
            "query": { "match_all": {} },
            "from": request.skip,
            "size": request.take,
        });

        if !request.sorting.is_empty() {
            body["sort"] = Value::Array(
                request
                    .sorting
                    .iter()
                    .map(|sorting| sort_clause(sorting, known))
                    .collect(),
            );
        }

        let aggregations = build_aggregations(&request.aggregations, known);
        if !aggregations.is_empty() {
            body["aggs"] = Value::Object(aggregations);
        }

        body
    }
}

/// Completion-suggester body for `request`.
///
/// Each field is queried through its `completion` sub-field, under its
/// store field name.
pub fn build_suggest_query(request: &SuggestionRequest) -> Value {
    let suggest: Map<String, Value> = request
        .fields
        .iter()
        .map(|field| {
            let name = normalize_field_name(field);
            let clause = json!({
                "prefix": request.query,
                "completion": {
                    "field": format!("{}.{}", name, COMPLETION_SUB_FIELD),
                    "skip_duplicates": true,
                    "size": request.size,
                }
            });
            (name, clause)
        })
        .collect();

    json!({
        "_source": false,
        "suggest": suggest,
    })
}

fn sort_clause(sorting: &SortingField, known: &PropertySet) -> Value {
    let field = normalize_field_name(&sorting.field_name);
    let order = if sorting.is_descending { "desc" } else { "asc" };

    // Sorting on a field no index has mapped yet must not fail the search.
    let clause = if known.contains(&field) {
        json!({ "order": order })
    } else {
        json!({ "order": order, "unmapped_type": "keyword" })
    };

    json!({ (field): clause })
}

fn build_aggregations(requests: &[AggregationRequest], known: &PropertySet) -> Map<String, Value> {
    let mut aggregations = Map::new();

    for request in requests {
        let response_id = request.response_id();
        match request {
            AggregationRequest::Term(term) => {
                aggregations.insert(response_id, term_aggregation(term, known));
            }
            AggregationRequest::Range(range) => {
                for value in &range.values {
                    aggregations.insert(
                        range_value_key(&response_id, &value.id),
                        range_aggregation(range, value),
                    );
                }
            }
        }
    }

    aggregations
}

/// Name under which one value of a range aggregation is requested.
pub fn range_value_key(response_id: &str, value_id: &str) -> String {
    format!("{}-{}", response_id, value_id.to_lowercase())
}

fn term_aggregation(request: &TermAggregationRequest, known: &PropertySet) -> Value {
    let mut terms = json!({ "field": aggregated_field(&request.field_name, known) });
    if let Some(size) = request.size {
        terms["size"] = json!(size);
    }
    json!({ "terms": terms })
}

/// Keyword fields are normalized to lower case; their `raw` sub-field keeps
/// the indexed spelling for bucket keys.
fn aggregated_field(field_name: &str, known: &PropertySet) -> String {
    let field = normalize_field_name(field_name);
    match known.get(&field) {
        Some(property) if property.is_keyword() && property.has_field(RAW_SUB_FIELD) => {
            format!("{}.{}", field, RAW_SUB_FIELD)
        }
        _ => field,
    }
}

fn range_aggregation(request: &RangeAggregationRequest, value: &RangeAggregationValue) -> Value {
    let mut bounds = Map::new();
    if let Some(lower) = &value.lower {
        let op = if value.include_lower { "gte" } else { "gt" };
        bounds.insert(op.to_string(), Value::String(lower.clone()));
    }
    if let Some(upper) = &value.upper {
        let op = if value.include_upper { "lte" } else { "lt" };
        bounds.insert(op.to_string(), Value::String(upper.clone()));
    }

    let field = normalize_field_name(&request.field_name);
    json!({
        "filter": {
            "range": { (field): bounds }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Property;

    fn known_color() -> PropertySet {
        [(
            "color".to_string(),
            Property::keyword().with_field(RAW_SUB_FIELD, Property::keyword()),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_paging_and_sorting() {
        let request = SearchRequest {
            sorting: vec![SortingField::descending("Color"), SortingField::ascending("Name")],
            skip: 10,
            take: 5,
            ..SearchRequest::default()
        };

        let body = SimpleQueryBuilder::new().build_query(&request, "alias", &known_color());

        assert_eq!(body["from"], 10);
        assert_eq!(body["size"], 5);
        assert_eq!(body["sort"][0], json!({ "color": { "order": "desc" } }));
        assert_eq!(
            body["sort"][1],
            json!({ "name": { "order": "asc", "unmapped_type": "keyword" } })
        );
        assert!(body.get("aggs").is_none());
    }

    #[test]
    fn test_term_aggregation_uses_raw_sub_field() {
        let request = SearchRequest {
            aggregations: vec![
                AggregationRequest::term("Color"),
                AggregationRequest::Term(TermAggregationRequest {
                    id: Some("Sizes".to_string()),
                    field_name: "Size".to_string(),
                    size: Some(50),
                }),
            ],
            ..SearchRequest::default()
        };

        let body = SimpleQueryBuilder::new().build_query(&request, "alias", &known_color());

        assert_eq!(body["aggs"]["color"], json!({ "terms": { "field": "color.raw" } }));
        assert_eq!(
            body["aggs"]["sizes"],
            json!({ "terms": { "field": "size", "size": 50 } })
        );
    }

    #[test]
    fn test_range_aggregation_per_value() {
        let request = SearchRequest {
            aggregations: vec![AggregationRequest::Range(RangeAggregationRequest {
                id: None,
                field_name: "Price".to_string(),
                values: vec![
                    RangeAggregationValue {
                        id: "Under100".to_string(),
                        upper: Some("100".to_string()),
                        ..Default::default()
                    },
                    RangeAggregationValue {
                        id: "100To200".to_string(),
                        lower: Some("100".to_string()),
                        upper: Some("200".to_string()),
                        include_lower: true,
                        include_upper: false,
                    },
                ],
            })],
            ..SearchRequest::default()
        };

        let body = SimpleQueryBuilder::new().build_query(&request, "alias", &PropertySet::new());

        assert_eq!(
            body["aggs"]["price-under100"],
            json!({ "filter": { "range": { "price": { "lt": "100" } } } })
        );
        assert_eq!(
            body["aggs"]["price-100to200"],
            json!({ "filter": { "range": { "price": { "gte": "100", "lt": "200" } } } })
        );
    }

    #[test]
    fn test_suggest_query() {
        let request = SuggestionRequest {
            query: "bo".to_string(),
            fields: vec!["Name".to_string(), "Brand".to_string()],
            size: 3,
            use_backup_index: false,
        };

        let body = build_suggest_query(&request);

        assert_eq!(body["_source"], false);
        assert_eq!(
            body["suggest"]["name"],
            json!({
                "prefix": "bo",
                "completion": { "field": "name.completion", "skip_duplicates": true, "size": 3 }
            })
        );
        assert!(body["suggest"]["brand"].is_object());
    }
}
