//! Aggregation response reconstruction.

use serde_json::Value;

use search_provider_shared::{
    AggregationRequest, AggregationResponse, AggregationResponseValue, RangeAggregationRequest,
};

use crate::query::range_value_key;

/// Rebuild the requested aggregations from the raw `aggregations` object of
/// a search response.
///
/// Only values with a positive count are reported, and aggregations left
/// without values are omitted.
pub fn build_aggregations(
    raw: &Value,
    requests: &[AggregationRequest],
) -> Vec<AggregationResponse> {
    requests
        .iter()
        .filter_map(|request| {
            let id = request.response_id();
            let values = match request {
                AggregationRequest::Term(_) => term_values(raw, &id),
                AggregationRequest::Range(range) => range_values(raw, &id, range),
            };
            (!values.is_empty()).then_some(AggregationResponse { id, values })
        })
        .collect()
}

fn term_values(raw: &Value, id: &str) -> Vec<AggregationResponseValue> {
    aggregate_values(raw, id, id)
}

fn range_values(
    raw: &Value,
    id: &str,
    request: &RangeAggregationRequest,
) -> Vec<AggregationResponseValue> {
    request
        .values
        .iter()
        .flat_map(|value| {
            let value_id = value.id.to_lowercase();
            aggregate_values(raw, &range_value_key(id, &value.id), &value_id)
        })
        .collect()
}

/// Values of the aggregate stored under `key`.
///
/// A multi-bucket aggregate yields its buckets. A single-bucket aggregate
/// yields the buckets of the aggregate it wraps under the same key. Without
/// buckets, the innermost single-bucket count is reported under `value_id`.
fn aggregate_values(raw: &Value, key: &str, value_id: &str) -> Vec<AggregationResponseValue> {
    let Some(aggregate) = raw.get(key) else {
        return Vec::new();
    };

    if let Some(buckets) = aggregate.get("buckets").and_then(Value::as_array) {
        return bucket_values(buckets);
    }

    let single = match aggregate.get(key) {
        Some(inner) => match find_buckets(inner, key) {
            Some(buckets) => return bucket_values(buckets),
            None => inner,
        },
        None => aggregate,
    };

    doc_count(single)
        .filter(|count| *count > 0)
        .map(|count| AggregationResponseValue {
            id: value_id.to_string(),
            count,
        })
        .into_iter()
        .collect()
}

fn bucket_values(buckets: &[Value]) -> Vec<AggregationResponseValue> {
    buckets
        .iter()
        .filter_map(|bucket| {
            let count = doc_count(bucket).filter(|count| *count > 0)?;
            Some(AggregationResponseValue {
                id: bucket_key(bucket)?,
                count,
            })
        })
        .collect()
}

/// Buckets of a multi-bucket aggregate, looking through single-bucket
/// wrappers that carry the aggregate under the same name.
fn find_buckets<'a>(aggregate: &'a Value, name: &str) -> Option<&'a Vec<Value>> {
    match aggregate.get("buckets").and_then(Value::as_array) {
        Some(buckets) => Some(buckets),
        None => find_buckets(aggregate.get(name)?, name),
    }
}

fn doc_count(bucket: &Value) -> Option<u64> {
    bucket.get("doc_count").and_then(Value::as_u64)
}

fn bucket_key(bucket: &Value) -> Option<String> {
    if let Some(key) = bucket.get("key_as_string").and_then(Value::as_str) {
        return Some(key.to_string());
    }
    match bucket.get("key")? {
        Value::String(key) => Some(key.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_provider_shared::RangeAggregationValue;
    use serde_json::json;

    fn price_ranges() -> AggregationRequest {
        AggregationRequest::Range(RangeAggregationRequest {
            id: Some("Price".to_string()),
            field_name: "price".to_string(),
            values: vec![
                RangeAggregationValue {
                    id: "Cheap".to_string(),
                    ..Default::default()
                },
                RangeAggregationValue {
                    id: "Mid".to_string(),
                    ..Default::default()
                },
                RangeAggregationValue {
                    id: "Luxury".to_string(),
                    ..Default::default()
                },
            ],
        })
    }

    #[test]
    fn test_term_buckets() {
        let raw = json!({
            "color": {
                "buckets": [
                    { "key": "Red", "doc_count": 3 },
                    { "key": "Black", "doc_count": 1 },
                    { "key": "Green", "doc_count": 0 }
                ]
            }
        });

        let responses = build_aggregations(&raw, &[AggregationRequest::term("Color")]);

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, "color");
        assert_eq!(responses[0].count_of("Red"), 3);
        assert_eq!(responses[0].count_of("Black"), 1);
        assert_eq!(responses[0].values.len(), 2);
    }

    #[test]
    fn test_term_keys_of_other_types() {
        let raw = json!({
            "size": { "buckets": [ { "key": 42, "doc_count": 2 } ] },
            "instock": { "buckets": [ { "key": 1, "key_as_string": "true", "doc_count": 5 } ] }
        });

        let responses = build_aggregations(
            &raw,
            &[AggregationRequest::term("Size"), AggregationRequest::term("InStock")],
        );

        assert_eq!(responses[0].count_of("42"), 2);
        assert_eq!(responses[1].count_of("true"), 5);
    }

    #[test]
    fn test_wrapped_term_buckets() {
        let raw = json!({
            "color": {
                "doc_count": 4,
                "color": { "buckets": [ { "key": "Silver", "doc_count": 4 } ] }
            }
        });

        let responses = build_aggregations(&raw, &[AggregationRequest::term("color")]);
        assert_eq!(responses[0].count_of("Silver"), 4);
    }

    #[test]
    fn test_range_values_from_nested_buckets() {
        let raw = json!({
            "price-mid": {
                "doc_count": 7,
                "price-mid": {
                    "buckets": [
                        { "key": "a", "doc_count": 3 },
                        { "key": "b", "doc_count": 4 },
                        { "key": "c", "doc_count": 0 }
                    ]
                }
            }
        });

        let responses = build_aggregations(&raw, &[price_ranges()]);

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, "price");
        let mut ids: Vec<&str> = responses[0].values.iter().map(|v| v.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(responses[0].count_of("a"), 3);
        assert_eq!(responses[0].count_of("b"), 4);
    }

    #[test]
    fn test_single_bucket_range_values_use_lowercase_ids() {
        let raw = json!({
            "price-cheap": { "doc_count": 2 },
            "price-mid": { "doc_count": 5 },
            "price-luxury": { "doc_count": 0 }
        });

        let responses = build_aggregations(&raw, &[price_ranges()]);

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].values.len(), 2);
        assert_eq!(responses[0].count_of("cheap"), 2);
        assert_eq!(responses[0].count_of("mid"), 5);
        assert_eq!(responses[0].count_of("Mid"), 0);
    }

    #[test]
    fn test_single_bucket_term_reports_its_count() {
        let raw = json!({
            "instock": { "doc_count": 6 },
            "color": { "doc_count": 0 }
        });

        let responses = build_aggregations(
            &raw,
            &[AggregationRequest::term("InStock"), AggregationRequest::term("color")],
        );

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, "instock");
        assert_eq!(responses[0].values.len(), 1);
        assert_eq!(responses[0].count_of("instock"), 6);
    }

    #[test]
    fn test_empty_aggregations_are_omitted() {
        let raw = json!({ "color": { "buckets": [] } });

        let responses =
            build_aggregations(&raw, &[AggregationRequest::term("color"), price_ranges()]);

        assert!(responses.is_empty());
    }
}
