//! Index settings for newly created indices.
//!
//! This module defines the analysis chain shared by every index the
//! provider creates.

use serde_json::{json, Value};

use crate::config::{IndexingSettings, TokenFilter};
use crate::schema::{LOWERCASE_NORMALIZER, SEARCHABLE_FIELD_ANALYZER};

/// Body of a create-index request.
///
/// The configuration includes:
/// - **Field limit**: `index.mapping.total_fields.limit` from the settings
/// - **N-gram filters**: `custom_ngram` and `custom_edge_ngram` with the
///   configured bounds, and `index.max_ngram_diff` allowing them
/// - **Searchable field analyzer**: standard tokenizer, lowercase, then the
///   configured n-gram filter
/// - **Lowercase normalizer**: used by keyword properties
/// - **Alias**: attached atomically with the index
pub fn create_index_body(settings: &IndexingSettings, alias: &str) -> Value {
    let ngram = json!({
        "min_gram": settings.min_gram,
        "max_gram": settings.max_gram,
    });

    json!({
        "settings": {
            "index.mapping.total_fields.limit": settings.total_fields_limit,
            "index.max_ngram_diff": settings.ngram_diff(),
            "analysis": {
                "filter": {
                    (TokenFilter::NGram.name()): with_type("ngram", &ngram),
                    (TokenFilter::EdgeNGram.name()): with_type("edge_ngram", &ngram)
                },
                "analyzer": {
                    (SEARCHABLE_FIELD_ANALYZER): {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", settings.token_filter.name()]
                    }
                },
                "normalizer": {
                    (LOWERCASE_NORMALIZER): {
                        "type": "custom",
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "aliases": {
            (alias): {}
        }
    })
}

fn with_type(filter_type: &str, bounds: &Value) -> Value {
    let mut filter = bounds.clone();
    filter["type"] = Value::String(filter_type.to_string());
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let body = create_index_body(&IndexingSettings::default(), "test-product-active");
        let settings = &body["settings"];

        assert_eq!(settings["index.mapping.total_fields.limit"], 1000);
        assert_eq!(settings["index.max_ngram_diff"], 19);

        let filters = &settings["analysis"]["filter"];
        assert_eq!(filters["custom_ngram"]["type"], "ngram");
        assert_eq!(filters["custom_edge_ngram"]["type"], "edge_ngram");
        assert_eq!(filters["custom_edge_ngram"]["min_gram"], 1);
        assert_eq!(filters["custom_edge_ngram"]["max_gram"], 20);

        assert_eq!(
            settings["analysis"]["analyzer"]["searchable_field_analyzer"]["filter"],
            json!(["lowercase", "custom_edge_ngram"])
        );
        assert_eq!(
            settings["analysis"]["normalizer"]["lowercase"]["filter"],
            json!(["lowercase"])
        );

        assert!(body["aliases"]["test-product-active"].is_object());
    }

    #[test]
    fn test_configured_token_filter() {
        let settings = IndexingSettings {
            token_filter: TokenFilter::NGram,
            min_gram: 2,
            max_gram: 5,
            ..IndexingSettings::default()
        };

        let body = create_index_body(&settings, "alias");

        assert_eq!(body["settings"]["index.max_ngram_diff"], 3);
        assert_eq!(
            body["settings"]["analysis"]["analyzer"]["searchable_field_analyzer"]["filter"][1],
            "custom_ngram"
        );
    }
}
