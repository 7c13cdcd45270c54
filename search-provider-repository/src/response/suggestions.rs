//! Completion suggestion parsing.

use serde_json::Value;

use search_provider_shared::{SuggestionRequest, SuggestionResponse};

use crate::document::normalize_field_name;

/// Collect suggestion texts field by field, in request order, keeping at
/// most `request.size` of them.
pub fn parse_suggestions(raw: &Value, request: &SuggestionRequest) -> SuggestionResponse {
    let suggestions = request
        .fields
        .iter()
        .flat_map(|field| options(raw, &normalize_field_name(field)))
        .take(request.size)
        .collect();

    SuggestionResponse { suggestions }
}

fn options(raw: &Value, field: &str) -> Vec<String> {
    raw.pointer(&format!("/suggest/{}", field))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("options").and_then(Value::as_array))
                .flatten()
                .filter_map(|option| option.get("text").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_concatenates_in_field_order_and_truncates() {
        let raw = json!({
            "suggest": {
                "brand": [ { "text": "bo", "options": [ { "text": "Bosch" } ] } ],
                "name": [ { "text": "bo", "options": [ { "text": "Bolt" }, { "text": "Box" } ] } ]
            }
        });
        let request = SuggestionRequest {
            query: "bo".to_string(),
            fields: vec!["Name".to_string(), "Brand".to_string(), "Missing".to_string()],
            size: 2,
            use_backup_index: false,
        };

        let response = parse_suggestions(&raw, &request);
        assert_eq!(response.suggestions, vec!["Bolt", "Box"]);

        let wider = SuggestionRequest { size: 10, ..request };
        assert_eq!(
            parse_suggestions(&raw, &wider).suggestions,
            vec!["Bolt", "Box", "Bosch"]
        );
    }
}
