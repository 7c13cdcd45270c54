//! Conversion of index documents into store documents.

use serde_json::Value;

use search_provider_shared::{
    FieldValue, IndexDocument, IndexDocumentField, SchemaPaths, SearchDocument,
    DEFAULT_SCHEMA_DEPTH,
};

use crate::errors::SearchError;
use crate::schema::{
    infer_property, Property, PropertySet, PropertyType, COMPLETION_SUB_FIELD,
    LOWERCASE_NORMALIZER, RAW_SUB_FIELD, SEARCHABLE_FIELD_ANALYZER,
};

/// A converted document and the properties it introduces.
#[derive(Debug, Clone)]
pub struct AdaptedDocument {
    pub document: SearchDocument,
    /// Properties for field names that were not known yet.
    pub discovered: PropertySet,
}

/// Converts [`IndexDocument`]s into [`SearchDocument`]s and infers the
/// properties of fields the store has not seen.
#[derive(Debug, Clone)]
pub struct DocumentAdapter {
    schema_depth: usize,
}

impl Default for DocumentAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_DEPTH)
    }
}

impl DocumentAdapter {
    /// `schema_depth` caps how deep nested field discovery descends.
    pub fn new(schema_depth: usize) -> Self {
        Self { schema_depth }
    }

    /// Convert `document`.
    ///
    /// Fields are visited in store name order; fields sharing a store name
    /// are merged into one array in arrival order. Only the first field of a
    /// merged name contributes a property.
    pub fn to_provider_document(
        &self,
        document: &IndexDocument,
        known: &PropertySet,
    ) -> Result<AdaptedDocument, SearchError> {
        let mut fields: Vec<(String, &IndexDocumentField)> = document
            .fields
            .iter()
            .map(|field| (normalize_field_name(&field.name), field))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut result = SearchDocument::new(&document.id);
        let mut discovered = PropertySet::new();

        for (name, field) in fields {
            if let Some(existing) = result.fields.get_mut(&name) {
                let mut merged = match existing.take() {
                    Value::Array(values) => values,
                    value => vec![value],
                };
                merged.extend(field.values.iter().map(FieldValue::to_json));
                *existing = Value::Array(merged);
                continue;
            }

            if !known.contains(&name) {
                discovered.insert(name.clone(), self.configure_property(field)?);
            }

            result.insert(name, shape_value(field));
        }

        Ok(AdaptedDocument {
            document: result,
            discovered,
        })
    }

    /// Inferred property of `field` with its capabilities applied.
    pub fn configure_property(&self, field: &IndexDocumentField) -> Result<Property, SearchError> {
        let mut property = infer_property(field)?;

        match property.kind {
            PropertyType::Nested => {
                property.properties = self.nested_properties(field);
                return Ok(property);
            }
            PropertyType::Text => {
                property.index = Some(field.is_searchable);
                if field.is_searchable {
                    property.analyzer = Some(SEARCHABLE_FIELD_ANALYZER.to_string());
                }
            }
            PropertyType::Keyword => {
                property.index = Some(field.is_filterable);
                property.normalizer = Some(LOWERCASE_NORMALIZER.to_string());
                property
                    .fields
                    .insert(RAW_SUB_FIELD.to_string(), Property::keyword());
            }
            _ => {}
        }

        property.store = Some(field.is_retrievable);
        if field.is_suggestable {
            property
                .fields
                .insert(COMPLETION_SUB_FIELD.to_string(), Property::completion());
        }

        Ok(property)
    }

    /// Text properties for every leaf path of the field's complex values.
    fn nested_properties(&self, field: &IndexDocumentField) -> PropertySet {
        field
            .values
            .iter()
            .filter_map(|value| match value {
                FieldValue::Complex(complex) => Some(complex.as_ref()),
                _ => None,
            })
            .flat_map(|complex| SchemaPaths::collect(complex, self.schema_depth))
            .map(|path| (path, Property::text()))
            .collect()
    }
}

/// Store-safe field name: trimmed, lower-cased, with characters the store
/// rejects in field names replaced by `_`.
pub fn normalize_field_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '#' | '*' | ',' | '"' | '\\' => '_',
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
}

fn shape_value(field: &IndexDocumentField) -> Value {
    if field.is_collection_valued() {
        Value::Array(field.values.iter().map(FieldValue::to_json).collect())
    } else {
        field.value().map(FieldValue::to_json).unwrap_or(Value::Null)
    }
}
