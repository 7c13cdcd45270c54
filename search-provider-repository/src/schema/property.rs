//! Store field mapping model.
//!
//! A [`Property`] mirrors one entry of an index mapping's `properties`
//! object. Only the attributes the provider writes are modelled; anything
//! else the store reports back is ignored on load.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Normalizer defined on every index created by the provider.
pub const LOWERCASE_NORMALIZER: &str = "lowercase";

/// Analyzer applied to searchable text fields.
pub const SEARCHABLE_FIELD_ANALYZER: &str = "searchable_field_analyzer";

/// Keyword sub-field added to every keyword property.
pub const RAW_SUB_FIELD: &str = "raw";

/// Completion sub-field added to suggestable properties.
pub const COMPLETION_SUB_FIELD: &str = "completion";

/// Maximum input length of completion sub-fields.
pub const COMPLETION_MAX_INPUT_LENGTH: u32 = 256;

/// Store type tag of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Text,
    Keyword,
    Integer,
    Short,
    Byte,
    Long,
    Float,
    Double,
    Date,
    Boolean,
    GeoPoint,
    Nested,
    Completion,
    /// Plain object; the store omits `type` for these.
    #[default]
    Object,
    /// A type the provider never creates, loaded from an existing mapping.
    #[serde(other)]
    Unknown,
}

/// One field mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_length: Option<u32>,
    /// Multi-fields such as `raw` and `completion`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Property>,
    /// Members of nested and object properties.
    #[serde(default, skip_serializing_if = "PropertySet::is_empty")]
    pub properties: PropertySet,
}

impl Property {
    pub fn new(kind: PropertyType) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::new(PropertyType::Text)
    }

    pub fn keyword() -> Self {
        Self::new(PropertyType::Keyword)
    }

    pub fn nested() -> Self {
        Self::new(PropertyType::Nested)
    }

    /// Completion sub-field definition.
    pub fn completion() -> Self {
        Self {
            kind: PropertyType::Completion,
            max_input_length: Some(COMPLETION_MAX_INPUT_LENGTH),
            ..Default::default()
        }
    }

    pub fn with_index(mut self, index: bool) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl Into<String>) -> Self {
        self.normalizer = Some(normalizer.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field: Property) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name, property);
        self
    }

    pub fn is_keyword(&self) -> bool {
        self.kind == PropertyType::Keyword
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Properties of one alias keyed by store field name.
///
/// Iteration is in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet(BTreeMap<String, Property>);

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `properties` of a mapping body such as
    /// `{"properties": {...}}`. A body without properties is empty.
    pub fn from_mapping(mapping: &Value) -> Result<Self, serde_json::Error> {
        match mapping.get("properties") {
            Some(properties) => serde_json::from_value(properties.clone()),
            None => Ok(Self::new()),
        }
    }

    /// Mapping body for a put-mapping request.
    pub fn to_mapping(&self) -> Value {
        json!({ "properties": self })
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, property: Property) -> Option<Property> {
        self.0.insert(name.into(), property)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Property> {
        self.0.iter()
    }

    /// Properties of `other` whose names are not in `self`.
    pub fn missing_from(&self, other: &PropertySet) -> PropertySet {
        other
            .iter()
            .filter(|(name, _)| !self.contains(name))
            .map(|(name, property)| (name.clone(), property.clone()))
            .collect()
    }

    /// Add the properties of `other` that `self` does not have yet.
    /// Existing names keep their definition. Returns the number added.
    pub fn merge_missing(&mut self, other: &PropertySet) -> usize {
        let mut added = 0;
        for (name, property) in other.iter() {
            if let btree_map::Entry::Vacant(entry) = self.0.entry(name.clone()) {
                entry.insert(property.clone());
                added += 1;
            }
        }
        added
    }
}

impl FromIterator<(String, Property)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PropertySet {
    type Item = (String, Property);
    type IntoIter = btree_map::IntoIter<String, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = (&'a String, &'a Property);
    type IntoIter = btree_map::Iter<'a, String, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_serialization() {
        let property = Property::keyword()
            .with_index(true)
            .with_normalizer(LOWERCASE_NORMALIZER)
            .with_field(RAW_SUB_FIELD, Property::keyword());

        assert_eq!(
            serde_json::to_value(&property).unwrap(),
            json!({
                "type": "keyword",
                "index": true,
                "normalizer": "lowercase",
                "fields": { "raw": { "type": "keyword" } }
            })
        );
    }

    #[test]
    fn test_from_mapping_ignores_unknown_attributes() {
        let mapping = json!({
            "properties": {
                "name": { "type": "text", "analyzer": "searchable_field_analyzer" },
                "code": { "type": "keyword", "ignore_above": 256 },
                "rank": { "type": "rank_feature" },
                "address": { "properties": { "city": { "type": "text" } } }
            }
        });

        let set = PropertySet::from_mapping(&mapping).unwrap();

        assert_eq!(set.len(), 4);
        assert!(set.get("code").unwrap().is_keyword());
        assert_eq!(set.get("rank").unwrap().kind, PropertyType::Unknown);
        let address = set.get("address").unwrap();
        assert_eq!(address.kind, PropertyType::Object);
        assert!(address.properties.contains("city"));
    }

    #[test]
    fn test_from_mapping_without_properties() {
        assert!(PropertySet::from_mapping(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_merge_missing_keeps_existing_definitions() {
        let mut known: PropertySet = [("color".to_string(), Property::keyword())]
            .into_iter()
            .collect();
        let incoming: PropertySet = [
            ("color".to_string(), Property::text()),
            ("size".to_string(), Property::new(PropertyType::Integer)),
        ]
        .into_iter()
        .collect();

        let fresh = known.missing_from(&incoming);
        assert_eq!(fresh.names().collect::<Vec<_>>(), vec!["size"]);

        assert_eq!(known.merge_missing(&incoming), 1);
        assert!(known.get("color").unwrap().is_keyword());
        assert_eq!(known.get("size").unwrap().kind, PropertyType::Integer);
    }
}
