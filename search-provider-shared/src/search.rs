//! Search, aggregation and suggestion request/response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A provider-native document: an id plus store-safe field names mapped to
/// their value or array of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl SearchDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// The document source sent to the store.
    pub fn to_source(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Sort instruction for a search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortingField {
    pub field_name: String,
    pub is_descending: bool,
}

impl SortingField {
    pub fn ascending(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_descending: false,
        }
    }

    pub fn descending(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            is_descending: true,
        }
    }
}

/// Term aggregation: one value per distinct field value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermAggregationRequest {
    pub id: Option<String>,
    pub field_name: String,
    pub size: Option<usize>,
}

/// One named bucket of a range aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAggregationValue {
    pub id: String,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
}

/// Range aggregation: one value per configured range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAggregationRequest {
    pub id: Option<String>,
    pub field_name: String,
    pub values: Vec<RangeAggregationValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationRequest {
    Term(TermAggregationRequest),
    Range(RangeAggregationRequest),
}

impl AggregationRequest {
    pub fn term(field_name: impl Into<String>) -> Self {
        Self::Term(TermAggregationRequest {
            field_name: field_name.into(),
            ..Default::default()
        })
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Term(term) => term.id.as_deref(),
            Self::Range(range) => range.id.as_deref(),
        }
    }

    pub fn field_name(&self) -> &str {
        match self {
            Self::Term(term) => &term.field_name,
            Self::Range(range) => &range.field_name,
        }
    }

    /// Id under which the aggregation is requested and reported: the
    /// lower-cased `id`, or the lower-cased field name when no id is set.
    pub fn response_id(&self) -> String {
        self.id().unwrap_or_else(|| self.field_name()).to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResponseValue {
    pub id: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResponse {
    pub id: String,
    pub values: Vec<AggregationResponseValue>,
}

impl AggregationResponse {
    /// Count reported for `value_id`, or 0 when the value is absent.
    pub fn count_of(&self, value_id: &str) -> u64 {
        self.values
            .iter()
            .find(|value| value.id == value_id)
            .map(|value| value.count)
            .unwrap_or(0)
    }
}

/// Parameters of a search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub sorting: Vec<SortingField>,
    pub skip: usize,
    pub take: usize,
    pub aggregations: Vec<AggregationRequest>,
    /// Search the backup (staging) index instead of the active one.
    pub use_backup_index: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            sorting: Vec::new(),
            skip: 0,
            take: 20,
            aggregations: Vec::new(),
            use_backup_index: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    pub documents: Vec<SearchDocument>,
    pub aggregations: Vec<AggregationResponse>,
}

impl SearchResponse {
    pub fn aggregation(&self, id: &str) -> Option<&AggregationResponse> {
        self.aggregations
            .iter()
            .find(|aggregation| aggregation.id.eq_ignore_ascii_case(id))
    }
}

/// Completion suggestions for a query prefix over suggestable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub query: String,
    pub fields: Vec<String>,
    pub size: usize,
    pub use_backup_index: bool,
}

impl Default for SuggestionRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            fields: Vec::new(),
            size: 10,
            use_backup_index: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
}
