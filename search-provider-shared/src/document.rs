//! Documents handed to the search provider for indexing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::complex::ComplexValue;

/// Name of the catch-all full-text field filled by the `add_searchable_*` helpers.
pub const CONTENT_FIELD_NAME: &str = "__content";

/// Name of the field holding the moment a document was indexed.
pub const INDEXATION_DATE_FIELD_NAME: &str = "indexationdate";

/// Declared type of a document field.
///
/// `Undefined` is the legacy mode where the type is taken from the runtime
/// value instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldValueType {
    #[default]
    Undefined,
    String,
    Keyword,
    Char,
    Guid,
    Complex,
    Integer,
    Short,
    Byte,
    Long,
    Float,
    Decimal,
    Double,
    DateTime,
    Boolean,
    GeoPoint,
}

impl fmt::Display for FieldValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse a `"lat,lon"` pair. Returns `None` for malformed input.
    pub fn parse(value: &str) -> Option<Self> {
        let (lat, lon) = value.split_once(',')?;
        let latitude = lat.trim().parse().ok()?;
        let longitude = lon.trim().parse().ok()?;
        Some(Self::new(latitude, longitude))
    }

    /// The store's coordinate representation.
    pub fn to_store_value(&self) -> Value {
        json!({ "lat": self.latitude, "lon": self.longitude })
    }
}

/// A single runtime value of a document field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Char(char),
    Guid(Uuid),
    Integer(i32),
    UnsignedShort(u16),
    Short(i16),
    Byte(u8),
    SignedByte(i8),
    Long(i64),
    UnsignedInteger(u32),
    UnsignedLong(u64),
    Float(f32),
    Decimal(f64),
    Double(f64),
    DateTime(DateTime<Utc>),
    /// Written as whole milliseconds.
    Duration(Duration),
    Boolean(bool),
    GeoPoint(GeoPoint),
    Complex(Arc<dyn ComplexValue>),
    /// Pre-serialized JSON with no declared structure.
    Json(Value),
}

impl FieldValue {
    /// Wrap a complex value.
    pub fn complex(value: impl ComplexValue + 'static) -> Self {
        Self::Complex(Arc::new(value))
    }

    /// Runtime type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Char(_) => "Char",
            Self::Guid(_) => "Guid",
            Self::Integer(_) => "Int32",
            Self::UnsignedShort(_) => "UInt16",
            Self::Short(_) => "Int16",
            Self::Byte(_) => "Byte",
            Self::SignedByte(_) => "SByte",
            Self::Long(_) => "Int64",
            Self::UnsignedInteger(_) => "UInt32",
            Self::UnsignedLong(_) => "UInt64",
            Self::Float(_) => "Single",
            Self::Decimal(_) => "Decimal",
            Self::Double(_) => "Double",
            Self::DateTime(_) => "DateTime",
            Self::Duration(_) => "Duration",
            Self::Boolean(_) => "Boolean",
            Self::GeoPoint(_) => "GeoPoint",
            Self::Complex(_) => "Complex",
            Self::Json(_) => "Json",
        }
    }

    /// JSON representation written into the provider document.
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Char(c) => Value::String(c.to_string()),
            Self::Guid(id) => Value::String(id.to_string()),
            Self::Integer(n) => json!(n),
            Self::UnsignedShort(n) => json!(n),
            Self::Short(n) => json!(n),
            Self::Byte(n) => json!(n),
            Self::SignedByte(n) => json!(n),
            Self::Long(n) => json!(n),
            Self::UnsignedInteger(n) => json!(n),
            Self::UnsignedLong(n) => json!(n),
            Self::Float(n) => json!(n),
            Self::Decimal(n) | Self::Double(n) => json!(n),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Duration(d) => json!(d.as_millis() as u64),
            Self::Boolean(b) => Value::Bool(*b),
            Self::GeoPoint(point) => point.to_store_value(),
            Self::Complex(value) => value.to_json(),
            Self::Json(value) => value.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(value: GeoPoint) -> Self {
        Self::GeoPoint(value)
    }
}

/// A named field of an [`IndexDocument`] with its indexing capabilities.
#[derive(Debug, Clone)]
pub struct IndexDocumentField {
    pub name: String,
    pub values: Vec<FieldValue>,
    pub value_type: FieldValueType,
    pub is_filterable: bool,
    pub is_searchable: bool,
    pub is_retrievable: bool,
    pub is_suggestable: bool,
    pub is_collection: bool,
}

impl IndexDocumentField {
    /// Create a field with a single value and no capabilities set.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<FieldValue>,
        value_type: FieldValueType,
    ) -> Self {
        Self::with_values(name, vec![value.into()], value_type)
    }

    /// Create a field holding several values.
    pub fn with_values(
        name: impl Into<String>,
        values: Vec<FieldValue>,
        value_type: FieldValueType,
    ) -> Self {
        Self {
            name: name.into(),
            values,
            value_type,
            is_filterable: false,
            is_searchable: false,
            is_retrievable: false,
            is_suggestable: false,
            is_collection: false,
        }
    }

    /// First value of the field, if any.
    pub fn value(&self) -> Option<&FieldValue> {
        self.values.first()
    }

    /// A field is written as an array when flagged as a collection or when
    /// it carries more than one value.
    pub fn is_collection_valued(&self) -> bool {
        self.is_collection || self.values.len() > 1
    }

    pub fn filterable(mut self) -> Self {
        self.is_filterable = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.is_searchable = true;
        self
    }

    pub fn retrievable(mut self) -> Self {
        self.is_retrievable = true;
        self
    }

    pub fn suggestable(mut self) -> Self {
        self.is_suggestable = true;
        self
    }

    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }
}

/// A document to index: an id plus an ordered list of fields.
///
/// Field names may repeat; repeated names are merged into one multi-valued
/// field when the document is converted for the store.
#[derive(Debug, Clone, Default)]
pub struct IndexDocument {
    pub id: String,
    pub fields: Vec<IndexDocumentField>,
}

impl IndexDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn add(&mut self, field: IndexDocumentField) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn with_field(mut self, field: IndexDocumentField) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a retrievable, filterable keyword value.
    pub fn add_filterable_string(&mut self, name: &str, value: &str) -> &mut Self {
        self.add(
            IndexDocumentField::new(name, value, FieldValueType::String)
                .retrievable()
                .filterable(),
        )
    }

    /// Append `value` to the catch-all full-text field.
    pub fn add_searchable_string(&mut self, value: &str) -> &mut Self {
        self.add(
            IndexDocumentField::new(CONTENT_FIELD_NAME, value, FieldValueType::String)
                .searchable()
                .collection(),
        )
    }

    /// Add a filterable keyword field and also append the value to the
    /// catch-all full-text field.
    pub fn add_filterable_and_searchable_string(&mut self, name: &str, value: &str) -> &mut Self {
        self.add_filterable_string(name, value);
        self.add_searchable_string(value)
    }

    /// Add one value of a filterable keyword collection.
    pub fn add_filterable_collection(&mut self, name: &str, value: &str) -> &mut Self {
        self.add(
            IndexDocumentField::new(name, value, FieldValueType::String)
                .retrievable()
                .filterable()
                .collection(),
        )
    }

    pub fn add_filterable_integer(&mut self, name: &str, value: i32) -> &mut Self {
        self.add(
            IndexDocumentField::new(name, value, FieldValueType::Integer)
                .retrievable()
                .filterable(),
        )
    }

    pub fn add_filterable_decimal(&mut self, name: &str, value: f64) -> &mut Self {
        self.add(
            IndexDocumentField::new(name, FieldValue::Decimal(value), FieldValueType::Decimal)
                .retrievable()
                .filterable(),
        )
    }

    pub fn add_filterable_date_time(&mut self, name: &str, value: DateTime<Utc>) -> &mut Self {
        self.add(
            IndexDocumentField::new(name, value, FieldValueType::DateTime)
                .retrievable()
                .filterable(),
        )
    }

    pub fn add_filterable_boolean(&mut self, name: &str, value: bool) -> &mut Self {
        self.add(
            IndexDocumentField::new(name, value, FieldValueType::Boolean)
                .retrievable()
                .filterable(),
        )
    }

    /// Stamp the document with its indexation date.
    pub fn add_indexation_date(&mut self, value: DateTime<Utc>) -> &mut Self {
        self.add_filterable_date_time(INDEXATION_DATE_FIELD_NAME, value)
    }
}
