//! Field type inference.
//!
//! Maps a document field to the store property type it is indexed as.
//! Fields with an explicit [`FieldValueType`] go through a fixed table;
//! untyped fields are inferred from their runtime value by
//! [`infer_from_runtime_value`].

use search_provider_shared::{FieldValue, FieldValueType, IndexDocumentField};

use crate::errors::SearchError;
use crate::schema::property::{Property, PropertyType};

/// Infer the base property of `field`, before capability configuration.
pub fn infer_property(field: &IndexDocumentField) -> Result<Property, SearchError> {
    let kind = match field.value_type {
        FieldValueType::Undefined => return infer_from_runtime_value(field),
        FieldValueType::String if field.is_filterable => PropertyType::Keyword,
        FieldValueType::String => PropertyType::Text,
        FieldValueType::Keyword | FieldValueType::Char | FieldValueType::Guid => {
            PropertyType::Keyword
        }
        FieldValueType::Integer => PropertyType::Integer,
        FieldValueType::Short => PropertyType::Short,
        FieldValueType::Byte => PropertyType::Byte,
        FieldValueType::Long => PropertyType::Long,
        FieldValueType::Float => PropertyType::Float,
        FieldValueType::Decimal | FieldValueType::Double => PropertyType::Double,
        FieldValueType::DateTime => PropertyType::Date,
        FieldValueType::Boolean => PropertyType::Boolean,
        FieldValueType::GeoPoint => PropertyType::GeoPoint,
        FieldValueType::Complex => PropertyType::Nested,
    };

    Ok(Property::new(kind))
}

/// Legacy inference for [`FieldValueType::Undefined`] fields.
///
/// The first value decides the type. Widening follows the store's signed
/// integer types: unsigned values move up one size.
pub fn infer_from_runtime_value(field: &IndexDocumentField) -> Result<Property, SearchError> {
    let value = field
        .value()
        .ok_or_else(|| SearchError::missing_field_value(&field.name))?;

    let kind = match value {
        FieldValue::String(_) if field.is_filterable => PropertyType::Keyword,
        FieldValue::String(_) => PropertyType::Text,
        FieldValue::Char(_) | FieldValue::Guid(_) => PropertyType::Keyword,
        FieldValue::Integer(_) | FieldValue::UnsignedShort(_) => PropertyType::Integer,
        FieldValue::Short(_) | FieldValue::Byte(_) => PropertyType::Short,
        FieldValue::SignedByte(_) => PropertyType::Byte,
        FieldValue::Long(_) | FieldValue::UnsignedInteger(_) | FieldValue::Duration(_) => {
            PropertyType::Long
        }
        FieldValue::UnsignedLong(_) => PropertyType::Double,
        FieldValue::Float(_) => PropertyType::Float,
        FieldValue::Decimal(_) | FieldValue::Double(_) => PropertyType::Double,
        FieldValue::DateTime(_) => PropertyType::Date,
        FieldValue::Boolean(_) => PropertyType::Boolean,
        FieldValue::GeoPoint(_) => PropertyType::GeoPoint,
        FieldValue::Complex(_) => PropertyType::Nested,
        FieldValue::Json(_) => {
            return Err(SearchError::unsupported_field_type(
                &field.name,
                value.type_name(),
            ))
        }
    };

    Ok(Property::new(kind))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use search_provider_shared::{FieldValue, JsonComplex};
    use serde_json::json;

    use super::*;

    fn typed(value_type: FieldValueType) -> IndexDocumentField {
        IndexDocumentField::new("field", "value", value_type)
    }

    fn untyped(value: FieldValue) -> IndexDocumentField {
        IndexDocumentField::with_values("field", vec![value], FieldValueType::Undefined)
    }

    fn kind_of(field: &IndexDocumentField) -> PropertyType {
        infer_property(field).unwrap().kind
    }

    #[test]
    fn test_string_depends_on_filterable() {
        assert_eq!(kind_of(&typed(FieldValueType::String)), PropertyType::Text);
        assert_eq!(
            kind_of(&typed(FieldValueType::String).filterable()),
            PropertyType::Keyword
        );
    }

    #[test]
    fn test_explicit_type_table() {
        let cases = [
            (FieldValueType::Keyword, PropertyType::Keyword),
            (FieldValueType::Guid, PropertyType::Keyword),
            (FieldValueType::Char, PropertyType::Keyword),
            (FieldValueType::Integer, PropertyType::Integer),
            (FieldValueType::Short, PropertyType::Short),
            (FieldValueType::Byte, PropertyType::Byte),
            (FieldValueType::Long, PropertyType::Long),
            (FieldValueType::Float, PropertyType::Float),
            (FieldValueType::Decimal, PropertyType::Double),
            (FieldValueType::Double, PropertyType::Double),
            (FieldValueType::DateTime, PropertyType::Date),
            (FieldValueType::Boolean, PropertyType::Boolean),
            (FieldValueType::GeoPoint, PropertyType::GeoPoint),
            (FieldValueType::Complex, PropertyType::Nested),
        ];

        for (value_type, expected) in cases {
            assert_eq!(kind_of(&typed(value_type)), expected, "{}", value_type);
        }
    }

    #[test]
    fn test_untyped_widening() {
        assert_eq!(
            kind_of(&untyped(FieldValue::UnsignedShort(1))),
            PropertyType::Integer
        );
        assert_eq!(kind_of(&untyped(FieldValue::Byte(1))), PropertyType::Short);
        assert_eq!(
            kind_of(&untyped(FieldValue::SignedByte(1))),
            PropertyType::Byte
        );
        assert_eq!(
            kind_of(&untyped(FieldValue::UnsignedInteger(1))),
            PropertyType::Long
        );
        assert_eq!(
            kind_of(&untyped(FieldValue::Duration(Duration::from_secs(60)))),
            PropertyType::Long
        );
        assert_eq!(
            kind_of(&untyped(FieldValue::UnsignedLong(1))),
            PropertyType::Double
        );
    }

    #[test]
    fn test_untyped_complex_is_nested() {
        let field = untyped(FieldValue::complex(JsonComplex(json!({ "city": "Oslo" }))));
        assert_eq!(kind_of(&field), PropertyType::Nested);
    }

    #[test]
    fn test_untyped_without_value_fails() {
        let field = IndexDocumentField::with_values("Empty", vec![], FieldValueType::Undefined);
        assert!(matches!(
            infer_property(&field),
            Err(SearchError::MissingFieldValue(name)) if name == "Empty"
        ));
    }

    #[test]
    fn test_untyped_json_is_unsupported() {
        let field = IndexDocumentField::with_values(
            "Blob",
            vec![FieldValue::Json(json!({ "a": 1 }))],
            FieldValueType::Undefined,
        );
        assert!(matches!(
            infer_property(&field),
            Err(SearchError::UnsupportedFieldType { field, .. }) if field == "Blob"
        ));
    }
}
