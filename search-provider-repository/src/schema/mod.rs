//! Property model, type inference and the mapping cache.

mod cache;
mod inference;
mod property;
mod registry;

pub use cache::PropertyCache;
pub use inference::{infer_from_runtime_value, infer_property};
pub use property::{
    Property, PropertySet, PropertyType, COMPLETION_MAX_INPUT_LENGTH, COMPLETION_SUB_FIELD,
    LOWERCASE_NORMALIZER, RAW_SUB_FIELD, SEARCHABLE_FIELD_ANALYZER,
};
pub use registry::SchemaRegistry;
