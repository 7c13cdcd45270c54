//! Document conversion for the store.

mod adapter;

pub use adapter::{normalize_field_name, AdaptedDocument, DocumentAdapter};
