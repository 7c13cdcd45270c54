//! # Search Provider Shared
//!
//! Types shared by the search provider crates: the documents handed over by an
//! indexing pipeline, per-document indexing results, and the search,
//! aggregation and suggestion request/response model.

pub mod complex;
pub mod document;
pub mod indexing;
pub mod search;

pub use complex::{ComplexValue, JsonComplex, SchemaPaths, DEFAULT_SCHEMA_DEPTH};
pub use document::{
    FieldValue, FieldValueType, GeoPoint, IndexDocument, IndexDocumentField, CONTENT_FIELD_NAME,
    INDEXATION_DATE_FIELD_NAME,
};
pub use indexing::{IndexingParameters, IndexingResult, IndexingResultItem};
pub use search::{
    AggregationRequest, AggregationResponse, AggregationResponseValue, RangeAggregationRequest,
    RangeAggregationValue, SearchDocument, SearchRequest, SearchResponse, SortingField,
    SuggestionRequest, SuggestionResponse, TermAggregationRequest,
};
