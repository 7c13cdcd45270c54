//! # Search Provider Repository
//!
//! Schema-adaptive indexing over an index-and-alias document store. This
//! crate infers store mappings from document fields, keeps them cached,
//! converts documents, writes them in bulk and manages the active/backup
//! alias pair of every document type for zero-downtime reindexing. It
//! includes an OpenSearch store and an in-memory store.

pub mod config;
pub mod document;
pub mod errors;
pub mod indexing;
pub mod interfaces;
pub mod lifecycle;
pub mod memory;
pub mod opensearch;
pub mod provider;
pub mod query;
pub mod response;
pub mod schema;
pub mod types;

pub use config::{IndexingSettings, ProviderConfig, TokenFilter};
pub use errors::{SearchError, StoreError};
pub use interfaces::{QueryBuilder, SearchStore};
pub use memory::MemoryStore;
pub use opensearch::OpenSearchStore;
pub use provider::{HealthStatus, SearchProvider};
pub use query::SimpleQueryBuilder;
