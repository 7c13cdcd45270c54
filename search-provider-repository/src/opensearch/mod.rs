//! OpenSearch implementation of the document store.
//!
//! This module provides a concrete implementation of `SearchStore` using
//! an OpenSearch or Elasticsearch cluster as the backend.

mod client;

pub use client::OpenSearchStore;
