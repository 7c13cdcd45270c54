//! Interface definitions for the provider's collaborators.
//!
//! This module defines the `SearchStore` trait over the document store and
//! the `QueryBuilder` trait that turns a search request into a native query,
//! allowing swappable backends and test doubles.

mod query_builder;
mod search_store;

pub use query_builder::QueryBuilder;
pub use search_store::SearchStore;
