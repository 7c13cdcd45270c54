//! Error types for the search provider repository.

mod search_error;
mod store_error;

pub use search_error::{SearchError, StoreContext};
pub use store_error::StoreError;
