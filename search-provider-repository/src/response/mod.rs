//! Conversion of raw store responses into provider responses.

mod aggregations;
mod search_response;
mod suggestions;

pub use aggregations::build_aggregations;
pub use search_response::parse_search_response;
pub use suggestions::parse_suggestions;
