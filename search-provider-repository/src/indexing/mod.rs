//! Bulk indexing of document batches.

mod bulk;

pub use bulk::{BulkIndexer, BATCH_FAILURE_ITEM_ID};
