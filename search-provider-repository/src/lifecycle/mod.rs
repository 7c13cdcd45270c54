//! Index naming, creation and alias management.

mod index_config;
mod manager;
mod naming;

pub use index_config::create_index_body;
pub use manager::IndexLifecycle;
pub(crate) use manager::validate_document_type;
pub use naming::{random_index_suffix, AliasKind, IndexNaming};
