//! In-process store implementation.

mod store;

pub use store::MemoryStore;
