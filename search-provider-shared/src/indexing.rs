//! Indexing parameters and per-document results.

use serde::{Deserialize, Serialize};

/// Flags selecting the target alias and the write mode of an indexing call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingParameters {
    /// Write into the backup (staging) index instead of the active one.
    pub reindex: bool,
    /// Merge documents by id instead of replacing them.
    pub partial_update: bool,
}

impl IndexingParameters {
    pub fn reindex() -> Self {
        Self {
            reindex: true,
            partial_update: false,
        }
    }

    pub fn partial_update() -> Self {
        Self {
            reindex: false,
            partial_update: true,
        }
    }
}

/// Outcome of indexing (or removing) a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingResultItem {
    pub id: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
}

impl IndexingResultItem {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failed(id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            succeeded: false,
            error_message: Some(error_message.into()),
        }
    }
}

/// Result of a batch call. Failed items are reported alongside succeeded ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingResult {
    pub items: Vec<IndexingResultItem>,
}

impl IndexingResult {
    pub fn new(items: Vec<IndexingResultItem>) -> Self {
        Self { items }
    }

    pub fn succeeded_count(&self) -> usize {
        self.items.iter().filter(|item| item.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.succeeded_count()
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &IndexingResultItem> {
        self.items.iter().filter(|item| !item.succeeded)
    }

    /// `true` when every item succeeded.
    pub fn is_success(&self) -> bool {
        self.items.iter().all(|item| item.succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_counts() {
        let result = IndexingResult::new(vec![
            IndexingResultItem::succeeded("1"),
            IndexingResultItem::failed("2", "mapper_parsing_exception"),
            IndexingResultItem::succeeded("3"),
        ]);

        assert_eq!(result.succeeded_count(), 2);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_success());
        assert_eq!(result.failed_items().next().unwrap().id, "2");
    }

    #[test]
    fn test_parameters() {
        let defaults = IndexingParameters::default();
        assert!(!defaults.reindex && !defaults.partial_update);
        assert!(IndexingParameters::reindex().reindex);
        assert!(IndexingParameters::partial_update().partial_update);
    }
}
