//! Index and alias naming.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::config::ProviderConfig;

/// Length of the random suffix of physical index names.
const INDEX_SUFFIX_LENGTH: usize = 10;

/// The two aliases kept per document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasKind {
    /// Serves searches.
    Active,
    /// Receives a full reindex until the next swap.
    Backup,
}

impl AliasKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Backup => "backup",
        }
    }

    /// Backup when reindexing or searching the staging index, else active.
    pub fn select(use_backup: bool) -> Self {
        if use_backup {
            Self::Backup
        } else {
            Self::Active
        }
    }
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives index and alias names from the configured scopes.
#[derive(Debug, Clone)]
pub struct IndexNaming {
    scope: String,
    document_scopes: HashMap<String, String>,
}

impl IndexNaming {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            scope: config.scope.clone(),
            document_scopes: config.document_scopes.clone(),
        }
    }

    pub fn scope_for(&self, document_type: &str) -> &str {
        self.document_scopes
            .get(&document_type.to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.scope)
    }

    /// Default index name: `{scope}-{document_type}`, lower-cased.
    pub fn index_name(&self, document_type: &str) -> String {
        format!("{}-{}", self.scope_for(document_type), document_type).to_lowercase()
    }

    /// Physical index name: `{scope}-{document_type}-{suffix}`, lower-cased.
    pub fn index_name_with_suffix(&self, document_type: &str, suffix: &str) -> String {
        format!("{}-{}-{}", self.scope_for(document_type), document_type, suffix).to_lowercase()
    }

    /// Alias name: `{index_name}-{active|backup}`.
    pub fn alias_name(&self, kind: AliasKind, document_type: &str) -> String {
        format!("{}-{}", self.index_name(document_type), kind)
    }
}

/// Random suffix for a new physical index.
pub fn random_index_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(INDEX_SUFFIX_LENGTH);
    suffix
}
