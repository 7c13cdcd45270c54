//! Configuration types for the search provider.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::SearchError;

/// Default timeout for data-plane requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for health-check pings.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Scope used for document types without an explicit scope.
pub const DEFAULT_SCOPE: &str = "default";

/// User name sent with an API key when no user is configured.
pub const DEFAULT_USER: &str = "elastic";

/// Token filter applied by the searchable field analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenFilter {
    /// N-grams anywhere in the token: matches in the middle of a word.
    NGram,
    /// N-grams anchored at the start of the token.
    #[default]
    EdgeNGram,
}

impl TokenFilter {
    /// Name of the filter as defined in the index analysis settings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NGram => "custom_ngram",
            Self::EdgeNGram => "custom_edge_ngram",
        }
    }
}

impl fmt::Display for TokenFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenFilter {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "custom_ngram" | "ngram" => Ok(Self::NGram),
            "custom_edge_ngram" | "edge_ngram" => Ok(Self::EdgeNGram),
            other => Err(SearchError::configuration(format!(
                "Unknown token filter '{}'",
                other
            ))),
        }
    }
}

/// Index creation and maintenance settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingSettings {
    /// Value of `index.mapping.total_fields.limit` for new indices.
    pub total_fields_limit: u32,
    pub token_filter: TokenFilter,
    pub min_gram: u32,
    pub max_gram: u32,
    /// Delete stray indices behind the active alias before indexing.
    pub delete_duplicate_indexes: bool,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            total_fields_limit: 1000,
            token_filter: TokenFilter::default(),
            min_gram: 1,
            max_gram: 20,
            delete_duplicate_indexes: true,
        }
    }
}

impl IndexingSettings {
    /// Value of `index.max_ngram_diff`.
    pub fn ngram_diff(&self) -> u32 {
        self.max_gram.saturating_sub(self.min_gram)
    }

    /// Check the n-gram bounds.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_gram == 0 {
            return Err(SearchError::configuration("min_gram must be at least 1"));
        }
        if self.max_gram < self.min_gram {
            return Err(SearchError::configuration(format!(
                "max_gram ({}) must not be less than min_gram ({})",
                self.max_gram, self.min_gram
            )));
        }
        Ok(())
    }
}

/// Connection and naming configuration for the provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Server address; the scheme defaults to `http://`.
    pub server: String,
    pub user: Option<String>,
    /// API key or password.
    pub key: Option<String>,
    /// Default scope, the prefix of every index name.
    pub scope: String,
    /// Scope overrides keyed by lower-cased document type.
    pub document_scopes: HashMap<String, String>,
    pub request_timeout: Duration,
    pub health_check_timeout: Duration,
    pub indexing: IndexingSettings,
}

impl ProviderConfig {
    /// Create a configuration for `server` with default settings.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            user: None,
            key: None,
            scope: DEFAULT_SCOPE.to_string(),
            document_scopes: HashMap::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_check_timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
            indexing: IndexingSettings::default(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Use `scope` instead of the default scope for `document_type`.
    pub fn with_document_scope(
        mut self,
        document_type: impl AsRef<str>,
        scope: impl Into<String>,
    ) -> Self {
        self.document_scopes
            .insert(document_type.as_ref().to_lowercase(), scope.into());
        self
    }

    pub fn with_credentials(mut self, user: Option<String>, key: impl Into<String>) -> Self {
        self.user = user;
        self.key = Some(key.into());
        self
    }

    pub fn with_indexing(mut self, indexing: IndexingSettings) -> Self {
        self.indexing = indexing;
        self
    }

    /// Basic-auth credentials, when a key is configured.
    pub fn credentials(&self) -> Option<(String, String)> {
        let key = self.key.as_ref().filter(|k| !k.is_empty())?;
        let user = self.user.clone().unwrap_or_else(|| DEFAULT_USER.to_string());
        Some((user, key.clone()))
    }

    /// The normalized server URL.
    pub fn server_url(&self) -> Result<Url, SearchError> {
        normalize_server_url(&self.server)
    }

    /// Validate everything that can be checked without a connection.
    pub fn validate(&self) -> Result<(), SearchError> {
        self.server_url()?;
        if self.scope.trim().is_empty() {
            return Err(SearchError::configuration("'Scope' must not be empty"));
        }
        self.indexing.validate()
    }
}

/// Normalize a server address: it must be non-empty, gets `http://` when no
/// scheme is given, and loses trailing slashes.
pub fn normalize_server_url(server: &str) -> Result<Url, SearchError> {
    let server = server.trim();
    if server.is_empty() {
        return Err(SearchError::configuration(
            "'Server' parameter must not be empty",
        ));
    }

    let lower = server.to_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        server.to_string()
    } else {
        format!("http://{}", server)
    };

    Url::parse(with_scheme.trim_end_matches('/'))
        .map_err(|e| SearchError::configuration(format!("Invalid server URL '{}': {}", server, e)))
}
