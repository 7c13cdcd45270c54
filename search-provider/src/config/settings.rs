//! Provider settings read from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use search_provider_repository::config::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_HEALTH_CHECK_TIMEOUT};
use search_provider_repository::{IndexingSettings, ProviderConfig, TokenFilter};

use crate::StartupError;

/// Default search server address.
const DEFAULT_SERVER_URL: &str = "http://localhost:9200";

/// Everything the binary needs to start the provider.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderConfig,
    /// Document types that get an active alias at start-up.
    pub document_types: Vec<String>,
}

impl Settings {
    /// Read the settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_SERVER_URL`: Server address (default: http://localhost:9200)
    /// - `SEARCH_USER`, `SEARCH_KEY`: Basic-auth credentials (user defaults to `elastic`)
    /// - `SEARCH_SCOPE`: Index name prefix (default: `default`)
    /// - `SEARCH_REQUEST_TIMEOUT_SECS`: Data-plane request timeout (default: 60)
    /// - `SEARCH_HEALTH_CHECK_TIMEOUT_SECS`: Ping timeout (default: 2)
    /// - `SEARCH_TOTAL_FIELDS_LIMIT`: Mapping field limit (default: 1000)
    /// - `SEARCH_TOKEN_FILTER`: `custom_ngram` or `custom_edge_ngram` (default)
    /// - `SEARCH_MIN_GRAM`, `SEARCH_MAX_GRAM`: N-gram bounds (default: 1, 20)
    /// - `SEARCH_DELETE_DUPLICATE_INDEXES`: Stray index cleanup (default: true)
    /// - `SEARCH_DOCUMENT_TYPES`: Comma-separated document types
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the settings through `lookup`, which returns the value of a
    /// variable when it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let defaults = IndexingSettings::default();
        let indexing = IndexingSettings {
            total_fields_limit: parse(&var, "SEARCH_TOTAL_FIELDS_LIMIT", defaults.total_fields_limit)?,
            token_filter: parse::<TokenFilter, _>(&var, "SEARCH_TOKEN_FILTER", defaults.token_filter)?,
            min_gram: parse(&var, "SEARCH_MIN_GRAM", defaults.min_gram)?,
            max_gram: parse(&var, "SEARCH_MAX_GRAM", defaults.max_gram)?,
            delete_duplicate_indexes: parse(
                &var,
                "SEARCH_DELETE_DUPLICATE_INDEXES",
                defaults.delete_duplicate_indexes,
            )?,
        };

        let server = var("SEARCH_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let mut provider = ProviderConfig::new(server).with_indexing(indexing);
        if let Some(scope) = var("SEARCH_SCOPE") {
            provider = provider.with_scope(scope);
        }
        if let Some(key) = var("SEARCH_KEY") {
            provider = provider.with_credentials(var("SEARCH_USER"), key);
        }
        provider.request_timeout = Duration::from_secs(parse(
            &var,
            "SEARCH_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?);
        provider.health_check_timeout = Duration::from_secs(parse(
            &var,
            "SEARCH_HEALTH_CHECK_TIMEOUT_SECS",
            DEFAULT_HEALTH_CHECK_TIMEOUT.as_secs(),
        )?);

        provider.validate()?;

        let document_types = var("SEARCH_DOCUMENT_TYPES")
            .map(|types| {
                types
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            provider,
            document_types,
        })
    }
}

fn parse<T, F>(var: &F, name: &str, default: T) -> Result<T, StartupError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| StartupError::config(format!("Invalid {} '{}': {}", name, value, e))),
        None => Ok(default),
    }
}
