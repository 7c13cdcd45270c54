//! Search error types.
//!
//! This module defines the domain error surfaced by the provider. Store
//! failures are wrapped with the server URL and the logical scope so that a
//! log line alone is enough to find the failing cluster.

use thiserror::Error;

use super::StoreError;

/// Errors surfaced by the search provider.
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A document field has a type that cannot be mapped to a store property.
    #[error("Field '{field}' has unsupported type '{value_type}'")]
    UnsupportedFieldType { field: String, value_type: String },

    /// A legacy untyped field carries no value to infer its type from.
    #[error("Field '{0}' has no value")]
    MissingFieldValue(String),

    /// A caller-supplied argument is invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A store round trip failed.
    #[error("{message}. URL:{server_url}, Scope: {scope}")]
    StoreError {
        message: String,
        server_url: String,
        scope: String,
        #[source]
        source: Option<StoreError>,
    },
}

impl SearchError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an unsupported field type error.
    pub fn unsupported_field_type(field: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self::UnsupportedFieldType {
            field: field.into(),
            value_type: value_type.into(),
        }
    }

    /// Create a missing field value error.
    pub fn missing_field_value(field: impl Into<String>) -> Self {
        Self::MissingFieldValue(field.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Where store errors come from: attached to every wrapped [`StoreError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreContext {
    pub server_url: String,
    pub scope: String,
}

impl StoreContext {
    pub fn new(server_url: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            scope: scope.into(),
        }
    }

    /// Wrap `source` into a [`SearchError::StoreError`].
    ///
    /// The store's own debug information is appended to `message`.
    pub fn error(&self, message: impl Into<String>, source: StoreError) -> SearchError {
        SearchError::StoreError {
            message: format!("{}. {}", message.into(), source),
            server_url: self.server_url.clone(),
            scope: self.scope.clone(),
            source: Some(source),
        }
    }

    /// A [`SearchError::StoreError`] without an underlying store error.
    pub fn failure(&self, message: impl Into<String>) -> SearchError {
        SearchError::StoreError {
            message: message.into(),
            server_url: self.server_url.clone(),
            scope: self.scope.clone(),
            source: None,
        }
    }
}
