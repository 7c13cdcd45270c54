//! Store error types.
//!
//! This module defines the errors returned by a [`SearchStore`](crate::interfaces::SearchStore)
//! round trip, before they are given domain context.

use thiserror::Error;

/// Errors that can occur while talking to the document store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The request never produced a response (network, TLS, timeout).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store answered with a non-success status.
    #[error("Invalid response (status {status}): {body}")]
    InvalidResponse { status: u16, body: String },

    /// The addressed index or alias does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to serialize a request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an invalid response error from a status code and response body.
    pub fn invalid_response(status: u16, body: impl Into<String>) -> Self {
        Self::InvalidResponse {
            status,
            body: body.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the error means the addressed resource is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::InvalidResponse { status: 404, .. }
        )
    }
}

impl From<opensearch::Error> for StoreError {
    fn from(err: opensearch::Error) -> Self {
        Self::ConnectionError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
