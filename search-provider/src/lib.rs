//! # Search Provider
//!
//! Start-up library for the search provider.
//!
//! This crate reads the provider configuration from the environment, wires
//! the OpenSearch store into a provider, verifies the connection and makes
//! sure every configured document type has an active alias.

pub mod config;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during start-up.
#[derive(Error, Debug)]
pub enum StartupError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_provider_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StartupError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
