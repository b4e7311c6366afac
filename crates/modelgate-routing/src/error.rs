//! Error types for modelgate-routing

use thiserror::Error;

/// Routing error type
#[derive(Debug, Error)]
pub enum Error {
    /// Cache backend failure
    #[error("cache error: {0}")]
    Cache(String),

    /// Malformed registry or classifier configuration
    #[error("config error: {0}")]
    Config(String),

    /// Classifier transport failure
    #[error("classifier error: {0}")]
    Classifier(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
