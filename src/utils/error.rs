//! Error handling for anisource

use thiserror::Error;

/// Main error type for sources, extractors and the shared plumbing
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Livewire error: {0}")]
    Livewire(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn parse(msg: impl Into<String>) -> Self {
        SourceError::Parse(msg.into())
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::InvalidUrl(err.to_string())
    }
}
