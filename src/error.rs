//! Error types for Nova.

use thiserror::Error;

/// Library-level error type for Nova operations.
#[derive(Error, Debug)]
pub enum NovaError {
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Transcript extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Translation incomplete: {0}")]
    TranslationIncomplete(String),

    #[error("Index corruption: {0}")]
    IndexCorruption(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

impl NovaError {
    /// Whether a bounded retry with backoff may succeed.
    ///
    /// Only transient provider failures qualify; validation and
    /// configuration errors are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NovaError::RateLimited(_) | NovaError::Http(_))
    }
}

/// Result type alias for Nova operations.
pub type Result<T> = std::result::Result<T, NovaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(NovaError::RateLimited("quota".to_string()).is_retryable());
        assert!(!NovaError::InvalidInput("empty".to_string()).is_retryable());
        assert!(!NovaError::InvalidConfig("overlap".to_string()).is_retryable());
        assert!(!NovaError::ProviderUnavailable("down".to_string()).is_retryable());
    }
}
