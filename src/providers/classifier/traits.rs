//! Text classifier trait and supporting types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Polarity;

/// Errors that can occur during text classification.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("backend not available: {0}")]
    Unavailable(String),
}

/// Result type for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Trait for sentiment classification backends.
///
/// The pipeline is agnostic to backend identity; selection happens once at
/// configuration time through the module factory.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Returns the backend's name (e.g. "lexicon", "remote").
    fn name(&self) -> &str;

    /// Classifies the polarity of a single text.
    async fn classify_text(&self, text: &str) -> ClassifierResult<Polarity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ClassifierError::Unavailable("model server down".to_string());
        assert!(err.to_string().contains("model server down"));
    }
}
