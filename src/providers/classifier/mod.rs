//! Sentiment classification backends.
//!
//! Backend selection is a configuration-time choice: [`build`] maps the
//! configured [`Backend`] tag to one [`TextClassifier`] implementation.

mod lexicon;
mod remote;
mod traits;

use std::sync::Arc;

pub use lexicon::LexiconClassifier;
pub use remote::RemoteClassifier;
pub use traits::{ClassifierError, ClassifierResult, TextClassifier};

use crate::config::{Backend, ClassifierSettings, ConfigError};

/// Constructs the configured classifier backend.
pub fn build(settings: &ClassifierSettings) -> Result<Arc<dyn TextClassifier>, ConfigError> {
    match settings.backend {
        Backend::Lexicon => Ok(Arc::new(LexiconClassifier::new())),
        Backend::Remote => {
            let endpoint = settings.endpoint.as_ref().ok_or_else(|| {
                ConfigError::Invalid("remote classifier backend requires an endpoint".to_string())
            })?;
            Ok(Arc::new(RemoteClassifier::new(endpoint, settings.timeout())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lexicon_by_default() {
        let classifier = build(&ClassifierSettings::default()).unwrap();
        assert_eq!(classifier.name(), "lexicon");
    }

    #[test]
    fn builds_remote_with_endpoint() {
        let settings = ClassifierSettings {
            backend: Backend::Remote,
            endpoint: Some("http://localhost:5000".to_string()),
            request_timeout_secs: 5,
        };
        let classifier = build(&settings).unwrap();
        assert_eq!(classifier.name(), "remote");
    }

    #[test]
    fn remote_without_endpoint_fails() {
        let settings = ClassifierSettings {
            backend: Backend::Remote,
            endpoint: None,
            request_timeout_secs: 5,
        };
        assert!(build(&settings).is_err());
    }
}
