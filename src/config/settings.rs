//! Pipeline settings and configuration types.
//!
//! Settings are loaded from a JSON file at startup and validated before any
//! component is constructed. A validation failure is fatal at startup; no
//! configuration error can surface mid-pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::Polarity;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Classification backend selection.
    pub classifier: ClassifierSettings,
    /// Polarity to label-name mapping.
    pub labels: LabelSettings,
    /// Weights for the text signals taken from each mail.
    pub signals: SignalSettings,
    /// Score thresholds for the aggregate decision.
    pub aggregation: AggregationSettings,
    /// Metrics database location.
    pub metrics: MetricsSettings,
    /// Gmail API access.
    pub gmail: GmailSettings,
    /// Pub/Sub subscription the listener pulls from.
    pub subscription: SubscriptionSettings,
}

/// Classification backend tag. Selection is a configuration-time choice;
/// each tag maps to one `TextClassifier` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Built-in wordlist scorer, no external service required.
    #[default]
    Lexicon,
    /// HTTP model server exposing `POST /predict`.
    Remote,
}

/// Classification backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Which backend to construct.
    pub backend: Backend,
    /// Base URL of the model server (remote backend only).
    pub endpoint: Option<String>,
    /// Per-request timeout for remote classification.
    pub request_timeout_secs: u64,
}

impl ClassifierSettings {
    pub fn timeout(&self) -> std::time::Duration {
        let secs = if self.request_timeout_secs == 0 {
            10
        } else {
            self.request_timeout_secs
        };
        std::time::Duration::from_secs(secs)
    }
}

/// Names of the labels applied per polarity, plus cache behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    pub positive: String,
    pub neutral: String,
    pub negative: String,
    /// Cache name to label-id resolutions across notifications.
    pub cache_enabled: bool,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            positive: "positive".to_string(),
            neutral: "neutral".to_string(),
            negative: "negative".to_string(),
            cache_enabled: true,
        }
    }
}

impl LabelSettings {
    /// Resolves the configured label name for a polarity.
    pub fn name_for(&self, polarity: Polarity) -> &str {
        match polarity {
            Polarity::Positive => &self.positive,
            Polarity::Neutral => &self.neutral,
            Polarity::Negative => &self.negative,
        }
    }
}

/// Relative trust in each text source. The snippet carries more weight than
/// the subject since it usually contains more information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub subject_weight: f64,
    pub snippet_weight: f64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            subject_weight: 0.3,
            snippet_weight: 0.7,
        }
    }
}

/// Symmetric score thresholds for the aggregate polarity decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Score at or above this is positive.
    pub positive_threshold: f64,
    /// Score at or below this is negative.
    pub negative_threshold: f64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            positive_threshold: 0.5,
            negative_threshold: -0.5,
        }
    }
}

/// Metrics database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("mailtone.db"),
        }
    }
}

/// Gmail API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailSettings {
    /// Path of a JSON file with OAuth client id/secret and refresh token.
    pub credentials_path: PathBuf,
    /// Per-request timeout for Gmail API calls.
    pub request_timeout_secs: u64,
    /// Pub/Sub topic that `users.watch` publishes to, as a full resource
    /// name (`projects/{project}/topics/{topic}`). Watch renewal is skipped
    /// when unset.
    pub watch_topic: Option<String>,
}

impl GmailSettings {
    pub fn timeout(&self) -> std::time::Duration {
        let secs = if self.request_timeout_secs == 0 {
            30
        } else {
            self.request_timeout_secs
        };
        std::time::Duration::from_secs(secs)
    }
}

/// Pub/Sub pull subscription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionSettings {
    /// Full subscription resource name
    /// (`projects/{project}/subscriptions/{name}`).
    pub subscription: String,
    /// Maximum messages per pull request.
    pub max_messages: u32,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            subscription: String::new(),
            max_messages: 10,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Validates the settings. Called once at startup; any error here is
    /// fatal and the process must not proceed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signals.subject_weight < 0.0 || self.signals.snippet_weight < 0.0 {
            return Err(ConfigError::Invalid(
                "signal weights must be non-negative".to_string(),
            ));
        }

        if self.aggregation.positive_threshold <= 0.0 {
            return Err(ConfigError::Invalid(
                "positive_threshold must be greater than zero".to_string(),
            ));
        }
        if self.aggregation.negative_threshold >= 0.0 {
            return Err(ConfigError::Invalid(
                "negative_threshold must be less than zero".to_string(),
            ));
        }

        for polarity in Polarity::ALL {
            if self.labels.name_for(polarity).trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "no label name configured for polarity '{}'",
                    polarity
                )));
            }
        }

        if self.classifier.backend == Backend::Remote && self.classifier.endpoint.is_none() {
            return Err(ConfigError::Invalid(
                "remote classifier backend requires an endpoint".to_string(),
            ));
        }

        Ok(())
    }
}
