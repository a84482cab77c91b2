//! Sentiment polarity types and weighted classification signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical sentiment outcome for a text or a whole mail item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Neutral,
    Negative,
}

impl Polarity {
    /// All polarity values, in display order.
    pub const ALL: [Polarity; 3] = [Polarity::Positive, Polarity::Neutral, Polarity::Negative];

    /// Stable string form, used for label mapping and metrics rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Neutral => "neutral",
            Polarity::Negative => "negative",
        }
    }

    /// Numeric contribution of a per-text polarity to a weighted score.
    pub fn contribution(&self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Neutral => 0.0,
            Polarity::Negative => -1.0,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Polarity {
    type Err = UnknownPolarity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Ok(Polarity::Positive),
            "neutral" => Ok(Polarity::Neutral),
            "negative" | "neg" => Ok(Polarity::Negative),
            _ => Err(UnknownPolarity(s.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized polarity string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown polarity: {0}")]
pub struct UnknownPolarity(pub String);

/// The aggregate decision for one mail item: the categorical polarity plus
/// the weighted score that produced it. Only the categorical value is
/// persisted; the score exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarityDecision {
    pub polarity: Polarity,
    pub score: f64,
}

/// One weighted text source contributing to an aggregate polarity decision
/// (e.g. the subject line, or a snippet of the body).
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub text: String,
    pub weight: f64,
}

impl Signal {
    pub fn new(text: impl Into<String>, weight: f64) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }

    /// Signals with empty text are skipped by the aggregator.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
