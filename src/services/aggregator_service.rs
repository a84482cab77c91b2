//! Sentiment aggregator.
//!
//! Combines multiple weighted text signals into one polarity decision by
//! classifying each signal with the configured backend and summing weighted
//! contributions (+1 positive, 0 neutral, -1 negative).
//!
//! Empty-text signals are skipped without renormalizing the remaining
//! weights. A heavily-weighted empty signal therefore biases the score
//! toward neutral; this matches the intended weighting of sources and is
//! pinned by tests rather than corrected.

use std::sync::Arc;

use thiserror::Error;

use crate::config::AggregationSettings;
use crate::domain::{Polarity, PolarityDecision, Signal};
use crate::providers::classifier::TextClassifier;

/// Errors that can occur during aggregation.
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// No signal produced a usable per-text polarity.
    #[error("no usable signal for classification")]
    NoSignal,
}

/// Combines weighted per-text polarities into one decision.
pub struct AggregatorService {
    classifier: Arc<dyn TextClassifier>,
    settings: AggregationSettings,
}

impl AggregatorService {
    /// Creates a new aggregator over a classification backend.
    pub fn new(classifier: Arc<dyn TextClassifier>, settings: AggregationSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    /// Classifies a set of weighted signals.
    ///
    /// Signals with empty text are skipped entirely. A signal whose backend
    /// call fails is skipped with a warning; if zero signals yield a
    /// polarity the aggregation fails with [`AggregatorError::NoSignal`].
    pub async fn classify(&self, signals: &[Signal]) -> Result<PolarityDecision, AggregatorError> {
        let mut score = 0.0;
        let mut usable = 0usize;

        for signal in signals {
            if signal.is_empty() {
                continue;
            }

            match self.classifier.classify_text(&signal.text).await {
                Ok(polarity) => {
                    score += polarity.contribution() * signal.weight;
                    usable += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        backend = self.classifier.name(),
                        error = %e,
                        "classifier backend failed for signal, skipping"
                    );
                }
            }
        }

        if usable == 0 {
            return Err(AggregatorError::NoSignal);
        }

        let polarity = self.threshold(score);
        Ok(PolarityDecision { polarity, score })
    }

    /// Maps a weighted score onto a categorical polarity.
    fn threshold(&self, score: f64) -> Polarity {
        if score >= self.settings.positive_threshold {
            Polarity::Positive
        } else if score <= self.settings.negative_threshold {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }
}
