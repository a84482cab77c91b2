//! Metrics service for recording classification outcomes.
//!
//! A durable, append-only record of every polarity decision that resulted
//! in a successful label assignment, with aggregate count queries. Records
//! are never mutated or deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::Polarity;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Aggregate counts over all recorded polarities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolarityCounts {
    pub total: u64,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl PolarityCounts {
    /// Count for a single polarity.
    pub fn count(&self, polarity: Polarity) -> u64 {
        match polarity {
            Polarity::Positive => self.positive,
            Polarity::Neutral => self.neutral,
            Polarity::Negative => self.negative,
        }
    }
}

/// Storage trait for metrics persistence.
#[async_trait]
pub trait MetricsStorage: Send + Sync {
    /// Appends one classification outcome.
    async fn append(&self, recorded_at: DateTime<Utc>, polarity: Polarity) -> MetricsResult<()>;

    /// Returns the total count and per-polarity counts.
    async fn counts(&self) -> MetricsResult<PolarityCounts>;
}

/// Service for recording and aggregating classification outcomes.
pub struct MetricsService<S: MetricsStorage> {
    storage: S,
}

impl<S: MetricsStorage> MetricsService<S> {
    /// Creates a new metrics service.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Records a polarity with the current wall-clock time.
    ///
    /// Safe to call from concurrent notification-processing tasks; ordering
    /// of timestamps across tasks is not guaranteed.
    pub async fn record(&self, polarity: Polarity) -> MetricsResult<()> {
        self.storage.append(Utc::now(), polarity).await
    }

    /// Returns aggregate counts. Read-only with respect to writers.
    pub async fn aggregate(&self) -> MetricsResult<PolarityCounts> {
        self.storage.counts().await
    }

    /// Formats counts as a human-readable report.
    pub fn format_report(counts: &PolarityCounts) -> String {
        let mut report = String::from("---Polarity Counts---\n");
        report.push_str(&format!("Total: {}\n", counts.total));
        for polarity in Polarity::ALL {
            report.push_str(&format!("{}: {}\n", polarity, counts.count(polarity)));
        }
        report
    }
}
