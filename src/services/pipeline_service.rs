//! Notification pipeline orchestrator.
//!
//! Drives one notification end to end: resolve the history marker to a new
//! mail id, fetch the message's text signals, aggregate them into a polarity
//! decision, assign the matching label, and append a metrics record. Each
//! stage that finds nothing to do short-circuits the rest.
//!
//! Notifications are independent; the listener runs one pipeline invocation
//! per notification, concurrently. Metrics are recorded only after label
//! assignment succeeds, so every record corresponds to a labeled message. A
//! metrics failure after labeling leaves the label in place and surfaces as
//! an error.

use std::sync::Arc;

use thiserror::Error;

use crate::config::SignalSettings;
use crate::domain::{MailId, Notification, Polarity, Signal};
use crate::providers::mail::MailProvider;
use crate::services::{
    AggregatorError, AggregatorService, LabelError, LabelService, MetricsError, MetricsService,
    MetricsStorage, ResolverService,
};

/// Errors that abort a pipeline run after work has started.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The message had no classifiable text.
    #[error(transparent)]
    Aggregation(#[from] AggregatorError),

    /// Label resolution or assignment failed.
    #[error(transparent)]
    Label(#[from] LabelError),

    /// The outcome was labeled but could not be recorded.
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// How a pipeline run ended. All variants are normal terminations.
#[derive(Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The message was classified and labeled.
    Labeled { mail_id: MailId, polarity: Polarity },
    /// The notification did not resolve to a new message.
    NoNewMail,
    /// The message content could not be fetched.
    ContentUnavailable,
}

/// Runs the full notification-to-label pipeline.
pub struct PipelineService<P: MailProvider, S: MetricsStorage> {
    provider: Arc<P>,
    resolver: ResolverService<P>,
    aggregator: AggregatorService,
    labels: LabelService<P>,
    metrics: MetricsService<S>,
    signals: SignalSettings,
}

impl<P: MailProvider, S: MetricsStorage> PipelineService<P, S> {
    pub fn new(
        provider: Arc<P>,
        resolver: ResolverService<P>,
        aggregator: AggregatorService,
        labels: LabelService<P>,
        metrics: MetricsService<S>,
        signals: SignalSettings,
    ) -> Self {
        Self {
            provider,
            resolver,
            aggregator,
            labels,
            metrics,
            signals,
        }
    }

    /// Entry point for the listener: parses raw notification bytes and runs
    /// the pipeline, logging the outcome. Never fails the caller; a bad
    /// payload or a failed run only produces log output.
    pub async fn process_notification(&self, raw: &[u8]) {
        let notification = match Notification::parse(raw) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unparseable notification");
                return;
            }
        };

        match self.process(&notification).await {
            Ok(PipelineOutcome::Labeled { mail_id, polarity }) => {
                tracing::info!(%mail_id, %polarity, "labeled message");
            }
            Ok(PipelineOutcome::NoNewMail) => {
                tracing::debug!(marker = %notification.marker, "no new mail");
            }
            Ok(PipelineOutcome::ContentUnavailable) => {
                tracing::info!(marker = %notification.marker, "message content unavailable");
            }
            Err(PipelineError::Aggregation(e)) => {
                tracing::warn!(marker = %notification.marker, error = %e, "classification skipped");
            }
            Err(e) => {
                tracing::error!(marker = %notification.marker, error = %e, "pipeline failed");
            }
        }
    }

    /// Runs the pipeline for one parsed notification.
    pub async fn process(
        &self,
        notification: &Notification,
    ) -> Result<PipelineOutcome, PipelineError> {
        let Some(mail_id) = self.resolver.resolve(&notification.marker).await else {
            return Ok(PipelineOutcome::NoNewMail);
        };

        let content = match self.provider.get_message(&mail_id).await {
            Ok(content) => content,
            Err(e) => {
                tracing::info!(%mail_id, error = %e, "could not fetch message");
                return Ok(PipelineOutcome::ContentUnavailable);
            }
        };

        let signals = [
            Signal::new(
                content.subject.as_deref().unwrap_or(""),
                self.signals.subject_weight,
            ),
            Signal::new(&content.snippet, self.signals.snippet_weight),
        ];

        let decision = self.aggregator.classify(&signals).await?;
        tracing::debug!(
            %mail_id,
            polarity = %decision.polarity,
            score = decision.score,
            "classified message"
        );

        self.labels.assign(&mail_id, decision.polarity).await?;
        self.metrics.record(decision.polarity).await?;

        Ok(PipelineOutcome::Labeled {
            mail_id,
            polarity: decision.polarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregationSettings, LabelSettings};
    use crate::providers::classifier::{ClassifierResult, TextClassifier};
    use crate::providers::mail::{LabelInfo, MessageContent, ProviderError, Result};
    use crate::services::PolarityCounts;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    /// Scripted provider covering every trait method the pipeline touches.
    struct ScriptedProvider {
        history: Result<Vec<MailId>>,
        message: Option<Result<MessageContent>>,
        labels: Mutex<Vec<LabelInfo>>,
        modifications: Mutex<Vec<(MailId, LabelId)>>,
    }

    use crate::domain::{HistoryMarker, LabelId};

    impl ScriptedProvider {
        fn with_message(mail_id: &str, subject: Option<&str>, snippet: &str) -> Self {
            Self {
                history: Ok(vec![MailId::from(mail_id)]),
                message: Some(Ok(MessageContent {
                    subject: subject.map(String::from),
                    snippet: snippet.to_string(),
                })),
                labels: Mutex::new(Vec::new()),
                modifications: Mutex::new(Vec::new()),
            }
        }

        fn empty_history() -> Self {
            Self {
                history: Ok(vec![]),
                message: None,
                labels: Mutex::new(Vec::new()),
                modifications: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MailProvider for ScriptedProvider {
        async fn history_added_messages(&self, _marker: &HistoryMarker) -> Result<Vec<MailId>> {
            match &self.history {
                Ok(ids) => Ok(ids.clone()),
                Err(_) => Err(ProviderError::Connection("scripted".to_string())),
            }
        }

        async fn get_message(&self, _id: &MailId) -> Result<MessageContent> {
            match &self.message {
                Some(Ok(content)) => Ok(content.clone()),
                Some(Err(_)) => Err(ProviderError::NotFound("scripted".to_string())),
                None => unreachable!("pipeline should not fetch content"),
            }
        }

        async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
            Ok(self.labels.lock().unwrap().clone())
        }

        async fn create_label(&self, name: &str) -> Result<LabelInfo> {
            let info = LabelInfo {
                id: LabelId::from(format!("Label_{name}").as_str()),
                name: name.to_string(),
            };
            self.labels.lock().unwrap().push(info.clone());
            Ok(info)
        }

        async fn modify_message_labels(
            &self,
            id: &MailId,
            add: &[LabelId],
            _remove: &[LabelId],
        ) -> Result<()> {
            let mut mods = self.modifications.lock().unwrap();
            for label in add {
                mods.push((id.clone(), label.clone()));
            }
            Ok(())
        }
    }

    struct KeywordClassifier;

    #[async_trait]
    impl TextClassifier for KeywordClassifier {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn classify_text(&self, text: &str) -> ClassifierResult<Polarity> {
            if text.contains("good") {
                Ok(Polarity::Positive)
            } else if text.contains("bad") {
                Ok(Polarity::Negative)
            } else {
                Ok(Polarity::Neutral)
            }
        }
    }

    #[derive(Clone)]
    struct VecStorage {
        rows: Arc<Mutex<Vec<Polarity>>>,
    }

    impl VecStorage {
        fn new() -> Self {
            Self {
                rows: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl MetricsStorage for VecStorage {
        async fn append(
            &self,
            _recorded_at: DateTime<Utc>,
            polarity: Polarity,
        ) -> crate::services::MetricsResult<()> {
            self.rows.lock().unwrap().push(polarity);
            Ok(())
        }

        async fn counts(&self) -> crate::services::MetricsResult<PolarityCounts> {
            let rows = self.rows.lock().unwrap();
            Ok(PolarityCounts {
                total: rows.len() as u64,
                positive: rows.iter().filter(|p| **p == Polarity::Positive).count() as u64,
                neutral: rows.iter().filter(|p| **p == Polarity::Neutral).count() as u64,
                negative: rows.iter().filter(|p| **p == Polarity::Negative).count() as u64,
            })
        }
    }

    fn pipeline(
        provider: Arc<ScriptedProvider>,
        storage: VecStorage,
    ) -> PipelineService<ScriptedProvider, VecStorage> {
        PipelineService::new(
            provider.clone(),
            ResolverService::new(provider.clone()),
            AggregatorService::new(Arc::new(KeywordClassifier), AggregationSettings::default()),
            LabelService::new(provider, LabelSettings::default()),
            MetricsService::new(storage),
            SignalSettings::default(),
        )
    }

    #[tokio::test]
    async fn labels_and_records_positive_message() {
        let provider = Arc::new(ScriptedProvider::with_message(
            "abc",
            Some("good news"),
            "good results all around",
        ));
        let storage = VecStorage::new();
        let pipeline = pipeline(provider.clone(), storage.clone());

        let outcome = pipeline
            .process(&Notification::from_marker("100"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PipelineOutcome::Labeled {
                mail_id: MailId::from("abc"),
                polarity: Polarity::Positive,
            }
        );
        assert_eq!(
            provider.modifications.lock().unwrap().as_slice(),
            &[(MailId::from("abc"), LabelId::from("Label_positive"))]
        );
        assert_eq!(storage.rows.lock().unwrap().as_slice(), &[Polarity::Positive]);
    }

    #[tokio::test]
    async fn missing_subject_still_classifies_on_snippet() {
        let provider = Arc::new(ScriptedProvider::with_message("abc", None, "bad outage"));
        let storage = VecStorage::new();
        let pipeline = pipeline(provider, storage.clone());

        let outcome = pipeline
            .process(&Notification::from_marker("100"))
            .await
            .unwrap();

        // Snippet alone contributes -0.7, past the negative threshold.
        assert!(matches!(
            outcome,
            PipelineOutcome::Labeled {
                polarity: Polarity::Negative,
                ..
            }
        ));
        assert_eq!(storage.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_new_mail_records_nothing() {
        let provider = Arc::new(ScriptedProvider::empty_history());
        let storage = VecStorage::new();
        let pipeline = pipeline(provider.clone(), storage.clone());

        let outcome = pipeline
            .process(&Notification::from_marker("200"))
            .await
            .unwrap();

        assert_eq!(outcome, PipelineOutcome::NoNewMail);
        assert!(provider.modifications.lock().unwrap().is_empty());
        assert!(storage.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfetchable_message_is_not_an_error() {
        let provider = Arc::new(ScriptedProvider {
            history: Ok(vec![MailId::from("gone")]),
            message: Some(Err(ProviderError::NotFound("gone".to_string()))),
            labels: Mutex::new(Vec::new()),
            modifications: Mutex::new(Vec::new()),
        });
        let storage = VecStorage::new();
        let pipeline = pipeline(provider, storage.clone());

        let outcome = pipeline
            .process(&Notification::from_marker("300"))
            .await
            .unwrap();

        assert_eq!(outcome, PipelineOutcome::ContentUnavailable);
        assert!(storage.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_texts_surface_no_signal() {
        let provider = Arc::new(ScriptedProvider::with_message("abc", None, ""));
        let storage = VecStorage::new();
        let pipeline = pipeline(provider.clone(), storage.clone());

        let result = pipeline.process(&Notification::from_marker("400")).await;

        assert!(matches!(
            result,
            Err(PipelineError::Aggregation(AggregatorError::NoSignal))
        ));
        assert!(provider.modifications.lock().unwrap().is_empty());
        assert!(storage.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn process_notification_swallows_bad_payloads() {
        let provider = Arc::new(ScriptedProvider::empty_history());
        let pipeline = pipeline(provider, VecStorage::new());

        // Must not panic or error.
        pipeline.process_notification(b"not json").await;
        pipeline.process_notification(b"{}").await;
    }
}
