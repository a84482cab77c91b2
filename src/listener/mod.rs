//! Notification listener.
//!
//! Pulls push messages from a subscription and hands each one to the
//! pipeline in its own task, so one slow message never delays the rest.
//!
//! Messages are acknowledged before processing. The transport therefore
//! delivers each notification for at most one processing attempt; a crash
//! mid-pipeline loses that notification rather than redelivering it. The
//! pipeline tolerates this because a later notification for the same
//! mailbox re-resolves the history and labeling is idempotent.

mod pubsub;

pub use pubsub::PubSubSource;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::providers::mail::MailProvider;
use crate::services::{MetricsStorage, PipelineService};

/// Delay between polls when the subscription had nothing to deliver.
const IDLE_DELAY: Duration = Duration::from_millis(500);

/// Delay before retrying after a failed pull.
const ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// One message as delivered by the push transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Transport receipt used to acknowledge delivery.
    pub ack_id: String,
    /// Raw notification payload.
    pub data: Vec<u8>,
}

/// Trait for push-message transports.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Waits for and returns the next batch of messages. An empty batch is
    /// a normal outcome of a pull deadline expiring.
    async fn pull(&self) -> anyhow::Result<Vec<PushMessage>>;

    /// Acknowledges one message so the transport stops redelivering it.
    async fn ack(&self, ack_id: &str) -> anyhow::Result<()>;
}

/// Pull loop connecting a [`NotificationSource`] to the pipeline.
pub struct Listener<P, S, N>
where
    P: MailProvider + 'static,
    S: MetricsStorage + 'static,
    N: NotificationSource,
{
    pipeline: Arc<PipelineService<P, S>>,
    source: N,
    running: AtomicBool,
}

impl<P, S, N> Listener<P, S, N>
where
    P: MailProvider + 'static,
    S: MetricsStorage + 'static,
    N: NotificationSource,
{
    pub fn new(pipeline: Arc<PipelineService<P, S>>, source: N) -> Self {
        Self {
            pipeline,
            source,
            running: AtomicBool::new(true),
        }
    }

    /// Signals the pull loop to exit after the current iteration. Tasks
    /// already spawned for in-flight messages run to completion.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Runs the pull loop until [`stop`](Self::stop) is called.
    pub async fn run(self: Arc<Self>) {
        tracing::info!("listener started");

        while self.running.load(Ordering::SeqCst) {
            let messages = match self.source.pull().await {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!(error = %e, "pull failed, backing off");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            if messages.is_empty() {
                tokio::time::sleep(IDLE_DELAY).await;
                continue;
            }

            tracing::debug!(count = messages.len(), "pulled notifications");

            for message in messages {
                // Ack first: at most one processing attempt per message.
                if let Err(e) = self.source.ack(&message.ack_id).await {
                    tracing::warn!(error = %e, "failed to ack message");
                }

                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move {
                    pipeline.process_notification(&message.data).await;
                });
            }
        }

        tracing::info!("listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregationSettings, LabelSettings, SignalSettings};
    use crate::domain::{HistoryMarker, LabelId, MailId, Polarity};
    use crate::providers::classifier::{ClassifierResult, TextClassifier};
    use crate::providers::mail::{LabelInfo, MessageContent, Result as ProviderResult};
    use crate::services::{
        AggregatorService, LabelService, MetricsResult, MetricsService, PolarityCounts,
        ResolverService,
    };
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    /// Provider recording which markers were resolved; all histories empty.
    struct RecordingProvider {
        markers: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailProvider for RecordingProvider {
        async fn history_added_messages(
            &self,
            marker: &HistoryMarker,
        ) -> ProviderResult<Vec<MailId>> {
            self.markers.lock().unwrap().push(marker.to_string());
            Ok(vec![])
        }
        async fn get_message(&self, _id: &MailId) -> ProviderResult<MessageContent> {
            unreachable!()
        }
        async fn list_labels(&self) -> ProviderResult<Vec<LabelInfo>> {
            unreachable!()
        }
        async fn create_label(&self, _name: &str) -> ProviderResult<LabelInfo> {
            unreachable!()
        }
        async fn modify_message_labels(
            &self,
            _id: &MailId,
            _add: &[LabelId],
            _remove: &[LabelId],
        ) -> ProviderResult<()> {
            unreachable!()
        }
    }

    struct NeutralClassifier;

    #[async_trait]
    impl TextClassifier for NeutralClassifier {
        fn name(&self) -> &str {
            "neutral"
        }
        async fn classify_text(&self, _text: &str) -> ClassifierResult<Polarity> {
            Ok(Polarity::Neutral)
        }
    }

    struct NullStorage;

    #[async_trait]
    impl MetricsStorage for NullStorage {
        async fn append(&self, _at: DateTime<Utc>, _polarity: Polarity) -> MetricsResult<()> {
            Ok(())
        }
        async fn counts(&self) -> MetricsResult<PolarityCounts> {
            Ok(PolarityCounts::default())
        }
    }

    /// Source delivering one scripted batch, then empty batches.
    struct OneBatchSource {
        batch: Mutex<Vec<PushMessage>>,
        acks: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSource for OneBatchSource {
        async fn pull(&self) -> anyhow::Result<Vec<PushMessage>> {
            Ok(std::mem::take(&mut *self.batch.lock().unwrap()))
        }
        async fn ack(&self, ack_id: &str) -> anyhow::Result<()> {
            self.acks.lock().unwrap().push(ack_id.to_string());
            Ok(())
        }
    }

    fn pipeline(
        provider: Arc<RecordingProvider>,
    ) -> Arc<PipelineService<RecordingProvider, NullStorage>> {
        Arc::new(PipelineService::new(
            provider.clone(),
            ResolverService::new(provider.clone()),
            AggregatorService::new(Arc::new(NeutralClassifier), AggregationSettings::default()),
            LabelService::new(provider, LabelSettings::default()),
            MetricsService::new(NullStorage),
            SignalSettings::default(),
        ))
    }

    #[tokio::test]
    async fn acks_and_dispatches_every_message() {
        let provider = Arc::new(RecordingProvider {
            markers: Mutex::new(Vec::new()),
        });
        let source = OneBatchSource {
            batch: Mutex::new(vec![
                PushMessage {
                    ack_id: "a1".to_string(),
                    data: br#"{"historyId":100}"#.to_vec(),
                },
                PushMessage {
                    ack_id: "a2".to_string(),
                    data: br#"{"historyId":101}"#.to_vec(),
                },
                PushMessage {
                    ack_id: "a3".to_string(),
                    data: b"garbage".to_vec(),
                },
            ]),
            acks: Mutex::new(Vec::new()),
        };

        let listener = Arc::new(Listener::new(pipeline(provider.clone()), source));
        let handle = tokio::spawn(Arc::clone(&listener).run());

        tokio::time::sleep(Duration::from_millis(200)).await;
        listener.stop();
        handle.await.unwrap();

        // Every message was acked, including the unparseable one.
        let mut acks = listener.source.acks.lock().unwrap().clone();
        acks.sort();
        assert_eq!(acks, vec!["a1", "a2", "a3"]);

        // Both valid notifications reached the pipeline.
        let mut markers = provider.markers.lock().unwrap().clone();
        markers.sort();
        assert_eq!(markers, vec!["100", "101"]);
    }

    #[tokio::test]
    async fn stop_exits_the_loop() {
        let provider = Arc::new(RecordingProvider {
            markers: Mutex::new(Vec::new()),
        });
        let source = OneBatchSource {
            batch: Mutex::new(Vec::new()),
            acks: Mutex::new(Vec::new()),
        };

        let listener = Arc::new(Listener::new(pipeline(provider), source));
        let handle = tokio::spawn(Arc::clone(&listener).run());

        listener.stop();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
