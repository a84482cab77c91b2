//! Google Cloud Pub/Sub pull source.
//!
//! Pulls from the subscription the Gmail watch publishes to, over the
//! Pub/Sub REST API. Message payloads arrive base64-encoded and are
//! decoded here; the listener and pipeline only see raw bytes.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{NotificationSource, PushMessage};
use crate::config::SubscriptionSettings;
use crate::providers::mail::TokenSource;

const PUBSUB_API_BASE: &str = "https://pubsub.googleapis.com/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    max_messages: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceivedMessage {
    ack_id: String,
    message: PubsubMessage,
}

#[derive(Debug, Deserialize)]
struct PubsubMessage {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest<'a> {
    ack_ids: &'a [&'a str],
}

/// Pull subscription client.
pub struct PubSubSource {
    client: reqwest::Client,
    tokens: Arc<TokenSource>,
    settings: SubscriptionSettings,
}

impl PubSubSource {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<TokenSource>,
        settings: SubscriptionSettings,
    ) -> Self {
        Self {
            client,
            tokens,
            settings,
        }
    }

    /// POSTs to a subscription method, retrying once with a fresh token
    /// on 401.
    async fn post<B: Serialize>(&self, method: &str, body: &B) -> anyhow::Result<reqwest::Response> {
        let url = format!(
            "{}/{}:{}",
            PUBSUB_API_BASE, self.settings.subscription, method
        );

        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("pubsub {} request failed", method))?;

        let response = if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            let token = self.tokens.refresh().await?;
            self.client
                .post(&url)
                .bearer_auth(&token)
                .json(body)
                .send()
                .await
                .with_context(|| format!("pubsub {} request failed", method))?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("pubsub {} failed ({}): {}", method, status, body);
        }
        Ok(response)
    }
}

#[async_trait]
impl NotificationSource for PubSubSource {
    async fn pull(&self) -> anyhow::Result<Vec<PushMessage>> {
        let response = self
            .post(
                "pull",
                &PullRequest {
                    max_messages: self.settings.max_messages,
                },
            )
            .await?;

        let parsed: PullResponse = response
            .json()
            .await
            .context("parse pubsub pull response")?;

        let mut messages = Vec::with_capacity(parsed.received_messages.len());
        for received in parsed.received_messages {
            let data = match received.message.data {
                Some(encoded) => base64::engine::general_purpose::STANDARD
                    .decode(&encoded)
                    .context("decode pubsub message data")?,
                None => Vec::new(),
            };
            messages.push(PushMessage {
                ack_id: received.ack_id,
                data,
            });
        }
        Ok(messages)
    }

    async fn ack(&self, ack_id: &str) -> anyhow::Result<()> {
        self.post("acknowledge", &AcknowledgeRequest { ack_ids: &[ack_id] })
            .await?;
        Ok(())
    }
}
