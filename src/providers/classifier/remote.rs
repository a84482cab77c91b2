//! HTTP model-server classifier backend.
//!
//! Sends each text to a sentiment model served over HTTP
//! (`POST {endpoint}/predict` with `{"text": ...}`, answering
//! `{"polarity": "positive" | "neutral" | "negative"}`). The model itself is
//! trained and served elsewhere; this backend only speaks the wire format.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{ClassifierError, ClassifierResult, TextClassifier};
use crate::domain::Polarity;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    polarity: String,
}

/// Classifier backed by a remote model server.
pub struct RemoteClassifier {
    endpoint: String,
    client: reqwest::Client,
}

impl RemoteClassifier {
    /// Creates a backend against a model server base URL. Every request is
    /// bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Overrides the HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl TextClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    async fn classify_text(&self, text: &str) -> ClassifierResult<Polarity> {
        let url = format!("{}/predict", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&PredictRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Unavailable(format!(
                "model server returned {}: {}",
                status, body
            )));
        }

        let prediction: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        prediction
            .polarity
            .parse()
            .map_err(|e: crate::domain::UnknownPolarity| {
                ClassifierError::InvalidResponse(e.to_string())
            })
    }
}

impl std::fmt::Debug for RemoteClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClassifier")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
