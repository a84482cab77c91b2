//! Gmail API provider implementation.
//!
//! This module provides a [`MailProvider`] implementation over the Gmail
//! REST API v1:
//! - `users.history.list` for resolving change notifications
//! - `users.messages.get` (metadata format) for subject and snippet
//! - `users.labels.list` / `users.labels.create` for label resolution
//! - `users.messages.modify` for label assignment
//! - `users.watch` for push-notification renewal
//!
//! Authentication uses a shared [`TokenSource`]; a 401 response triggers a
//! single token refresh and retry of the failed request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::auth::TokenSource;
use super::traits::{LabelInfo, MailProvider, MessageContent, ProviderError, Result};
use crate::domain::{HistoryMarker, LabelId, MailId};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail history list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryListResponse {
    history: Option<Vec<GmailHistory>>,
    #[allow(dead_code)]
    history_id: Option<String>,
}

/// Gmail history record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailHistory {
    messages_added: Option<Vec<GmailHistoryMessage>>,
}

/// Gmail history message reference.
#[derive(Debug, Deserialize)]
struct GmailHistoryMessage {
    message: GmailHistoryMessageRef,
}

#[derive(Debug, Deserialize)]
struct GmailHistoryMessageRef {
    id: String,
}

/// Gmail API message (metadata format).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    snippet: Option<String>,
    payload: Option<GmailMessagePayload>,
}

#[derive(Debug, Deserialize)]
struct GmailMessagePayload {
    headers: Option<Vec<GmailHeader>>,
}

#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail API label.
#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
}

/// Gmail labels list response.
#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    labels: Option<Vec<GmailLabel>>,
}

/// Gmail label create request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLabelRequest<'a> {
    name: &'a str,
    label_list_visibility: &'static str,
    message_list_visibility: &'static str,
}

/// Gmail message modify request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyRequest {
    add_label_ids: Vec<String>,
    remove_label_ids: Vec<String>,
}

/// Gmail watch request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchRequest<'a> {
    label_ids: Vec<&'static str>,
    topic_name: &'a str,
}

/// Gmail watch response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatchResponse {
    history_id: Option<String>,
    expiration: Option<String>,
}

/// Gmail API provider.
///
/// Cheap to clone; the HTTP client and token source are shared.
#[derive(Clone)]
pub struct GmailProvider {
    client: reqwest::Client,
    tokens: Arc<TokenSource>,
}

impl GmailProvider {
    /// Creates a new Gmail provider.
    ///
    /// The client should carry a request timeout; every call made here is a
    /// suspension point bounded by it.
    pub fn new(client: reqwest::Client, tokens: Arc<TokenSource>) -> Self {
        Self { client, tokens }
    }

    /// Re-arms push notifications for the inbox.
    ///
    /// Gmail expires a watch after seven days; this is called at startup
    /// and should be re-run at least daily by the operator.
    pub async fn watch_inbox(&self, topic: &str) -> Result<()> {
        let request = WatchRequest {
            label_ids: vec!["INBOX"],
            topic_name: topic,
        };
        let response: WatchResponse = self.post("/watch", &request).await?;
        tracing::info!(
            topic,
            history_id = ?response.history_id,
            expiration = ?response.expiration,
            "inbox watch renewed"
        );
        Ok(())
    }

    async fn auth_headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProviderError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let response = self.send(|headers| self.client.get(&url).headers(headers)).await?;
        Self::parse_body(response).await
    }

    /// Makes an authenticated POST request to the Gmail API.
    async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        let response = self
            .send(|mut headers| {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.client.post(&url).headers(headers).json(body)
            })
            .await?;
        Self::parse_body(response).await
    }

    /// Makes an authenticated POST request and discards the response body.
    async fn post_no_response<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<()> {
        let url = format!("{}{}", GMAIL_API_BASE, endpoint);
        self.send(|mut headers| {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            self.client.post(&url).headers(headers).json(body)
        })
        .await?;
        Ok(())
    }

    /// Sends a request, refreshing the access token and retrying once on a
    /// 401 response.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(HeaderMap) -> reqwest::RequestBuilder,
    {
        let token = self.tokens.token().await?;
        let headers = self.auth_headers(&token).await?;
        let response = build(headers)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let response = if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            let token = self.tokens.refresh().await?;
            let headers = self.auth_headers(&token).await?;
            build(headers)
                .send()
                .await
                .map_err(|e| ProviderError::Connection(e.to_string()))?
        } else {
            response
        };

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }
        Ok(response)
    }

    async fn parse_body<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse response: {}", e)))
    }

    /// Maps API error responses onto the provider error taxonomy.
    async fn handle_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => ProviderError::Authentication(format!("unauthorized: {}", body)),
            404 => ProviderError::NotFound(body),
            429 => ProviderError::RateLimited {
                retry_after_secs: None,
            },
            400 => ProviderError::InvalidRequest(body),
            _ => ProviderError::Internal(format!("API error ({}): {}", status, body)),
        }
    }

    /// Extracts a header value from a message payload, case-insensitively.
    fn header_value(msg: &GmailMessage, name: &str) -> Option<String> {
        msg.payload
            .as_ref()
            .and_then(|p| p.headers.as_ref())
            .and_then(|headers| {
                headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .map(|h| h.value.clone())
            })
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    async fn history_added_messages(&self, marker: &HistoryMarker) -> Result<Vec<MailId>> {
        let endpoint = format!(
            "/history?historyTypes=messageAdded&startHistoryId={}",
            marker
        );
        let response: HistoryListResponse = self.get(&endpoint).await?;

        let ids = response
            .history
            .unwrap_or_default()
            .into_iter()
            .flat_map(|entry| entry.messages_added.unwrap_or_default())
            .map(|added| MailId::from(added.message.id))
            .collect();
        Ok(ids)
    }

    async fn get_message(&self, id: &MailId) -> Result<MessageContent> {
        let endpoint = format!("/messages/{}?format=metadata&metadataHeaders=Subject", id);
        let message: GmailMessage = self.get(&endpoint).await?;

        Ok(MessageContent {
            subject: Self::header_value(&message, "Subject"),
            snippet: message.snippet.unwrap_or_default(),
        })
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let response: LabelsListResponse = self.get("/labels").await?;
        Ok(response
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| LabelInfo {
                id: LabelId::from(label.id),
                name: label.name,
            })
            .collect())
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        let request = CreateLabelRequest {
            name,
            label_list_visibility: "labelShow",
            message_list_visibility: "show",
        };
        let label: GmailLabel = self.post("/labels", &request).await?;
        Ok(LabelInfo {
            id: LabelId::from(label.id),
            name: label.name,
        })
    }

    async fn modify_message_labels(
        &self,
        id: &MailId,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<()> {
        let request = ModifyRequest {
            add_label_ids: add.iter().map(|l| l.0.clone()).collect(),
            remove_label_ids: remove.iter().map(|l| l.0.clone()).collect(),
        };
        self.post_no_response(&format!("/messages/{}/modify", id), &request)
            .await
    }
}

impl std::fmt::Debug for GmailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailProvider").finish_non_exhaustive()
    }
}
