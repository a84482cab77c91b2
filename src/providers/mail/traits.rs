//! Mail provider trait definition.
//!
//! This module defines the [`MailProvider`] trait which abstracts over the
//! mailbox backend (Gmail REST API in production, scripted fakes in tests).
//! The pipeline consumes exactly this surface: change-history lookup,
//! minimal message content, and label CRUD plus message label mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{HistoryMarker, LabelId, MailId};

/// Result type alias for mail provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur during mail provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error, including timeouts.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Whether this error means the target resource does not exist, as
    /// opposed to a transient failure reaching it.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// The minimal message content the pipeline fetches per notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContent {
    /// The Subject header, when present.
    pub subject: Option<String>,
    /// Provider-generated preview of the message body.
    pub snippet: String,
}

/// A label as known to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub id: LabelId,
    pub name: String,
}

/// Trait for mailbox backends.
///
/// Every method may suspend on a network call; implementations must bound
/// each call with a timeout so one slow notification cannot block others.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists ids of messages added to the inbox at or after the marker,
    /// in provider order. An empty list means no new messages in the
    /// history window, which is an expected outcome.
    async fn history_added_messages(&self, marker: &HistoryMarker) -> Result<Vec<MailId>>;

    /// Fetches the subject and body snippet of a message.
    async fn get_message(&self, id: &MailId) -> Result<MessageContent>;

    /// Lists all labels in the mailbox.
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Creates a label, shown in both the label list and the message list.
    async fn create_label(&self, name: &str) -> Result<LabelInfo>;

    /// Adds and removes labels on a message. Adding an already-present
    /// label is a no-op on the provider side, never an error.
    async fn modify_message_labels(
        &self,
        id: &MailId,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<()>;
}
