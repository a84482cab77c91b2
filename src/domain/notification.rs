//! Inbox-change notification payloads.
//!
//! The push transport delivers an opaque JSON payload per inbox change. The
//! only field the pipeline consumes is the history marker; everything else
//! is ignored. Notifications are consumed exactly once and never persisted.

use serde::Deserialize;

use super::HistoryMarker;

/// Parsed change notification. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub marker: HistoryMarker,
}

/// Wire form of the push payload. Gmail sends `historyId` as a JSON number
/// in watch notifications but as a string elsewhere, so both are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload {
    history_id: MarkerValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MarkerValue {
    Number(u64),
    Text(String),
}

impl Notification {
    /// Builds a notification directly from a marker value.
    pub fn from_marker(marker: impl Into<HistoryMarker>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Parses a raw push payload into a notification.
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let payload: PushPayload = serde_json::from_slice(raw)?;
        let marker = match payload.history_id {
            MarkerValue::Number(n) => HistoryMarker::from(n),
            MarkerValue::Text(s) => HistoryMarker::from(s),
        };
        Ok(Self { marker })
    }
}
