//! Notification resolver.
//!
//! Turns an opaque change notification into a concrete new-mail identifier
//! by querying the provider's change history. "No new mail" is an expected,
//! frequent outcome (duplicate or stale notifications) and is never treated
//! as an error.

use std::sync::Arc;

use crate::domain::{HistoryMarker, MailId};
use crate::providers::mail::MailProvider;

/// Resolves history markers to newly added mail ids.
pub struct ResolverService<P: MailProvider> {
    provider: Arc<P>,
}

impl<P: MailProvider> ResolverService<P> {
    /// Creates a new resolver service.
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Resolves a history marker to the id of the first message added at or
    /// after it, or `None` when the history window contains no additions.
    ///
    /// Only the first message is taken even if several were added in the
    /// same window; the transport is assumed to deliver one notification
    /// per new message, and overlapping markers give later messages their
    /// own resolution chance. A transient provider failure also yields
    /// `None`: the pipeline does not retry within a notification.
    pub async fn resolve(&self, marker: &HistoryMarker) -> Option<MailId> {
        match self.provider.history_added_messages(marker).await {
            Ok(ids) => {
                let first = ids.into_iter().next();
                if first.is_none() {
                    tracing::debug!(%marker, "no added messages in history window");
                }
                first
            }
            Err(e) => {
                tracing::debug!(%marker, error = %e, "history lookup failed, treating as no new mail");
                None
            }
        }
    }
}
