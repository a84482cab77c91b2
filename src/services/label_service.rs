//! Label manager.
//!
//! Resolves polarity categories to provider label ids, creating missing
//! labels on demand, and assigns them to messages. Assignment is idempotent:
//! adding a label a message already carries is a provider-side no-op.
//!
//! Name-to-id resolutions are cached across notifications when enabled. The
//! cache can go stale if a label is deleted out-of-band, so an assignment
//! that fails with not-found invalidates the entry and retries exactly once
//! with a fresh resolution.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::LabelSettings;
use crate::domain::{LabelId, MailId, Polarity};
use crate::providers::mail::{MailProvider, ProviderError};

/// Errors that can occur during label operations.
#[derive(Debug, Error)]
pub enum LabelError {
    /// The provider rejected a label operation.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Result type for label operations.
pub type LabelResult<T> = std::result::Result<T, LabelError>;

/// Resolves and assigns polarity labels.
pub struct LabelService<P: MailProvider> {
    provider: Arc<P>,
    settings: LabelSettings,
    cache: Option<RwLock<HashMap<String, LabelId>>>,
}

impl<P: MailProvider> LabelService<P> {
    /// Creates a new label service. The resolution cache is constructed
    /// only when enabled in settings.
    pub fn new(provider: Arc<P>, settings: LabelSettings) -> Self {
        let cache = settings
            .cache_enabled
            .then(|| RwLock::new(HashMap::new()));
        Self {
            provider,
            settings,
            cache,
        }
    }

    /// Assigns the label configured for `polarity` to a message, creating
    /// the label first if it does not exist yet.
    pub async fn assign(&self, mail_id: &MailId, polarity: Polarity) -> LabelResult<LabelId> {
        let name = self.settings.name_for(polarity);
        let label_id = self.resolve(name).await?;

        match self
            .provider
            .modify_message_labels(mail_id, std::slice::from_ref(&label_id), &[])
            .await
        {
            Ok(()) => Ok(label_id),
            Err(e) if e.is_not_found() => {
                // The cached id may refer to a label deleted out-of-band.
                // Drop it and retry once with a fresh resolution.
                tracing::warn!(label = name, %mail_id, "label id stale, re-resolving");
                self.invalidate(name).await;
                let label_id = self.resolve(name).await?;
                self.provider
                    .modify_message_labels(mail_id, std::slice::from_ref(&label_id), &[])
                    .await?;
                Ok(label_id)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves a label name to its id, consulting the cache first and
    /// creating the label when the mailbox does not have it.
    async fn resolve(&self, name: &str) -> LabelResult<LabelId> {
        if let Some(cache) = &self.cache {
            if let Some(id) = cache.read().await.get(name) {
                return Ok(id.clone());
            }
        }

        let id = self.lookup_or_create(name).await?;

        if let Some(cache) = &self.cache {
            cache.write().await.insert(name.to_string(), id.clone());
        }
        Ok(id)
    }

    /// Looks the label up in the mailbox, creating it on a miss. A create
    /// that races with another writer and fails is resolved by listing
    /// again; the label must exist by then.
    async fn lookup_or_create(&self, name: &str) -> LabelResult<LabelId> {
        if let Some(id) = self.find_by_name(name).await? {
            return Ok(id);
        }

        match self.provider.create_label(name).await {
            Ok(info) => {
                tracing::info!(label = name, id = %info.id, "created label");
                Ok(info.id)
            }
            Err(e) => {
                tracing::debug!(label = name, error = %e, "create failed, re-listing");
                match self.find_by_name(name).await? {
                    Some(id) => Ok(id),
                    None => Err(e.into()),
                }
            }
        }
    }

    async fn find_by_name(&self, name: &str) -> LabelResult<Option<LabelId>> {
        let labels = self.provider.list_labels().await?;
        Ok(labels.into_iter().find(|l| l.name == name).map(|l| l.id))
    }

    async fn invalidate(&self, name: &str) {
        if let Some(cache) = &self.cache {
            cache.write().await.remove(name);
        }
    }
}
