//! OAuth 2.0 token source shared by Google API clients.
//!
//! Both the Gmail provider and the Pub/Sub source authenticate with the
//! same refresh-token grant. Credentials are read from a JSON file; token
//! acquisition and storage beyond the refresh exchange is out of scope.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::traits::{ProviderError, Result};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth credentials loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleCredentials {
    /// OAuth refresh token.
    pub refresh_token: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl GoogleCredentials {
    /// Reads credentials from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProviderError::Authentication(format!(
                "failed to read credentials file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| ProviderError::Authentication(format!("invalid credentials: {}", e)))
    }
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_in: u64,
}

/// Exchanges a refresh token for access tokens and caches the latest one.
///
/// The cached token is replaced eagerly on every [`refresh`](Self::refresh);
/// callers re-refresh on a 401 rather than tracking expiry.
pub struct TokenSource {
    credentials: GoogleCredentials,
    client: reqwest::Client,
    access_token: Mutex<Option<String>>,
}

impl TokenSource {
    pub fn new(credentials: GoogleCredentials, client: reqwest::Client) -> Self {
        Self {
            credentials,
            client,
            access_token: Mutex::new(None),
        }
    }

    /// Returns the cached access token, refreshing it first if none is held.
    pub async fn token(&self) -> Result<String> {
        let mut guard = self.access_token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.exchange().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Forces a token refresh and returns the new token.
    pub async fn refresh(&self) -> Result<String> {
        let token = self.exchange().await?;
        let mut guard = self.access_token.lock().await;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn exchange(&self) -> Result<String> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse token response: {}", e)))?;

        Ok(token_response.access_token)
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSource").finish_non_exhaustive()
    }
}
