use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use reqwest::Client;
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::AuthError,
    info,
    types::{AccessToken, TokenResponse},
    utils,
};

/// Owns the single service-level token shared by every catalog caller.
///
/// At most one refresh runs at a time. Callers that find the token missing or
/// expired queue up on the refresh lock; whoever gets it first performs the
/// exchange and the rest share its outcome: the freshly published token, or
/// the error the exchange failed with. A caller arriving after a failed
/// refresh has completed starts a new one.
pub struct TokenManager {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<AccessToken>>,
    refresh_lock: Mutex<Option<AuthError>>,
    // bumped under `refresh_lock` each time an exchange finishes
    refreshes: AtomicU64,
}

impl TokenManager {
    pub fn new(
        http: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        TokenManager {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: RwLock::new(None),
            refresh_lock: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Returns a token that is valid right now, refreshing it first if needed.
    pub async fn get_valid_token(&self) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.current_valid().await {
            return Ok(token);
        }

        let seen = self.refreshes.load(Ordering::Acquire);
        let mut last_failure = self.refresh_lock.lock().await;

        // another caller may have refreshed while we waited for the lock
        if let Some(token) = self.current_valid().await {
            return Ok(token);
        }
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone());
            }
        }

        let result = self.authenticate().await;
        self.refreshes.fetch_add(1, Ordering::Release);
        match result {
            Ok(fresh) => {
                *last_failure = None;
                *self.token.write().await = Some(fresh.clone());
                Ok(fresh)
            }
            Err(err) => {
                *last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Number of token exchanges `get_valid_token` has completed.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Acquire)
    }

    /// Exchanges the client credentials for a new token without publishing it.
    pub async fn authenticate(&self) -> Result<AccessToken, AuthError> {
        let res = self
            .http
            .post(&self.token_url)
            .header(
                reqwest::header::AUTHORIZATION,
                utils::basic_auth_header(&self.client_id, &self.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AuthError::Transport(Arc::new(e)))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| AuthError::Transport(Arc::new(e)))?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(AuthError::Malformed("empty access_token".to_string()));
        }

        info!(
            "Authenticated with catalog, token valid for {}s",
            parsed.expires_in
        );
        Ok(AccessToken::from_lifetime(
            parsed.access_token,
            parsed.expires_in,
        ))
    }

    /// Drops the current token if it is still `stale`, so the next call
    /// refreshes. A token that was already replaced is left alone.
    pub async fn invalidate(&self, stale: &AccessToken) {
        let mut lock = self.token.write().await;
        if lock.as_ref() == Some(stale) {
            *lock = None;
        }
    }

    pub async fn set_token(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }

    pub async fn current_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    async fn current_valid(&self) -> Option<AccessToken> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|t| !t.is_expired())
            .cloned()
    }
}
