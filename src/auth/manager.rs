use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use super::client::OAuthClient;
use super::clock::{Clock, SystemClock};
use super::credential::Credential;
use super::device_code::LoginEventSink;
use super::error::{AuthError, RefreshError};
use super::store::{CredentialStore, FileCredentialStore};
use crate::config::AuthConfig;

/// Snapshot of the stored credential, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Missing,
    Valid { expiry_date: i64 },
    Expired { refreshable: bool },
}

/// Owns the token lifecycle: cached token, then silent refresh, then device login.
///
/// One decision (load, refresh-or-login, save) runs at a time per manager;
/// concurrent callers wait and then observe the credential the first one saved.
///
/// # Example
/// ```no_run
/// use qwen_auth::auth::TokenManager;
/// use qwen_auth::config::AuthConfig;
///
/// # async fn run() -> Result<(), qwen_auth::auth::AuthError> {
/// let manager = TokenManager::new(AuthConfig::from_env())?;
/// let token = manager.get_valid_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
    client: OAuthClient,
    clock: Arc<dyn Clock>,
    events: Option<LoginEventSink>,
    login_timeout: Option<Duration>,
    decision: Mutex<()>,
}

impl TokenManager {
    /// File-backed manager using the system clock.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let store = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Self::with_parts(&config, store, Arc::new(SystemClock))
    }

    pub fn with_parts(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client: OAuthClient::new(config, clock.clone())?,
            store,
            clock,
            events: None,
            login_timeout: config.login_timeout,
            decision: Mutex::new(()),
        })
    }

    /// Receive device-login notifications (verification URL and user code).
    pub fn with_event_sink(mut self, sink: LoginEventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Return an access token that is valid for at least the skew buffer.
    ///
    /// Refresh failures are absorbed; only a failed device login is returned
    /// as an error.
    pub async fn get_valid_token(&self) -> Result<String, AuthError> {
        self.resolve(None).await
    }

    /// Like [`get_valid_token`](Self::get_valid_token), but a pending device
    /// login is abandoned when `cancel` fires, as is waiting behind another
    /// caller's login. Nothing is persisted in that case.
    pub async fn get_valid_token_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<String, AuthError> {
        self.resolve(Some(cancel)).await
    }

    /// Run a device login regardless of the stored credential and persist it.
    pub async fn login(&self, cancel: Option<&CancellationToken>) -> Result<Credential, AuthError> {
        let _guard = self.acquire(cancel).await?;
        let credential = self.run_login(cancel).await?;
        self.store.save(&credential).await?;
        Ok(credential)
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.load().await
    }

    pub async fn status(&self) -> TokenStatus {
        match self.load().await {
            None => TokenStatus::Missing,
            Some(credential) if credential.is_valid_at(self.clock.now_millis()) => {
                TokenStatus::Valid {
                    expiry_date: credential.expiry_date,
                }
            }
            Some(credential) => TokenStatus::Expired {
                refreshable: credential.has_refresh_token(),
            },
        }
    }

    /// Remove the stored credential.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.decision.lock().await;
        self.store.clear().await
    }

    async fn resolve(&self, cancel: Option<&CancellationToken>) -> Result<String, AuthError> {
        let _guard = self.acquire(cancel).await?;

        let current = self.load().await;
        if let Some(credential) = &current {
            if credential.is_valid_at(self.clock.now_millis()) {
                tracing::trace!("using cached access token");
                return Ok(credential.access_token.clone());
            }
        }

        if let Some(credential) = current.as_ref().filter(|c| c.has_refresh_token()) {
            tracing::debug!("access token expired, refreshing");
            match self.attempt_refresh(credential).await {
                Ok(refreshed) => {
                    self.store.save(&refreshed).await?;
                    return Ok(refreshed.access_token);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "token refresh failed, falling back to device login");
                }
            }
        }

        tracing::info!("starting device login");
        let credential = self.run_login(cancel).await?;
        self.store.save(&credential).await?;
        Ok(credential.access_token)
    }

    /// Wait for the decision lock; a cancelled caller stops waiting.
    async fn acquire(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<MutexGuard<'_, ()>, AuthError> {
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    guard = self.decision.lock() => Ok(guard),
                    _ = token.cancelled() => {
                        tracing::debug!("cancelled while waiting for another token decision");
                        Err(AuthError::Cancelled)
                    }
                }
            }
            None => Ok(self.decision.lock().await),
        }
    }

    async fn attempt_refresh(&self, credential: &Credential) -> Result<Credential, RefreshError> {
        self.client.refresh(credential).await
    }

    async fn run_login(&self, cancel: Option<&CancellationToken>) -> Result<Credential, AuthError> {
        let login = async {
            let flow = self.client.device_login(self.events.as_ref());
            match self.login_timeout {
                Some(limit) => tokio::time::timeout(limit, flow)
                    .await
                    .unwrap_or(Err(AuthError::LoginTimedOut(limit))),
                None => flow.await,
            }
        };
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::info!("device login cancelled");
                        Err(AuthError::Cancelled)
                    }
                    result = login => result,
                }
            }
            None => login.await,
        }
    }

    async fn load(&self) -> Option<Credential> {
        match self.store.load().await {
            Ok(credential) => credential,
            Err(err) => {
                tracing::warn!(error = %err, "credential load failed, treating as absent");
                None
            }
        }
    }
}
