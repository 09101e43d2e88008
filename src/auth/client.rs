use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::credential::Credential;
use super::device_code::{
    DeviceCodeSession, DeviceFlowState, DevicePoll, LoginEvent, LoginEventSink,
};
use super::error::{AuthError, RefreshError};
use crate::config::AuthConfig;

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const REFRESH_GRANT_TYPE: &str = "refresh_token";
const AUTHORIZATION_PENDING: &str = "authorization_pending";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Stateless client for the provider's OAuth endpoints.
///
/// Performs the refresh exchange, the device-code request and the
/// device-token poll, and drives a full device login on top of them.
/// Nothing here touches the credential store.
pub struct OAuthClient {
    client: reqwest::Client,
    token_url: String,
    device_code_url: String,
    client_id: String,
    scope: String,
    clock: Arc<dyn Clock>,
}

impl OAuthClient {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AuthError::Configuration(format!("cannot build HTTP client: {err}")))?;
        Ok(Self {
            client,
            token_url: config.token_url(),
            device_code_url: config.device_code_url(),
            client_id: config.client_id.clone(),
            scope: config.scope.clone(),
            clock,
        })
    }

    /// Exchange the credential's refresh token for a new access token.
    ///
    /// The refresh token is kept when the provider does not rotate it.
    pub async fn refresh(&self, current: &Credential) -> Result<Credential, RefreshError> {
        let resp = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .json(&RefreshRequest {
                grant_type: REFRESH_GRANT_TYPE,
                client_id: &self.client_id,
                refresh_token: &current.refresh_token,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let payload: TokenResponse = resp.json().await?;
        let access_token = payload
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| RefreshError::InvalidResponse("missing access_token".to_string()))?;
        let expires_in = payload
            .expires_in
            .ok_or_else(|| RefreshError::InvalidResponse("missing expires_in".to_string()))?;
        Ok(Credential {
            access_token,
            refresh_token: payload
                .refresh_token
                .filter(|token| !token.is_empty())
                .unwrap_or_else(|| current.refresh_token.clone()),
            expiry_date: self.expiry_from(expires_in),
            resource_url: payload.resource_url.or_else(|| current.resource_url.clone()),
        })
    }

    /// Ask the provider for a fresh device code. Any failure is fatal.
    pub async fn request_device_code(&self) -> Result<DeviceCodeSession, AuthError> {
        let resp = self
            .client
            .post(&self.device_code_url)
            .header("Accept", "application/json")
            .json(&DeviceCodeRequest {
                client_id: &self.client_id,
                scope: &self.scope,
            })
            .send()
            .await
            .map_err(|err| AuthError::DeviceCodeRequestFailed(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::DeviceCodeRequestFailed(format!(
                "status {status}: {body}"
            )));
        }
        let payload: DeviceCodeResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::DeviceCodeRequestFailed(err.to_string()))?;
        Ok(DeviceCodeSession {
            device_code: payload.device_code,
            user_code: payload.user_code,
            verification_uri: payload.verification_uri,
            verification_uri_complete: payload.verification_uri_complete,
            interval_secs: payload.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        })
    }

    /// Poll the token endpoint once for a pending device authorization.
    ///
    /// `authorization_pending` is the only non-fatal error answer.
    pub async fn poll_device_token(
        &self,
        session: &DeviceCodeSession,
    ) -> Result<DevicePoll, AuthError> {
        let resp = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .json(&DeviceTokenRequest {
                grant_type: DEVICE_CODE_GRANT_TYPE,
                client_id: &self.client_id,
                device_code: &session.device_code,
            })
            .send()
            .await
            .map_err(|err| AuthError::DevicePollFailed(err.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| AuthError::DevicePollFailed(err.to_string()))?;
        let payload = serde_json::from_str::<TokenResponse>(&body).ok();

        if let Some(granted) = payload.as_ref().filter(|_| status.is_success()) {
            if let Some(access_token) = granted.access_token.as_deref().filter(|t| !t.is_empty()) {
                let expires_in = granted.expires_in.ok_or_else(|| {
                    AuthError::DevicePollFailed("token response missing expires_in".to_string())
                })?;
                let credential = Credential {
                    access_token: access_token.to_string(),
                    refresh_token: granted.refresh_token.clone().unwrap_or_default(),
                    expiry_date: self.expiry_from(expires_in),
                    resource_url: granted.resource_url.clone(),
                };
                return Ok(DevicePoll::Authorized { credential });
            }
        }

        match payload.as_ref().and_then(|p| p.error.as_deref()) {
            Some(AUTHORIZATION_PENDING) => Ok(DevicePoll::Pending),
            Some(error) => {
                let description = payload
                    .as_ref()
                    .and_then(|p| p.error_description.as_deref())
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default();
                Err(AuthError::DevicePollFailed(format!("{error}{description}")))
            }
            None => Err(AuthError::DevicePollFailed(format!(
                "unexpected response with status {status}: {body}"
            ))),
        }
    }

    /// Run a device login end to end: request a code, announce it, then poll
    /// every `interval` seconds until the provider confirms or rejects.
    ///
    /// There is no deadline here; callers bound the wait by cancelling the future.
    pub async fn device_login(
        &self,
        events: Option<&LoginEventSink>,
    ) -> Result<Credential, AuthError> {
        tracing::debug!(state = %DeviceFlowState::RequestingCode, "device login started");
        let result = self.run_device_flow(events).await;
        let state = match &result {
            Ok(_) => DeviceFlowState::Resolved,
            Err(_) => DeviceFlowState::Failed,
        };
        tracing::debug!(%state, "device login finished");
        result
    }

    async fn run_device_flow(
        &self,
        events: Option<&LoginEventSink>,
    ) -> Result<Credential, AuthError> {
        let session = self.request_device_code().await?;

        tracing::info!(
            verification_uri = %session.verification_uri,
            user_code = %session.user_code,
            "device authorization required"
        );
        if let Some(sink) = events {
            sink(LoginEvent::verification_required(&session));
        }

        let interval = Duration::from_secs(session.interval_secs.max(1));
        tracing::debug!(
            state = %DeviceFlowState::Polling,
            interval_secs = interval.as_secs(),
            "polling for device authorization"
        );
        let mut attempts: u32 = 0;
        loop {
            self.clock.sleep(interval).await;
            attempts += 1;
            match self.poll_device_token(&session).await? {
                DevicePoll::Pending => {
                    tracing::trace!(attempts, "authorization pending");
                }
                DevicePoll::Authorized { credential } => {
                    tracing::info!(attempts, "device authorization granted");
                    if let Some(sink) = events {
                        sink(LoginEvent::Authorized);
                    }
                    return Ok(credential);
                }
            }
        }
    }

    fn expiry_from(&self, expires_in_secs: u64) -> i64 {
        let millis = i64::try_from(expires_in_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        self.clock.now_millis().saturating_add(millis)
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
}

#[derive(Debug, Serialize)]
struct DeviceTokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    device_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    verification_uri_complete: Option<String>,
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    resource_url: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}
