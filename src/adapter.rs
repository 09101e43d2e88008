//! Request signing for the host's outbound HTTP calls.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use thiserror::Error;

use crate::auth::{AuthError, TokenManager};

/// Host-supplied HTTP transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, reqwest::Error> {
        self.execute(request).await
    }
}

/// Error from an authenticated request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Attaches `Authorization: Bearer <token>` using a [`TokenManager`].
#[derive(Clone)]
pub struct BearerAuth {
    manager: Arc<TokenManager>,
}

impl BearerAuth {
    pub fn new(manager: Arc<TokenManager>) -> Self {
        Self { manager }
    }

    /// Ensure the token is valid, then set the authorization header.
    pub async fn authorize(&self, request: &mut reqwest::Request) -> Result<(), AuthError> {
        let token = self.manager.get_valid_token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// A [`Transport`] wrapper that signs every request before delegating.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use qwen_auth::adapter::AuthenticatedTransport;
/// use qwen_auth::auth::TokenManager;
/// use qwen_auth::config::AuthConfig;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = Arc::new(TokenManager::new(AuthConfig::from_env())?);
/// let http = reqwest::Client::new();
/// let transport = AuthenticatedTransport::new(manager, http.clone());
/// let request = http.get("https://portal.qwen.ai/v1/models").build()?;
/// let response = transport.execute(request).await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthenticatedTransport<T> {
    auth: BearerAuth,
    transport: T,
}

impl<T: Transport> AuthenticatedTransport<T> {
    pub fn new(manager: Arc<TokenManager>, transport: T) -> Self {
        Self {
            auth: BearerAuth::new(manager),
            transport,
        }
    }

    pub async fn execute(
        &self,
        mut request: reqwest::Request,
    ) -> Result<reqwest::Response, RequestError> {
        self.auth.authorize(&mut request).await?;
        Ok(self.transport.send(request).await?)
    }
}
