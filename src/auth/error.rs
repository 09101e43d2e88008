use std::time::Duration;

use thiserror::Error;

/// Errors that can escape the token lifecycle.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Device code request failed: {0}")]
    DeviceCodeRequestFailed(String),
    #[error("Device authorization failed: {0}")]
    DevicePollFailed(String),
    #[error("Device login cancelled")]
    Cancelled,
    #[error("Device login timed out after {}s", .0.as_secs())]
    LoginTimedOut(Duration),
    #[error("Credential storage error: {0}")]
    Storage(String),
    #[error("Access token cannot be sent as a header: {0}")]
    InvalidToken(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Failure of a refresh-token exchange.
///
/// Never surfaced by [`TokenManager::get_valid_token`](super::TokenManager::get_valid_token);
/// any variant sends the manager on to device login.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Refresh rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Refresh request failed: {0}")]
    Network(String),
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RefreshError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}
