use std::sync::Arc;

use strum::Display;

use super::credential::Credential;

/// Device-code session details returned by the provider.
///
/// Lives for one login attempt and is never persisted.
///
/// # Example
/// ```no_run
/// use qwen_auth::auth::DeviceCodeSession;
///
/// let session = DeviceCodeSession {
///     device_code: "device-code".to_string(),
///     user_code: "ABCD-EFGH".to_string(),
///     verification_uri: "https://chat.qwen.ai/authorize".to_string(),
///     verification_uri_complete: None,
///     interval_secs: 5,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodeSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    pub interval_secs: u64,
}

/// Outcome of a single device-token poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevicePoll {
    Pending,
    Authorized { credential: Credential },
}

/// Phases of one device-flow login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeviceFlowState {
    RequestingCode,
    Polling,
    Resolved,
    Failed,
}

/// Notification emitted while a device login is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    /// The operator must open `verification_uri` and enter `user_code`.
    VerificationRequired {
        verification_uri: String,
        verification_uri_complete: Option<String>,
        user_code: String,
    },
    Authorized,
}

impl LoginEvent {
    pub(crate) fn verification_required(session: &DeviceCodeSession) -> Self {
        Self::VerificationRequired {
            verification_uri: session.verification_uri.clone(),
            verification_uri_complete: session.verification_uri_complete.clone(),
            user_code: session.user_code.clone(),
        }
    }
}

/// Callback receiving [`LoginEvent`]s; hosts decide how to render them.
pub type LoginEventSink = Arc<dyn Fn(LoginEvent) + Send + Sync>;
