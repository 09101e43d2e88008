//! OAuth device-code login, refresh, and credential storage.

pub mod client;
pub mod clock;
pub mod credential;
pub mod device_code;
pub mod error;
pub mod manager;
pub mod store;

pub use client::OAuthClient;
pub use clock::{Clock, SystemClock};
pub use credential::{Credential, EXPIRY_SKEW_MS};
pub use device_code::{DeviceCodeSession, DeviceFlowState, DevicePoll, LoginEvent, LoginEventSink};
pub use error::{AuthError, RefreshError};
pub use manager::{TokenManager, TokenStatus};
pub use store::{CredentialStore, FileCredentialStore};
