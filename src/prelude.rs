//! Convenience re-exports for common use.

pub use crate::adapter::{AuthenticatedTransport, BearerAuth, RequestError, Transport};
pub use crate::auth::{
    AuthError, Credential, CredentialStore, FileCredentialStore, LoginEvent, LoginEventSink,
    TokenManager, TokenStatus,
};
pub use crate::config::AuthConfig;
