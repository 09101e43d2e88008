//! qwen-auth — OAuth2 device-flow login and access-token lifecycle.
//!
//! A [`TokenManager`](auth::TokenManager) hands out access tokens that are
//! always valid: a cached token is returned while it is fresh, an expiring
//! one is refreshed silently, and a device login is started only when neither
//! works.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use qwen_auth::prelude::*;
//!
//! # async fn example() -> Result<(), AuthError> {
//! let manager = TokenManager::new(AuthConfig::from_env())?.with_event_sink(Arc::new(|event: LoginEvent| {
//!     if let LoginEvent::VerificationRequired { verification_uri, user_code, .. } = event {
//!         eprintln!("Open {verification_uri} and enter {user_code}");
//!     }
//! }));
//! let token = manager.get_valid_token().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod auth;
pub mod config;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
