//! Configuration, layered as defaults < TOML file < environment < builder calls.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::AuthError;

pub const DEFAULT_OAUTH_BASE_URL: &str = "https://chat.qwen.ai";
pub const DEFAULT_CLIENT_ID: &str = "f0304373b74a44d2b584a3fb70ca9e56";
pub const DEFAULT_SCOPE: &str = "openid profile email model.completion";
const CREDENTIALS_REL_PATH: &str = ".qwen/oauth_creds.json";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a [`TokenManager`](crate::auth::TokenManager) needs to reach the
/// provider and its credential file.
///
/// Constructed once by the host and handed to the manager; there is no global
/// instance.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use qwen_auth::config::AuthConfig;
///
/// let config = AuthConfig::from_env()
///     .with_credentials_path("/tmp/qwen/oauth_creds.json")
///     .with_login_timeout(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub credentials_path: PathBuf,
    pub oauth_base_url: String,
    pub client_id: String,
    pub scope: String,
    /// Upper bound for one device login; `None` polls until the provider answers.
    pub login_timeout: Option<Duration>,
    /// Per-request timeout for the OAuth endpoints.
    pub http_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: Self::default_credentials_path(),
            oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            login_timeout: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl AuthConfig {
    /// Default credential file (`~/.qwen/oauth_creds.json`).
    pub fn default_credentials_path() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(CREDENTIALS_REL_PATH))
            .unwrap_or_else(|| PathBuf::from(CREDENTIALS_REL_PATH))
    }

    /// Load defaults overridden by environment variables (`QWEN_*`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load a TOML file on top of the defaults, then apply `QWEN_*` overrides.
    ///
    /// Missing keys keep their default values; unknown keys are rejected.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AuthError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        let _ = dotenvy::dotenv();
        Ok(Self::from_toml_str(&raw)?.apply_env(|key| std::env::var(key).ok()))
    }

    /// Parse TOML on top of the defaults. The environment is not consulted.
    pub fn from_toml_str(raw: &str) -> Result<Self, AuthError> {
        let file: ConfigFile = toml::from_str(raw)?;
        let mut config = Self::default();
        if let Some(path) = file.credentials_path {
            config.credentials_path = path;
        }
        if let Some(url) = file.oauth_base_url {
            config.oauth_base_url = url;
        }
        if let Some(client_id) = file.client_id {
            config.client_id = client_id;
        }
        if let Some(scope) = file.scope {
            config.scope = scope;
        }
        config.login_timeout = file.login_timeout_secs.map(Duration::from_secs);
        if let Some(secs) = file.http_timeout_secs {
            config.http_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("QWEN_CREDENTIALS_PATH") {
            self.credentials_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("QWEN_OAUTH_BASE_URL") {
            self.oauth_base_url = url;
        }
        if let Some(client_id) = lookup("QWEN_CLIENT_ID") {
            self.client_id = client_id;
        }
        if let Some(scope) = lookup("QWEN_SCOPE") {
            self.scope = scope;
        }
        match lookup("QWEN_LOGIN_TIMEOUT_SECS").map(|raw| raw.trim().parse::<u64>()) {
            Some(Ok(secs)) => self.login_timeout = Some(Duration::from_secs(secs)),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "ignoring invalid QWEN_LOGIN_TIMEOUT_SECS");
            }
            None => {}
        }
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_oauth_base_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_base_url = url.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = Some(timeout);
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub(crate) fn token_url(&self) -> String {
        format!("{}/api/v1/oauth2/token", self.oauth_base_url.trim_end_matches('/'))
    }

    pub(crate) fn device_code_url(&self) -> String {
        format!(
            "{}/api/v1/oauth2/device/code",
            self.oauth_base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    credentials_path: Option<PathBuf>,
    oauth_base_url: Option<String>,
    client_id: Option<String>,
    scope: Option<String>,
    login_timeout_secs: Option<u64>,
    http_timeout_secs: Option<u64>,
}
