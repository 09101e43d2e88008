#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use qwen_auth::auth::{AuthError, Clock, Credential, CredentialStore, LoginEvent, LoginEventSink};
use qwen_auth::config::AuthConfig;
use tokio::sync::Notify;
use wiremock::MockServer;

pub const T0: i64 = 1_700_000_000_000;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
    saves: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(credential: Credential) -> Self {
        let store = Self::default();
        *store.credential.lock().expect("store lock poisoned") = Some(credential);
        store
    }

    pub fn get(&self) -> Option<Credential> {
        self.credential.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, AuthError> {
        Ok(self.get())
    }

    async fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.credential.lock().expect("store lock poisoned") = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), AuthError> {
        *self.credential.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Store that loads a fixed credential and refuses every save.
pub struct ReadOnlyCredentialStore {
    credential: Option<Credential>,
}

impl ReadOnlyCredentialStore {
    pub fn new(credential: Option<Credential>) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl CredentialStore for ReadOnlyCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, AuthError> {
        Ok(self.credential.clone())
    }

    async fn save(&self, _credential: &Credential) -> Result<(), AuthError> {
        Err(AuthError::Storage("read-only file system".to_string()))
    }

    async fn clear(&self) -> Result<(), AuthError> {
        Err(AuthError::Storage("read-only file system".to_string()))
    }
}

/// Virtual clock: `sleep` advances time instantly and records the duration.
pub struct ManualClock {
    now: AtomicI64,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn at(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock lock poisoned").clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .expect("clock lock poisoned")
            .push(duration);
        self.now
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}

/// Clock whose `sleep` never finishes; signals when polling begins.
pub struct StalledClock {
    pub sleeping: Arc<Notify>,
}

impl StalledClock {
    pub fn new() -> Self {
        Self {
            sleeping: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Clock for StalledClock {
    fn now_millis(&self) -> i64 {
        T0
    }

    async fn sleep(&self, _duration: Duration) {
        self.sleeping.notify_one();
        std::future::pending::<()>().await;
    }
}

pub fn config_for(server: &MockServer) -> AuthConfig {
    AuthConfig::default()
        .with_oauth_base_url(server.uri())
        .with_client_id("test-client")
        .with_scope("openid model.completion")
        .with_credentials_path("/nonexistent/unused.json")
}

pub fn recording_sink() -> (LoginEventSink, Arc<Mutex<Vec<LoginEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let recorded = events.clone();
    let sink: LoginEventSink = Arc::new(move |event: LoginEvent| {
        recorded.lock().expect("events lock poisoned").push(event);
    });
    (sink, events)
}
