//! Time source used for expiry math and device-flow polling.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

/// Wall clock plus a cooperative sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;

    /// Suspend the calling task without blocking the runtime.
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the system time and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
