//! Outbound request pacing
//!
//! The upstream geocoder allows roughly one request per second per client.
//! A single `MinIntervalGate` is shared by every resolver in the process, so
//! concurrent imports queue behind one lock instead of keeping their own
//! timers.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Gate every outbound geocoding request passes through
#[async_trait]
pub trait RequestGate: Send + Sync {
    /// Wait until a request may be sent
    async fn acquire(&self);
}

/// Enforces a minimum interval between consecutive requests
///
/// The lock is held while sleeping, so waiters are released one at a time
/// in arrival order.
pub struct MinIntervalGate {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl MinIntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl RequestGate for MinIntervalGate {
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!(wait_ms = wait_time.as_millis() as u64, "Rate limiting geocoder request");
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Gate that never waits (tests, offline tooling)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelayGate;

#[async_trait]
impl RequestGate for NoDelayGate {
    async fn acquire(&self) {}
}
