//! Fixed-interval gate for outbound deliveries

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces out callers so that consecutive acquisitions are at least
/// `interval` apart. The first acquisition never waits.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait for the next slot and claim it
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}
