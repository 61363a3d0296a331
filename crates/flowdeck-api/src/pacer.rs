// Fixed-rate request pacing.
//
// A single gate shared by every request the client issues. Not a token
// bucket: idle time never accumulates into burst capacity.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between two outbound requests.
pub const DEFAULT_PACE: Duration = Duration::from_millis(100);

/// Permits at most one request issuance per `period`, globally.
///
/// Waiters queue on a fair async mutex, so slots are handed out in
/// arrival order.
#[derive(Debug)]
pub struct Pacer {
    period: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_slot: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next free slot and consume it.
    pub async fn wait(&self) {
        let mut next = self.next_slot.lock().await;
        if let Some(at) = *next {
            tokio::time::sleep_until(at).await;
        }
        *next = Some(Instant::now() + self.period);
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_PACE)
    }
}
