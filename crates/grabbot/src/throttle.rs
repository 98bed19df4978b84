use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Per-user debounce gate.
///
/// Accepts an event only if the user's previous accepted event is at least
/// `interval` old. Rejected events are dropped, not queued, and do not move
/// the window.
#[derive(Clone, Debug)]
pub struct DebounceGate {
    /// Instant of the last accepted event per user
    last_seen: Arc<Mutex<HashMap<u64, Instant>>>,
    interval: Duration,
}

impl DebounceGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_seen: Arc::new(Mutex::new(HashMap::new())),
            interval,
        }
    }

    /// Checks and records in one step. `true` means the event may proceed.
    pub async fn try_pass(&self, user_id: u64) -> bool {
        let mut last_seen = self.last_seen.lock().await;
        let now = Instant::now();
        match last_seen.get(&user_id) {
            Some(&previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                last_seen.insert(user_id, now);
                true
            }
        }
    }

    /// Drops entries older than the interval so the table does not grow without bound.
    pub async fn prune(&self) {
        let now = Instant::now();
        let interval = self.interval;
        self.last_seen
            .lock()
            .await
            .retain(|_, previous| now.duration_since(*previous) < interval);
    }
}
