use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// In-memory sliding-window limiter keyed by client IP.
///
/// This sits in front of the per-email lockout and only bounds raw request
/// volume from a single address.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
    sweep_threshold: usize,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
            sweep_threshold: 1024,
        }
    }

    /// Records the request and returns whether it is within the limit.
    /// Rejected requests are not recorded.
    pub async fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now()).await
    }

    async fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().await;
        let window = self.window;
        let entry = hits.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < window);
        let allowed = entry.len() < self.limit;
        if allowed {
            entry.push(now);
        }

        if hits.len() > self.sweep_threshold {
            hits.retain(|_, times| {
                times.retain(|t| now.duration_since(*t) < window);
                !times.is_empty()
            });
        }
        allowed
    }
}
