use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Sends permitted per window.
    pub rate: u32,
    pub window: Duration,
    /// Extra capacity accumulated while idle.
    pub burst: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        // Telegram allows ~20 messages/minute per group; stay under it.
        Self {
            rate: 19,
            window: Duration::from_secs(60),
            burst: 5,
        }
    }
}

/// Shared token-bucket gate in front of the channel transport.
///
/// `acquire` never rejects, it only delays. Waiters queue on the internal
/// mutex, so slots are handed out in arrival order; a waiter sleeping for the
/// next token does so while holding the lock, which is what keeps the queue
/// FIFO. Each call consumes one token, so every retry attempt pays for its
/// own slot and recursion through the retry loop cannot deadlock.
pub struct RateLimiter {
    state: Mutex<Bucket>,
}

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_per_sec)
            .min(self.capacity);
        self.last_refill = now;
    }
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let rate = config.rate.max(1) as f64;
        let window = config.window.as_secs_f64().max(0.001);
        let capacity = rate + config.burst as f64;
        Self {
            state: Mutex::new(Bucket {
                // A fresh limiter allows an initial burst up to capacity.
                tokens: capacity,
                capacity,
                refill_per_sec: rate / window,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until a send slot is available, then consumes it.
    pub async fn acquire(&self) {
        let mut bucket = self.state.lock().await;
        bucket.refill(Instant::now());
        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            let wait = Duration::from_secs_f64(deficit / bucket.refill_per_sec);
            tokio::time::sleep(wait).await;
            bucket.refill(Instant::now());
        }
        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }
}
