//! Token-bucket rate limiting for outbound requests.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Token-bucket rate limiter.
///
/// Capacity regenerates continuously at `requests_per_second`, capped at
/// `burst_size`. The bucket starts full. The token count and refill timestamp
/// sit behind one async mutex, so concurrent callers are served one at a time
/// and a caller waiting for capacity holds the lock while it sleeps.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_second: f64,
    burst_size: f64,
    state: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

impl RateLimiter {
    /// Create a limiter. A non-positive rate is clamped to a tiny positive value
    /// and a zero burst to one, so `acquire` always terminates.
    pub fn new(requests_per_second: f64, burst_size: u32) -> Self {
        let requests_per_second = if requests_per_second > 0.0 {
            requests_per_second
        } else {
            f64::MIN_POSITIVE
        };
        let burst_size = f64::from(burst_size.max(1));

        Self {
            requests_per_second,
            burst_size,
            state: Mutex::new(Bucket {
                tokens: burst_size,
                last_update: Instant::now(),
            }),
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        self.requests_per_second
    }

    pub fn burst_size(&self) -> u32 {
        self.burst_size as u32
    }

    /// Wait until one unit of capacity is available, then consume it
    pub async fn acquire(&self) {
        let mut bucket = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_update).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.requests_per_second).min(self.burst_size);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return;
        }

        let wait = (1.0 - bucket.tokens) / self.requests_per_second;
        tracing::debug!(
            "Rate limit reached ({:.3} tokens left), waiting {:.3}s",
            bucket.tokens,
            wait
        );
        tokio::time::sleep(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX)).await;

        // The token that accrued during the sleep is the one being consumed.
        bucket.tokens = 0.0;
        bucket.last_update = Instant::now();
    }

    /// Tokens currently available, after refilling for elapsed time
    #[cfg(test)]
    async fn available(&self) -> f64 {
        let bucket = self.state.lock().await;
        let elapsed = bucket.last_update.elapsed().as_secs_f64();
        (bucket.tokens + elapsed * self.requests_per_second).min(self.burst_size)
    }
}
