//! Outbound request rate limiting.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// A token-bucket limiter: `burst` tokens, one refilled per `interval`.
///
/// [`RateLimit::acquire`] sleeps while the bucket is empty; waiters queue
/// in lock-acquisition order.
#[derive(Debug)]
pub struct RateLimit {
    interval: Duration,
    burst: u32,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refreshed: Instant,
}

impl RateLimit {
    /// A limiter starting with a full bucket.
    pub fn new(interval: Duration, burst: u32) -> Self {
        Self {
            interval,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(burst),
                refreshed: Instant::now(),
            }),
        }
    }

    /// The tier-1 Web API limit: one request per second, burst of 3.
    pub fn tier1() -> Self {
        Self::new(Duration::from_secs(1), 3)
    }

    /// Take one token, sleeping until the bucket refills if necessary.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        let now = Instant::now();
        let refilled =
            now.duration_since(bucket.refreshed).as_secs_f64() / self.interval.as_secs_f64();
        bucket.tokens = (bucket.tokens + refilled).min(f64::from(self.burst));
        bucket.refreshed = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return;
        }

        // Sleep holding the lock so later acquirers wait their turn.
        let wait = self.interval.mul_f64(1.0 - bucket.tokens);
        tokio::time::sleep(wait).await;
        bucket.tokens = 0.0;
        bucket.refreshed = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_is_immediate() {
        let limit = RateLimit::tier1();
        let start = Instant::now();
        for _ in 0..3 {
            limit.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_acquire_waits_for_refill() {
        let limit = RateLimit::tier1();
        for _ in 0..3 {
            limit.acquire().await;
        }
        let start = Instant::now();
        limit.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn refill_caps_at_burst() {
        let limit = RateLimit::new(Duration::from_millis(100), 2);
        limit.acquire().await;
        limit.acquire().await;
        // Far longer than needed to refill two tokens; the cap holds.
        tokio::time::sleep(Duration::from_secs(10)).await;
        let start = Instant::now();
        limit.acquire().await;
        limit.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        limit.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test(start_paused = true)]
    async fn steady_state_is_one_per_interval() {
        let limit = RateLimit::new(Duration::from_secs(1), 1);
        limit.acquire().await;
        let start = Instant::now();
        limit.acquire().await;
        limit.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(1900));
    }
}
