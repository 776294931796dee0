//! Global token bucket rate limiter for batch dispatch.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::trace;

/// Rate limit status snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitStatus {
    pub window: Duration,
    pub burst: u32,
    pub tokens_available: f64,
    pub next_available_in_ms: Option<u64>,
}

/// Token bucket refilled at one token per window.
///
/// Tokens are added continuously and consumed one per dispatch. The bucket
/// starts full, so the first `capacity` acquisitions pass immediately.
#[derive(Debug)]
pub struct TokenBucket {
    /// Max tokens held at once.
    capacity: f64,
    /// Current available tokens.
    tokens: f64,
    /// Length of one refill window.
    window: Duration,
    /// Last refill time.
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(window: Duration, capacity: u32) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            tokens: capacity,
            window,
            last_refill: Instant::now(),
        }
    }

    /// Try to take a token.
    ///
    /// Returns `Err(wait)` with the time until one token is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(self.time_until_token())
        }
    }

    pub fn status(&mut self) -> RateLimitStatus {
        self.refill();
        RateLimitStatus {
            window: self.window,
            burst: self.capacity as u32,
            tokens_available: self.tokens,
            next_available_in_ms: if self.tokens >= 1.0 {
                None
            } else {
                Some(self.time_until_token().as_millis() as u64)
            },
        }
    }

    fn time_until_token(&self) -> Duration {
        let missing = (1.0 - self.tokens).max(0.0);
        // Round up so a sleeper never wakes just short of a full token.
        let nanos = (missing * self.window.as_nanos() as f64).ceil() as u64;
        Duration::from_nanos(nanos.max(1))
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        if self.window.is_zero() {
            self.tokens = self.capacity;
        } else {
            let added = elapsed.as_secs_f64() / self.window.as_secs_f64();
            self.tokens = (self.tokens + added).min(self.capacity);
        }
        self.last_refill = now;
    }
}

/// Global dispatch throttle shared by every ingestion and priority.
///
/// Waiters queue on a fair mutex, so they are admitted in arrival order.
/// Dropping an `acquire` future before it returns never consumes a token.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// One permit per `window`, holding at most `burst` unused permits.
    pub fn new(window: Duration, burst: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(window, burst)),
        }
    }

    /// Wait for and consume one permit.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        loop {
            match bucket.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    trace!(wait_ms = wait.as_millis() as u64, "Rate limited, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Consume a permit if one is available right now.
    ///
    /// Returns the time until the next permit otherwise. Also fails with
    /// `Duration::ZERO` when another caller is currently waiting.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        match self.bucket.try_lock() {
            Ok(mut bucket) => bucket.try_acquire(),
            Err(_) => Err(Duration::ZERO),
        }
    }

    /// Waits behind any caller currently sleeping in [`acquire`](Self::acquire).
    pub async fn status(&self) -> RateLimitStatus {
        self.bucket.lock().await.status()
    }

    /// Status without waiting; `None` while a caller is waiting for a permit.
    pub fn try_status(&self) -> Option<RateLimitStatus> {
        self.bucket.try_lock().ok().map(|mut bucket| bucket.status())
    }
}
