//! Request pacing.
//!
//! A [`Pacer`] spaces calls at least `interval` apart using a governor
//! rate limiter with a burst of one. The first call goes through at once.

use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Minimum spacing between outbound requests of one kind.
///
/// Cloning shares the underlying limiter.
#[derive(Clone)]
pub struct Pacer {
    interval: Duration,
    limiter: Option<Arc<DefaultRateLimiter>>,
}

impl Pacer {
    /// Pacer allowing one call per `interval`. A zero interval never waits.
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { interval, limiter }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Pacer that never waits.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the next call is allowed.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("interval", &self.interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_unpaced_never_waits() {
        let pacer = Pacer::unpaced();
        let start = Instant::now();
        for _ in 0..10 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_calls_are_spaced() {
        let pacer = Pacer::from_millis(60);
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        // First call is free, the next two each wait one interval.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_clones_share_limiter() {
        let pacer = Pacer::from_millis(60);
        let other = pacer.clone();
        let start = Instant::now();
        pacer.wait().await;
        other.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(other.interval(), Duration::from_millis(60));
    }
}
