use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Fixed-window counter keyed by caller.
#[derive(Default)]
pub struct RateLimiter {
    inner: Mutex<HashMap<String, RateState>>,
}

#[derive(Clone, Copy, Debug)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub remaining: u64,
    pub retry_after: Option<Duration>,
}

struct RateState {
    window_start: Instant,
    count: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(&self, key: &str, limit: u64, window: Duration) -> RateLimitOutcome {
        if limit == 0 {
            return RateLimitOutcome {
                allowed: false,
                remaining: 0,
                retry_after: Some(window),
            };
        }

        let mut guard = self.inner.lock().await;
        let entry = guard.entry(key.to_string()).or_insert_with(|| RateState {
            window_start: Instant::now(),
            count: 0,
        });

        if entry.window_start.elapsed() >= window {
            entry.window_start = Instant::now();
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count > limit {
            let retry_after = window.saturating_sub(entry.window_start.elapsed());
            return RateLimitOutcome {
                allowed: false,
                remaining: 0,
                retry_after: Some(retry_after),
            };
        }

        RateLimitOutcome {
            allowed: true,
            remaining: limit.saturating_sub(entry.count),
            retry_after: None,
        }
    }

    /// Drops windows that have fully elapsed.
    pub async fn prune(&self, window: Duration) -> usize {
        let mut guard = self.inner.lock().await;
        let before = guard.len();
        guard.retain(|_, state| state.window_start.elapsed() < window);
        before - guard.len()
    }

    /// Prunes every `window` for as long as the process runs, so callers
    /// seen once do not hold an entry forever.
    pub fn spawn_pruner(self: &Arc<Self>, window: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(window);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let pruned = limiter.prune(window).await;
                if pruned > 0 {
                    tracing::debug!(pruned, "pruned rate limit windows");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);

        let first = limiter.check("reports:a", 2, window).await;
        let second = limiter.check("reports:a", 2, window).await;
        let third = limiter.check("reports:a", 2, window).await;

        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert!(second.allowed);
        assert!(!third.allowed);
        assert!(third.retry_after.is_some());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);
        assert!(limiter.check("reports:a", 1, window).await.allowed);
        assert!(limiter.check("reports:b", 1, window).await.allowed);
        assert!(!limiter.check("reports:a", 1, window).await.allowed);
    }

    #[tokio::test]
    async fn window_reset_allows_again() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(20);
        assert!(limiter.check("k", 1, window).await.allowed);
        assert!(!limiter.check("k", 1, window).await.allowed);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("k", 1, window).await.allowed);
    }

    #[tokio::test]
    async fn zero_limit_never_allows() {
        let limiter = RateLimiter::new();
        let outcome = limiter.check("k", 0, Duration::from_secs(1)).await;
        assert!(!outcome.allowed);
    }

    #[tokio::test]
    async fn prune_removes_elapsed_windows() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(10);
        limiter.check("k", 5, window).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(limiter.prune(window).await, 1);
    }

    #[tokio::test]
    async fn pruner_clears_elapsed_windows_in_background() {
        let limiter = Arc::new(RateLimiter::new());
        let window = Duration::from_millis(20);
        limiter.check("k", 5, window).await;

        let pruner = limiter.spawn_pruner(window);
        tokio::time::sleep(Duration::from_millis(100)).await;
        pruner.abort();

        assert_eq!(limiter.prune(window).await, 0);
        let outcome = limiter.check("k", 1, window).await;
        assert!(outcome.allowed);
    }
}
