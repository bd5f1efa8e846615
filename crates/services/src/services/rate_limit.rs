//! Fixed-window request counters keyed by caller (usually IP or IP + path).

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    name: &'static str,
    max: u32,
    window: Duration,
    buckets: Arc<DashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max: u32, window: Duration) -> Self {
        Self {
            name,
            max,
            window,
            buckets: Arc::new(DashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Count one request for `key`. When over the limit, returns the whole
    /// seconds until the window resets.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut bucket = self.buckets.entry(key.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(bucket.started) >= self.window {
            *bucket = Window {
                started: now,
                hits: 0,
            };
        }
        if bucket.hits >= self.max {
            let remaining = self.window.saturating_sub(now.duration_since(bucket.started));
            let secs = remaining.as_millis().div_ceil(1000) as u64;
            return Err(secs.max(1));
        }
        bucket.hits += 1;
        Ok(())
    }

    /// Drop buckets whose window has elapsed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, w| now.duration_since(w.started) < self.window);
        before.saturating_sub(self.buckets.len())
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Periodically sweep every limiter until the runtime shuts down.
pub fn spawn_sweeper(limiters: Vec<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            for limiter in &limiters {
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(limiter = limiter.name(), removed, "Swept expired rate-limit buckets");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_until_window_resets() {
        let limiter = RateLimiter::new("test", 2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("a", start).is_ok());
        assert!(limiter.check_at("a", start).is_ok());
        assert_eq!(limiter.check_at("a", start + Duration::from_millis(500)), Err(60));
        assert!(limiter.check_at("b", start).is_ok());
        assert!(limiter.check_at("a", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn retry_after_rounds_up() {
        let limiter = RateLimiter::new("test", 1, Duration::from_secs(10));
        let start = Instant::now();
        limiter.check_at("a", start).unwrap();
        assert_eq!(limiter.check_at("a", start + Duration::from_millis(8_500)), Err(2));
    }

    #[test]
    fn sweep_drops_expired_buckets() {
        let limiter = RateLimiter::new("test", 1, Duration::from_millis(1));
        limiter.check("a").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(limiter.sweep(), 1);
        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn sweeper_runs_on_interval() {
        let limiter = RateLimiter::new("test", 1, Duration::from_millis(1));
        limiter.check("a").unwrap();
        let handle = spawn_sweeper(vec![limiter.clone()], Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();
        assert_eq!(limiter.len(), 0);
    }
}
