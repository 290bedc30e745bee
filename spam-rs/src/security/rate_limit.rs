//! Per-client rate limiting
//!
//! Fixed-window counters keyed by client IP address:
//! - each client gets `max_requests` per window
//! - the window restarts on the first request after it expires
//! - requests over the limit are rejected immediately, never queued
//! - stale windows are evicted by a periodic cleanup task
//!
//! # Example
//! ```no_run
//! use spam_rs::security::rate_limit::RateLimiter;
//! use std::net::IpAddr;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = RateLimiter::new(50, 60);
//! let ip: IpAddr = "192.0.2.1".parse()?;
//!
//! match limiter.check(ip).await {
//!     Ok(()) => println!("Request allowed"),
//!     Err(e) => println!("{}", e),
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::{Result, SpamError};

/// Request count for one client in the current window
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window rate limiter keyed by IP
pub struct RateLimiter {
    windows: RwLock<HashMap<IpAddr, Window>>,
    max_requests: u32,
    window: Duration,
    cleanup_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window_seconds`
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self::with_window(max_requests, Duration::from_secs(window_seconds))
    }

    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max_requests,
            window,
            cleanup_interval: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut limiter = Self::new(config.max_requests, config.window_seconds);
        limiter.cleanup_interval = Duration::from_secs(config.cleanup_interval_seconds.max(1));
        limiter
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request from `ip`
    ///
    /// Returns `RateLimitExceeded` when the client has used up its window.
    pub async fn check(&self, ip: IpAddr) -> Result<()> {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let entry = windows.entry(ip).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(entry.started));
            let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);

            warn!(
                "Rate limit exceeded for {}: {} requests per {:?}",
                ip, self.max_requests, self.window
            );

            return Err(SpamError::RateLimitExceeded {
                limit: self.max_requests,
                window_secs: self.window.as_secs(),
                retry_after_secs: retry_after_secs.max(1),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Requests counted for `ip` in its current window
    pub async fn get_count(&self, ip: IpAddr) -> u32 {
        let windows = self.windows.read().await;
        match windows.get(&ip) {
            Some(w) if w.started.elapsed() < self.window => w.count,
            _ => 0,
        }
    }

    /// Forget the window for `ip`
    pub async fn reset(&self, ip: IpAddr) {
        self.windows.write().await.remove(&ip);
        debug!("Reset rate limit for {}", ip);
    }

    /// Drop expired windows; returns how many were removed
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        before - windows.len()
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Run `cleanup` periodically in the background
    pub fn start_cleanup_task(self: Arc<Self>) -> JoinHandle<()> {
        let interval = self.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = self.cleanup().await;
                if removed > 0 {
                    debug!("Rate limiter cleanup removed {} client windows", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(10, 60);
        let client = ip("192.0.2.1");

        for _ in 0..10 {
            assert!(limiter.check(client).await.is_ok());
        }

        match limiter.check(client).await {
            Err(SpamError::RateLimitExceeded {
                limit,
                window_secs,
                retry_after_secs,
            }) => {
                assert_eq!(limit, 10);
                assert_eq!(window_secs, 60);
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
            other => panic!("expected RateLimitExceeded, got {:?}", other),
        }

        assert_eq!(limiter.get_count(client).await, 10);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = RateLimiter::new(2, 60);
        let a = ip("192.0.2.1");
        let b = ip("2001:db8::1");

        assert!(limiter.check(a).await.is_ok());
        assert!(limiter.check(a).await.is_ok());
        assert!(limiter.check(a).await.is_err());

        assert!(limiter.check(b).await.is_ok());
        assert_eq!(limiter.tracked_clients().await, 2);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::with_window(1, Duration::from_millis(50));
        let client = ip("192.0.2.7");

        assert!(limiter.check(client).await.is_ok());
        assert!(limiter.check(client).await.is_err());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.check(client).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset() {
        let limiter = RateLimiter::new(1, 60);
        let client = ip("192.0.2.9");

        assert!(limiter.check(client).await.is_ok());
        assert!(limiter.check(client).await.is_err());

        limiter.reset(client).await;
        assert!(limiter.check(client).await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_windows() {
        let limiter = RateLimiter::with_window(5, Duration::from_millis(30));
        limiter.check(ip("192.0.2.1")).await.unwrap();
        limiter.check(ip("192.0.2.2")).await.unwrap();
        assert_eq!(limiter.tracked_clients().await, 2);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(limiter.cleanup().await, 2);
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[test]
    fn test_from_config() {
        let config = RateLimitConfig {
            enabled: true,
            max_requests: 10,
            window_seconds: 30,
            cleanup_interval_seconds: 0,
        };
        let limiter = RateLimiter::from_config(&config);
        assert_eq!(limiter.max_requests(), 10);
        assert_eq!(limiter.window(), Duration::from_secs(30));
        assert_eq!(limiter.cleanup_interval, Duration::from_secs(1));
    }
}
