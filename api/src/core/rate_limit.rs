//! Simple in-memory rate limiter using a sliding window counter.
//!
//! Tracks request timestamps per key (client IP for the webhook endpoint)
//! and refuses requests once the window is full. Shared across handlers;
//! the lock is only held for the map operation, never across awaits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the request is allowed, false if rate limited.
    ///
    /// Allowed requests are recorded against the key's window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut map = self.requests.lock().unwrap();
        let stamps = map.entry(key.to_string()).or_default();
        stamps.retain(|t| now.duration_since(*t) < self.window);
        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push(now);
        true
    }

    /// Seconds until the oldest request expires from the key's window.
    pub fn retry_after_secs(&self, key: &str) -> u64 {
        let now = Instant::now();
        let mut map = self.requests.lock().unwrap();
        let Some(stamps) = map.get_mut(key) else {
            return 0;
        };
        stamps.retain(|t| now.duration_since(*t) < self.window);
        match stamps.first() {
            Some(oldest) => {
                let elapsed = now.duration_since(*oldest);
                self.window.saturating_sub(elapsed).as_secs()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_limit_then_refuses() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        // Another key has its own window.
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn refused_keys_report_a_retry_hint() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("k"));
        assert!(!limiter.check("k"));
        assert!(limiter.retry_after_secs("k") <= 60);
        assert_eq!(limiter.retry_after_secs("unseen"), 0);
    }

    #[test]
    fn expired_entries_free_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(1));
        assert!(limiter.check("k"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.check("k"));
    }
}
