//! Fixed-window request budget shared by every generation call.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

/// Request budget per window.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 15,
            window: Duration::from_secs(60),
        }
    }
}

/// Snapshot of the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub resets_in_secs: u64,
}

#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    used: u32,
}

/// Process-wide limiter. Counter updates are serialized by one lock.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Take one request from the budget, or return how long until the
    /// window resets.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.lock();
        let now = Instant::now();
        self.roll_window(&mut state, now);

        if state.used >= self.config.max_requests {
            let elapsed = now.duration_since(state.window_start);
            return Err(self.config.window.saturating_sub(elapsed));
        }

        state.used += 1;
        Ok(())
    }

    pub fn status(&self) -> RateLimitStatus {
        let mut state = self.state.lock();
        let now = Instant::now();
        self.roll_window(&mut state, now);

        let elapsed = now.duration_since(state.window_start);
        RateLimitStatus {
            used: state.used,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(state.used),
            resets_in_secs: self.config.window.saturating_sub(elapsed).as_secs(),
        }
    }

    fn roll_window(&self, state: &mut WindowState, now: Instant) {
        if now.duration_since(state.window_start) >= self.config.window {
            state.window_start = now;
            state.used = 0;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausts() {
        let limiter = limiter(2, 60);
        assert!(limiter.try_acquire().is_ok());
        assert!(limiter.try_acquire().is_ok());

        let wait = limiter.try_acquire().unwrap_err();
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = limiter(1, 10);
        limiter.try_acquire().unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(limiter.try_acquire().unwrap_err(), Duration::from_secs(6));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status() {
        let limiter = limiter(15, 60);
        limiter.try_acquire().unwrap();
        limiter.try_acquire().unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let status = limiter.status();
        assert_eq!(
            status,
            RateLimitStatus {
                used: 2,
                limit: 15,
                remaining: 13,
                resets_in_secs: 40,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_always_denies() {
        let limiter = limiter(0, 5);
        assert!(limiter.try_acquire().is_err());
        assert_eq!(limiter.status().remaining, 0);
    }
}
