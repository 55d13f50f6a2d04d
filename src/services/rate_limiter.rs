//! Sliding-window rate limiter
//!
//! Bounds the number of upstream requests per rolling window. Callers that find
//! the window full are suspended, never rejected.

use crate::config::{RateLimitConfig, MAX_RATE_LIMIT_WINDOW};
use crate::utils::error::{helpers, AppResult};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Request budget shared by every call made through one client
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    // Held across the wait: tokio's mutex is fair, so waiters are served FIFO.
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`
    pub fn new(max_requests: u32, window: Duration) -> AppResult<Self> {
        if max_requests == 0 {
            return Err(helpers::config_error("Rate limiter max_requests must be positive"));
        }
        if window.is_zero() {
            return Err(helpers::config_error("Rate limiter window must be positive"));
        }
        if window > MAX_RATE_LIMIT_WINDOW {
            return Err(helpers::config_error(format!(
                "Rate limiter window cannot exceed {}s",
                MAX_RATE_LIMIT_WINDOW.as_secs()
            )));
        }

        Ok(Self {
            max_requests: max_requests as usize,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests as usize)),
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> AppResult<Self> {
        Self::new(config.max_requests, config.window()?)
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a slot is free, then consume it
    pub async fn acquire(&self) {
        let mut timestamps = self.timestamps.lock().await;
        loop {
            let now = Instant::now();
            self.prune(&mut timestamps, now);

            if timestamps.len() < self.max_requests {
                timestamps.push_back(now);
                return;
            }

            // Full: sleep until the oldest request leaves the window, then re-check
            let oldest = timestamps[0];
            let wait = (oldest + self.window).saturating_duration_since(now);
            debug!(
                "Rate limiter full ({}/{}), waiting {}ms",
                timestamps.len(),
                self.max_requests,
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Consume a slot only if one is free right now
    pub async fn try_acquire(&self) -> bool {
        let mut timestamps = self.timestamps.lock().await;
        let now = Instant::now();
        self.prune(&mut timestamps, now);

        if timestamps.len() < self.max_requests {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Requests recorded in the current window
    pub async fn current_usage(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        self.prune(&mut timestamps, Instant::now());
        timestamps.len()
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}
