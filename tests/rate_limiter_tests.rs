//! Rate limiter timing tests

use aitranslator::config::RateLimitConfig;
use aitranslator::services::RateLimiter;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_third_acquire_waits_for_window() {
    let limiter = RateLimiter::new(2, Duration::from_secs(1)).unwrap();

    let first = Instant::now();
    limiter.acquire().await;
    limiter.acquire().await;
    assert!(first.elapsed() < Duration::from_millis(100));

    limiter.acquire().await;
    let third = Instant::now();
    assert!(third - first >= Duration::from_secs(1), "third acquire after {:?}", third - first);
}

#[tokio::test]
async fn test_acquires_below_limit_do_not_wait() {
    let limiter = RateLimiter::from_config(&RateLimitConfig {
        max_requests: 5,
        window_seconds: 60.0,
    })
    .unwrap();

    let started = Instant::now();
    for _ in 0..5 {
        limiter.acquire().await;
    }
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(limiter.current_usage().await, 5);
}

#[tokio::test]
async fn test_concurrent_callers_never_exceed_window() {
    let window = Duration::from_millis(300);
    let limiter = Arc::new(RateLimiter::new(2, window).unwrap());

    let mut handles = Vec::new();
    for _ in 0..6 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            Instant::now()
        }));
    }

    let mut granted = Vec::new();
    for handle in handles {
        granted.push(handle.await.unwrap());
    }
    granted.sort();

    // Any three grants span at least one window; times are read just after the lock is released
    let tolerance = Duration::from_millis(5);
    for triple in granted.windows(3) {
        let span = triple[2] - triple[0];
        assert!(span + tolerance >= window, "grants too close: {:?}", span);
    }
}
