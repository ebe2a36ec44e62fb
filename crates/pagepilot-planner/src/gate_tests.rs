use super::*;
use crate::rate_limit::RateLimitConfig;
use std::sync::atomic::{AtomicU32, Ordering};

fn gate(max_requests: u32, window_secs: u64) -> CallGate {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        max_requests,
        window: Duration::from_secs(window_secs),
    }));
    CallGate::new(
        limiter,
        RetryConfig {
            jitter: false,
            ..Default::default()
        },
    )
}

/// Fails `fail_times` times with `error`, then returns "ok".
async fn flaky(calls: &AtomicU32, fail_times: u32, error: ProviderError) -> Result<String, ProviderError> {
    let count = calls.fetch_add(1, Ordering::SeqCst);
    if count < fail_times {
        Err(error)
    } else {
        Ok("ok".to_string())
    }
}

#[test]
fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.max_attempts(), 4);
    assert_eq!(config.base_delay, Duration::from_millis(500));
    assert_eq!(config.max_delay, Duration::from_secs(30));
}

#[test]
fn test_delay_calculation() {
    let config = RetryConfig {
        base_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        jitter: false,
        ..Default::default()
    };

    assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
}

#[test]
fn test_delay_capped() {
    let config = RetryConfig {
        base_delay: Duration::from_secs(10),
        max_delay: Duration::from_secs(15),
        jitter: false,
        ..Default::default()
    };
    assert_eq!(config.delay_for_attempt(3), Duration::from_secs(15));
}

#[test]
fn test_delay_with_jitter_stays_near_base() {
    let config = RetryConfig {
        base_delay: Duration::from_millis(1000),
        jitter: true,
        ..Default::default()
    };
    let delay = config.delay_for_attempt(0).as_millis();
    assert!((900..=1100).contains(&delay));
}

#[test]
fn test_is_retryable() {
    assert!(is_retryable(&ProviderError::RateLimited {
        retry_after_seconds: 60
    }));
    assert!(is_retryable(&ProviderError::Network("error".to_string())));
    assert!(is_retryable(&ProviderError::Timeout(30)));
    assert!(is_retryable(&ProviderError::ApiError {
        status: 503,
        message: "unavailable".to_string()
    }));
    assert!(!is_retryable(&ProviderError::ApiError {
        status: 404,
        message: "not found".to_string()
    }));
    assert!(!is_retryable(&ProviderError::AuthenticationFailed(
        "bad key".to_string()
    )));
    assert!(!is_retryable(&ProviderError::InvalidResponse(
        "garbage".to_string()
    )));
}

#[tokio::test(start_paused = true)]
async fn test_call_succeeds_first_time() {
    let gate = gate(15, 60);
    let calls = AtomicU32::new(0);

    let result = gate
        .call("primary", || flaky(&calls, 0, ProviderError::Timeout(1)))
        .await
        .unwrap();

    assert_eq!(result, "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(gate.limiter().status().used, 1);
}

#[tokio::test(start_paused = true)]
async fn test_call_retries_transient_errors() {
    let gate = gate(15, 60);
    let calls = AtomicU32::new(0);

    let result = gate
        .call("primary", || {
            flaky(&calls, 2, ProviderError::Network("reset".to_string()))
        })
        .await;

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_call_fails_fast_on_permanent_error() {
    let gate = gate(15, 60);
    let calls = AtomicU32::new(0);

    let err = gate
        .call("primary", || {
            flaky(&calls, 10, ProviderError::AuthenticationFailed("bad key".to_string()))
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        err,
        GenerationError::GenerationFailed {
            ref provider,
            source: ProviderError::AuthenticationFailed(_),
        } if provider == "primary"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_call_reports_rate_limit_exhaustion() {
    let gate = gate(15, 60);
    let calls = AtomicU32::new(0);

    let err = gate
        .call("primary", || {
            flaky(&calls, 10, ProviderError::RateLimited { retry_after_seconds: 2 })
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(matches!(
        err,
        GenerationError::RateLimitExceeded { ref provider, attempts: 4 } if provider == "primary"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_call_reports_last_server_error() {
    let gate = gate(15, 60);
    let calls = AtomicU32::new(0);

    let err = gate
        .call("fallback", || {
            flaky(
                &calls,
                10,
                ProviderError::ApiError {
                    status: 503,
                    message: "unavailable".to_string(),
                },
            )
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(matches!(
        err,
        GenerationError::GenerationFailed {
            source: ProviderError::ApiError { status: 503, .. },
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_never_calls_operation() {
    let gate = gate(0, 60);
    let calls = AtomicU32::new(0);

    let err = gate
        .call("primary", || flaky(&calls, 0, ProviderError::Timeout(1)))
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(matches!(err, GenerationError::RateLimitExceeded { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_window_reset() {
    let gate = gate(1, 1);
    let calls = AtomicU32::new(0);

    gate.call("primary", || flaky(&calls, 0, ProviderError::Timeout(1)))
        .await
        .unwrap();
    let second = gate
        .call("primary", || flaky(&calls, 0, ProviderError::Timeout(1)))
        .await;

    assert_eq!(second.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_attempt_hits_deadline() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
    let gate = CallGate::new(
        limiter,
        RetryConfig {
            max_retries: 1,
            jitter: false,
            attempt_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        },
    );
    let calls = AtomicU32::new(0);

    let result: Result<String, _> = gate
        .call("primary", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<Result<String, ProviderError>>().await
        })
        .await;

    assert!(matches!(
        result,
        Err(GenerationError::GenerationFailed {
            source: ProviderError::Timeout(5),
            ..
        })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_deadline_leaves_attempt_alone() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));
    let gate = CallGate::new(
        limiter,
        RetryConfig {
            attempt_timeout: None,
            ..Default::default()
        },
    );

    let result = gate
        .call("primary", || async { Ok::<_, ProviderError>("ok".to_string()) })
        .await;
    assert_eq!(result.unwrap(), "ok");
}
