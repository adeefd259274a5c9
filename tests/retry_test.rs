//! Retry policy behavior: backoff timing, fatal classification, bounds.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jobcore::service::db::retry::RetryPolicy;
use jobcore::tool::error::AppError;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(20),
        ..RetryPolicy::default()
    }
}

#[tokio::test]
async fn transient_failures_retry_until_success() {
    let policy = fast_policy();
    let calls = Arc::new(AtomicU32::new(0));
    let op_calls = Arc::clone(&calls);

    let start = Instant::now();
    let result = policy
        .run(move |_attempt| {
            let calls = Arc::clone(&op_calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AppError::Timeout("lock wait timeout".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
    let elapsed = start.elapsed();

    assert_eq!(result.expect("should eventually succeed"), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // two backoff waits: 20ms + 40ms
    assert!(elapsed >= Duration::from_millis(60), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn fatal_errors_fail_on_the_first_attempt() {
    let policy = fast_policy();
    let calls = Arc::new(AtomicU32::new(0));
    let op_calls = Arc::clone(&calls);

    let result: Result<(), _> = policy
        .run(move |_attempt| {
            let calls = Arc::clone(&op_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::DuplicateEntry("email already registered".into()))
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(AppError::TransactionFailed(_))));
}

#[tokio::test]
async fn exhausted_retries_wrap_as_transaction_failed() {
    let policy = fast_policy();
    let calls = Arc::new(AtomicU32::new(0));
    let op_calls = Arc::clone(&calls);

    let result: Result<(), _> = policy
        .run(move |_attempt| {
            let calls = Arc::clone(&op_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Timeout("connection timed out".into()))
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result {
        Err(AppError::TransactionFailed(msg)) => assert!(msg.contains("3 attempt")),
        other => panic!("expected TransactionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn the_total_timeout_bounds_the_whole_loop() {
    let policy = RetryPolicy {
        max_attempts: 10,
        base_delay: Duration::from_millis(20),
        total_timeout: Duration::from_millis(50),
        ..RetryPolicy::default()
    };

    let start = Instant::now();
    let result: Result<(), _> = policy
        .run(|_attempt| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(AppError::Timeout("never finishes in time".into()))
        })
        .await;

    assert!(start.elapsed() < Duration::from_secs(1));
    match result {
        Err(AppError::TransactionFailed(msg)) => assert!(msg.contains("timed out")),
        other => panic!("expected TransactionFailed, got {other:?}"),
    }
}
