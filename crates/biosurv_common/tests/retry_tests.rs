//! Tests for the retry wrapper contract

use biosurv_common::provider_error::{classify, ProviderError, ProviderErrorKind};
use biosurv_common::retry::{RecordingSleeper, Retrier, RetryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn retrier(policy: RetryPolicy) -> (Retrier, RecordingSleeper) {
    let sleeper = RecordingSleeper::new();
    (Retrier::with_sleeper(policy, Arc::new(sleeper.clone())), sleeper)
}

#[tokio::test]
async fn test_always_retryable_invokes_exactly_max_retries() {
    let (retrier, _) = retrier(RetryPolicy::default());
    let calls = AtomicUsize::new(0);

    let result: Result<String, ProviderError> = retrier
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::from_message("429 Too Many Requests")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let err = result.unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::RateLimited);
    assert_eq!(err.to_string(), "429 Too Many Requests");
}

#[tokio::test]
async fn test_success_first_try() {
    let (retrier, sleeper) = retrier(RetryPolicy::default());
    let calls = AtomicUsize::new(0);

    let result: Result<&str, ProviderError> = retrier
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("action plan") }
        })
        .await;

    assert_eq!(result.unwrap(), "action plan");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_non_retryable_short_circuits() {
    let (retrier, sleeper) = retrier(RetryPolicy::default());
    let calls = AtomicUsize::new(0);

    let result: Result<(), ProviderError> = retrier
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::from_message("invalid argument")) }
        })
        .await;

    assert_eq!(result.unwrap_err().to_string(), "invalid argument");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_backoff_growth_with_jitter() {
    let policy = RetryPolicy {
        max_retries: 5,
        ..Default::default()
    };
    let (retrier, sleeper) = retrier(policy);

    let _: Result<(), ProviderError> = retrier
        .run(|| async { Err(ProviderError::from_message("503 Service Unavailable")) })
        .await;

    let waits = sleeper.waits();
    assert_eq!(waits.len(), 4);
    for (idx, wait) in waits.iter().enumerate() {
        // waits[idx] precedes attempt idx + 1
        let floor = Duration::from_millis(2000 * 2u64.pow(idx as u32));
        assert!(*wait >= floor, "wait {} = {:?}", idx, wait);
        assert!(*wait < floor + Duration::from_millis(1000), "wait {} = {:?}", idx, wait);
    }
}

#[test]
fn test_embedded_json_classification() {
    assert!(classify(r#"Request failed: {"error":{"code":503,"status":"UNAVAILABLE"}}"#).is_retryable());
    assert!(!classify(r#"Request failed: {"error":{"code":400,"status":"INVALID_ARGUMENT"}}"#).is_retryable());
}

#[tokio::test]
async fn test_eventual_success_after_transient_failures() {
    let (retrier, sleeper) = retrier(RetryPolicy::default());
    let calls = AtomicUsize::new(0);

    let result: Result<String, ProviderError> = retrier
        .run(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::from_message("HTTP 503"))
                } else {
                    Ok(format!("plan from call {}", n + 1))
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "plan from call 3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.waits().len(), 2);
}

#[tokio::test]
async fn test_repeated_invocations_are_independent() {
    let (retrier, sleeper) = retrier(RetryPolicy::default());

    let first: Result<u32, ProviderError> = retrier.run(|| async { Ok(7) }).await;
    let second: Result<u32, ProviderError> = retrier.run(|| async { Ok(7) }).await;

    assert_eq!(first.unwrap(), 7);
    assert_eq!(second.unwrap(), 7);
    assert!(sleeper.waits().is_empty());

    // A failing run does not leave attempts behind for the next one
    let calls = AtomicUsize::new(0);
    let _: Result<(), ProviderError> = retrier
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::from_message("500")) }
        })
        .await;
    let _: Result<(), ProviderError> = retrier
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::from_message("500")) }
        })
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}
