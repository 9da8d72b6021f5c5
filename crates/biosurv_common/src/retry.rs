//! Retriable invocation with exponential backoff and jitter
//!
//! Per invocation:
//!
//! ```text
//! Attempting --ok--------------------------------> Done
//! Attempting --retryable, attempts left--> Waiting --> Attempting
//! Attempting --retryable, attempts exhausted-----> Failed (last error)
//! Attempting --not retryable---------------------> Failed (immediately)
//! ```
//!
//! Wait before retry after attempt `i` (0-indexed) is
//! `initial_delay * backoff_factor^i + U[0, jitter)`. The last error is
//! returned unchanged so callers can still inspect it.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound (exclusive) of the uniform jitter added to every wait
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_jitter_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl RetryPolicy {
    /// Attempts actually made; zero is treated as one
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Deterministic part of the wait after attempt `attempt`
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(0.0).powi(attempt as i32);
        let ms = (self.initial_delay_ms as f64 * factor).min(u64::MAX as f64);
        Duration::from_millis(ms as u64)
    }

    /// Full wait after attempt `attempt`, jitter drawn from `rng`
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..self.jitter_ms)
        };
        self.base_delay(attempt) + Duration::from_millis(jitter)
    }
}

// ============================================================================
// Sleepers
// ============================================================================

/// Source of waiting, swapped out in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

// ============================================================================
// Retrier
// ============================================================================

/// Runs operations under a `RetryPolicy`. Holds no per-invocation state.
#[derive(Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for Retrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrier").field("policy", &self.policy).finish()
    }
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `op` until it succeeds, fails non-retryably, or attempts run out
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            let err = match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Call succeeded on attempt {}/{}", attempt + 1, attempts);
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt + 1 >= attempts {
                warn!(
                    "Retryable failure on attempt {}/{}, giving up: {}",
                    attempt + 1,
                    attempts,
                    err
                );
                return Err(err);
            }

            let wait = self.policy.delay_for(attempt, &mut rand::thread_rng());
            warn!(
                "Retryable failure on attempt {}/{}, retrying in {}ms: {}",
                attempt + 1,
                attempts,
                wait.as_millis(),
                err
            );
            self.sleeper.sleep(wait).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_error::ProviderError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording_retrier(policy: RetryPolicy) -> (Retrier, RecordingSleeper) {
        let sleeper = RecordingSleeper::new();
        (Retrier::with_sleeper(policy, Arc::new(sleeper.clone())), sleeper)
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay_ms, 2000);
        assert_eq!(policy.backoff_factor, 2.0);
        assert_eq!(policy.jitter_ms, 1000);
    }

    #[test]
    fn test_delay_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 0..5 {
            let base = 2000 * 2u64.pow(attempt);
            for _ in 0..50 {
                let d = policy.delay_for(attempt, &mut rng).as_millis() as u64;
                assert!(d >= base && d < base + 1000, "attempt {} wait {}", attempt, d);
            }
        }
    }

    #[test]
    fn test_zero_jitter() {
        let policy = RetryPolicy {
            jitter_ms: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.delay_for(2, &mut rng), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let (retrier, sleeper) = recording_retrier(RetryPolicy::default());
        let calls = AtomicUsize::new(0);

        let result: Result<(), ProviderError> = retrier
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(ProviderError::from_message(format!("503 attempt {}", n))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "503 attempt 2");
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_max_retries_is_one_attempt() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..Default::default()
        };
        let (retrier, sleeper) = recording_retrier(policy);
        let calls = AtomicUsize::new(0);

        let result: Result<(), ProviderError> = retrier
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::from_message("429")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.waits().is_empty());
    }
}
