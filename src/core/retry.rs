//! Retry and circuit-breaker policies for remote calls.
//!
//! Both are plain values applied explicitly at each call site:
//!
//! ```rust,ignore
//! let page = retry.run("pull_page", || backend.fetch_page(since_id, limit)).await?;
//! ```
//!
//! `RetryPolicy` covers transient failures (exponential backoff with
//! jitter). `CircuitBreaker` stops hammering a backend that keeps failing
//! and lets a single probe through after the recovery timeout.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

/// Exponential backoff policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one (>= 1).
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays.
    pub exponential_base: f64,

    /// Scale each delay by a random factor in `[0.5, 1.0)`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set total attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the first retry delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-based: 0 is the first retry).
    pub fn delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.initial_delay_ms as f64 * self.exponential_base.powi(attempt as i32);
        let mut delay = base.min(self.max_delay_ms as f64);
        if self.jitter {
            delay *= rng.gen_range(0.5..1.0);
        }
        Duration::from_millis(delay as u64)
    }

    /// Run `op` until it succeeds or attempts are exhausted.
    ///
    /// Returns the last error when every attempt fails.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 >= attempts => {
                    warn!(label, attempts, error = %err, "giving up after final attempt");
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_for(attempt, &mut rand::thread_rng());
                    warn!(
                        label,
                        attempt = attempt + 1,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Circuit breaker states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Failing, calls are rejected.
    Open,
    /// Recovery probe allowed.
    HalfOpen,
}

/// Returned when the breaker is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("circuit open, retry in {retry_in:?}")]
pub struct CircuitOpen {
    pub retry_in: Duration,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    opened_at: Option<Instant>,
}

/// Trips after `failure_threshold` consecutive failures.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Ask permission for a call.
    ///
    /// An open breaker moves to half-open once the recovery timeout passed.
    pub fn allow(&self) -> Result<(), CircuitOpen> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }
        let elapsed = inner
            .opened_at
            .map(|at| at.elapsed())
            .unwrap_or(self.recovery_timeout);
        if elapsed >= self.recovery_timeout {
            inner.state = CircuitState::HalfOpen;
            info!("circuit breaker half-open, allowing recovery probe");
            Ok(())
        } else {
            Err(CircuitOpen {
                retry_in: self.recovery_timeout - elapsed,
            })
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            info!("circuit breaker recovered");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.opened_at = None;
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failures += 1;
        if inner.state == CircuitState::HalfOpen || inner.failures >= self.failure_threshold {
            if inner.state != CircuitState::Open {
                warn!(failures = inner.failures, "circuit breaker opened");
            }
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // Poisoning only happens if a holder panicked; the counters stay usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
