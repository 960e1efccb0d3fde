//! Retry logic with exponential backoff.
//!
//! The delay before retry `n` (0-indexed) is
//! `min(base_delay * exponential_base^n, max_delay)`, optionally scaled by a
//! random jitter factor. Delays are slept with `tokio::time::sleep`, so tests
//! running on a paused clock observe them exactly.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Exponential base (typically 2.0 for doubling).
    pub exponential_base: f64,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts. Clamped to at least one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay slept after failed attempt `attempt` (0-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let multiplier = self.exponential_base.powi(attempt.min(i32::MAX as u32) as i32);
        let delay_secs = self.base_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());

        let final_secs = if self.jitter {
            // Factor in 0.5..1.5
            let jitter_factor = rand::rng().random_range(0.5..1.5);
            (capped_secs * jitter_factor).min(self.max_delay.as_secs_f64())
        } else {
            capped_secs
        };

        Duration::from_secs_f64(final_secs)
    }
}

/// Statistics about a retry operation.
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    /// Number of attempts made.
    pub attempts: u32,
    /// Each backoff delay slept, in order.
    pub delays: Vec<Duration>,
    /// Whether the operation ultimately succeeded.
    pub success: bool,
    /// Last error message if any attempt failed.
    pub last_error: Option<String>,
}

/// Retry an async operation with exponential backoff.
///
/// `operation` receives the 0-indexed attempt number. Errors for which
/// `should_retry` returns false end the loop immediately.
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
) -> (Result<T, E>, RetryStats)
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut stats = RetryStats::default();
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        stats.attempts = attempt + 1;

        let error = match operation(attempt).await {
            Ok(value) => {
                stats.success = true;
                if attempt > 0 {
                    debug!("Operation succeeded after {} attempts", attempt + 1);
                }
                return (Ok(value), stats);
            }
            Err(e) => e,
        };

        stats.last_error = Some(error.to_string());

        if !should_retry(&error) {
            debug!("Error is not retryable: {}", error);
            return (Err(error), stats);
        }

        if attempt + 1 >= max_attempts {
            warn!(
                "All {} attempts exhausted. Last error: {}",
                max_attempts, error
            );
            return (Err(error), stats);
        }

        let delay = config.calculate_delay(attempt);
        stats.delays.push(delay);
        warn!(
            "Attempt {}/{} failed: {}. Retrying in {:?}",
            attempt + 1,
            max_attempts,
            error,
            delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
