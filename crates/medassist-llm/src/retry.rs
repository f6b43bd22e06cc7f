//! Retry logic with exponential backoff
//!
//! Each attempt runs under its own timeout. A caller deadline, when given,
//! takes precedence over the attempt budget: no attempt starts after it and
//! no backoff sleep crosses it.

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to delays
    pub jitter: bool,
    /// Upper bound for a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set initial delay
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set backoff multiplier
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based)
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_ms = self.max_delay.as_millis() as f64;
        let base_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let delay_ms = base_ms.min(max_ms) as u64;

        let final_ms = if self.jitter {
            // up to 25% jitter, still capped
            let range = delay_ms / 4;
            let jitter = if range == 0 {
                0
            } else {
                rand::thread_rng().gen_range(0..=range)
            };
            (delay_ms + jitter).min(max_ms as u64)
        } else {
            delay_ms
        };

        Duration::from_millis(final_ms)
    }
}

/// Last failure seen by the executor
#[derive(Debug)]
pub enum RetryCause<E> {
    /// The operation returned an error
    Failed(E),
    /// The attempt ran past its time budget
    TimedOut(Duration),
}

/// Error type for retry operations
#[derive(Debug)]
pub struct RetryError<E> {
    /// The last failure encountered
    pub cause: RetryCause<E>,
    /// Total number of attempts made
    pub attempts: u32,
}

impl<E> RetryError<E> {
    /// Whether the executor stopped because of time rather than an error
    #[must_use]
    pub fn timed_out(&self) -> bool {
        matches!(self.cause, RetryCause::TimedOut(_))
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            RetryCause::Failed(e) => write!(f, "failed after {} attempts: {}", self.attempts, e),
            RetryCause::TimedOut(budget) => write!(
                f,
                "failed after {} attempts: timed out after {}ms",
                self.attempts,
                budget.as_millis()
            ),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Runs an async operation under a [`RetryConfig`]
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create an executor
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `operation` with retries
    ///
    /// `operation` receives the time budget of the current attempt. Errors
    /// for which `is_transient` returns false abort immediately; an attempt
    /// that overruns its budget counts as transient.
    pub async fn run<T, E, F, Fut, R>(
        &self,
        mut operation: F,
        is_transient: R,
        deadline: Option<Instant>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: fmt::Debug,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let budget = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(RetryError {
                            cause: RetryCause::TimedOut(Duration::ZERO),
                            attempts: attempt,
                        });
                    }
                    remaining.min(self.config.attempt_timeout)
                }
                None => self.config.attempt_timeout,
            };

            attempt += 1;
            let (cause, transient) = match timeout(budget, operation(budget)).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        debug!(attempt = attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    let transient = is_transient(&e);
                    (RetryCause::Failed(e), transient)
                }
                Err(_) => (RetryCause::TimedOut(budget), true),
            };

            if !transient || attempt >= max_attempts {
                debug!(
                    attempt = attempt,
                    transient = transient,
                    cause = ?cause,
                    "Operation failed, no more retries"
                );
                return Err(RetryError {
                    cause,
                    attempts: attempt,
                });
            }

            let delay = self.config.calculate_delay(attempt);
            if let Some(deadline) = deadline {
                if Instant::now() + delay >= deadline {
                    debug!(
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Deadline reached before next retry"
                    );
                    return Err(RetryError {
                        cause,
                        attempts: attempt,
                    });
                }
            }

            warn!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                cause = ?cause,
                "Operation failed, retrying"
            );
            sleep(delay).await;
        }
    }
}
