//! Bounded retry of a single provider.
//!
//! Only [`ErrorKind::Unavailable`] is retried. Each attempt runs under its
//! own timeout, capped by the caller's deadline, and a timed-out attempt
//! counts as unavailable. Backoff is deterministic.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use wayfinder_core::{ErrorKind, ProviderError};

/// Default number of attempts per provider.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default per-attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay between attempts.
pub const DEFAULT_BACKOFF_DELAY: Duration = Duration::from_millis(200);

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait the same delay before every retry.
    Fixed(Duration),
    /// Multiply the delay by `factor` after every retry, up to `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Growth factor applied per retry.
        factor: u32,
        /// Upper bound on any single delay.
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed(DEFAULT_BACKOFF_DELAY)
    }
}

impl Backoff {
    /// Delay to wait after `failed_attempts` consecutive failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use wayfinder_resolver::Backoff;
    ///
    /// let backoff = Backoff::Exponential {
    ///     initial: Duration::from_millis(100),
    ///     factor: 2,
    ///     max: Duration::from_millis(300),
    /// };
    /// assert_eq!(backoff.delay_after(1), Duration::from_millis(100));
    /// assert_eq!(backoff.delay_after(2), Duration::from_millis(200));
    /// assert_eq!(backoff.delay_after(3), Duration::from_millis(300));
    /// ```
    #[must_use]
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Exponential {
                initial,
                factor,
                max,
            } => {
                let growth = factor.saturating_pow(failed_attempts.saturating_sub(1));
                initial.saturating_mul(growth).min(max)
            }
        }
    }
}

/// Attempt limit, per-attempt timeout and backoff for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    attempt_timeout: Duration,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            backoff: Backoff::default(),
        }
    }
}

/// Result of running a call under a [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T> {
    /// The successful value or the last error observed.
    pub result: Result<T, ProviderError>,
    /// Attempts actually made. Zero when the deadline had already passed.
    pub attempts: u32,
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` attempts (at least one) with default
    /// timeout and backoff.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self::default().with_max_attempts(max_attempts)
    }

    /// Set the attempt limit. Zero is raised to one.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Set the backoff schedule.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Maximum attempts per provider.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Timeout applied to each attempt.
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Backoff schedule between attempts.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run `call` until it succeeds, fails terminally, exhausts the attempt
    /// limit or runs out of time before `deadline`.
    pub async fn run<T, F, Fut>(&self, deadline: Option<Instant>, mut call: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempts = 0;
        loop {
            let Some(budget) = self.budget(deadline) else {
                return RetryOutcome {
                    result: Err(ProviderError::unavailable("deadline exceeded")),
                    attempts,
                };
            };
            attempts += 1;
            let result = timeout(budget, call()).await.unwrap_or_else(|_| {
                Err(ProviderError::unavailable(format!(
                    "attempt timed out after {}ms",
                    budget.as_millis()
                )))
            });
            let error = match result {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                    };
                }
                Err(error) => error,
            };
            if error.kind() != ErrorKind::Unavailable || attempts >= self.max_attempts {
                return RetryOutcome {
                    result: Err(error),
                    attempts,
                };
            }
            let delay = self.backoff.delay_after(attempts);
            if deadline.is_some_and(|at| Instant::now().checked_add(delay).is_none_or(|t| t >= at)) {
                return RetryOutcome {
                    result: Err(error),
                    attempts,
                };
            }
            log::debug!("attempt {attempts} failed ({error}); retrying in {delay:?}");
            sleep(delay).await;
        }
    }

    /// Time allowed for the next attempt, or `None` once the deadline passed.
    fn budget(&self, deadline: Option<Instant>) -> Option<Duration> {
        match deadline {
            None => Some(self.attempt_timeout),
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                (!remaining.is_zero()).then(|| remaining.min(self.attempt_timeout))
            }
        }
    }
}
