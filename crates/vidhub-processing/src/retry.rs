//! Bounded polling with a grace period and fixed or exponential delays
//!
//! An attempt returns `Ok(Some(value))` when the awaited resource is ready,
//! `Ok(None)` when it is not ready yet and `Err(_)` when the attempt failed.
//! Not-ready and failed attempts are both absorbed until the budget runs out,
//! except errors the caller classifies as fatal, which stop the loop at once.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait before the first attempt
    pub initial_delay: Duration,
    /// Wait between attempts
    pub delay: Duration,
    /// 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
    /// Upper bound for exponential delays
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            delay,
            backoff_multiplier: 1.0,
            max_delay: delay,
        }
    }

    pub fn exponential(
        max_attempts: u32,
        initial_backoff: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            delay: initial_backoff,
            backoff_multiplier: multiplier,
            max_delay,
        }
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Wait that precedes attempt `attempt` (1-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match attempt {
            0 | 1 => self.initial_delay,
            n => {
                if (self.backoff_multiplier - 1.0).abs() < f64::EPSILON {
                    return self.delay;
                }
                let factor = self.backoff_multiplier.powi(n as i32 - 2);
                let millis = (self.delay.as_millis() as f64 * factor)
                    .min(self.max_delay.as_millis() as f64);
                Duration::from_millis(millis as u64)
            }
        }
    }

    /// Every wait the policy performs when all attempts are used.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts.max(1))
            .map(|attempt| self.delay_before(attempt))
            .collect()
    }
}

/// Result of a polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready { value: T, attempts: u32 },
    Exhausted {
        attempts: u32,
        /// Description of the final failed or not-ready attempt
        last_error: Option<String>,
    },
    /// A fatal error ended the loop before the budget ran out.
    Aborted { attempts: u32, error: String },
}

impl<T> PollOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            PollOutcome::Ready { value, .. } => Some(value),
            PollOutcome::Exhausted { .. } | PollOutcome::Aborted { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. }
            | PollOutcome::Exhausted { attempts, .. }
            | PollOutcome::Aborted { attempts, .. } => *attempts,
        }
    }
}

fn log_miss<E: Display>(
    label: &str,
    attempt: u32,
    max_attempts: u32,
    error: Option<&E>,
) -> String {
    match error {
        Some(e) => {
            tracing::warn!(label, attempt, max_attempts, error = %e, "Attempt failed");
            e.to_string()
        }
        None => {
            tracing::warn!(label, attempt, max_attempts, "Not ready yet");
            "not ready".to_string()
        }
    }
}

/// Run `attempt_fn` until it yields a value or the policy is exhausted.
///
/// Attempts run strictly one after another. There is no wait after the final
/// attempt.
pub async fn poll_until<F, Fut, T, E>(
    policy: &RetryPolicy,
    label: &str,
    attempt_fn: F,
) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    poll_until_or_abort(policy, label, |_: &E| false, attempt_fn).await
}

/// Like [`poll_until`], but an error for which `is_fatal` holds ends the loop
/// immediately with [`PollOutcome::Aborted`].
pub async fn poll_until_or_abort<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    label: &str,
    is_fatal: P,
    mut attempt_fn: F,
) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let wait = policy.delay_before(attempt);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        tracing::debug!(label, attempt, max_attempts, "Polling");
        match attempt_fn(attempt).await {
            Ok(Some(value)) => {
                return PollOutcome::Ready {
                    value,
                    attempts: attempt,
                }
            }
            Ok(None) => last_error = Some(log_miss::<E>(label, attempt, max_attempts, None)),
            Err(e) if is_fatal(&e) => {
                tracing::error!(label, attempt, error = %e, "Fatal error, polling stopped");
                return PollOutcome::Aborted {
                    attempts: attempt,
                    error: e.to_string(),
                };
            }
            Err(e) => last_error = Some(log_miss(label, attempt, max_attempts, Some(&e))),
        }
    }

    PollOutcome::Exhausted {
        attempts: max_attempts,
        last_error,
    }
}

/// Blocking counterpart of [`poll_until`] for callers on plain threads.
pub fn poll_until_blocking<F, T, E>(
    policy: &RetryPolicy,
    label: &str,
    mut attempt_fn: F,
) -> PollOutcome<T>
where
    F: FnMut(u32) -> Result<Option<T>, E>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let wait = policy.delay_before(attempt);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }

        match attempt_fn(attempt) {
            Ok(Some(value)) => {
                return PollOutcome::Ready {
                    value,
                    attempts: attempt,
                }
            }
            Ok(None) => last_error = Some(log_miss::<E>(label, attempt, max_attempts, None)),
            Err(e) => last_error = Some(log_miss(label, attempt, max_attempts, Some(&e))),
        }
    }

    PollOutcome::Exhausted {
        attempts: max_attempts,
        last_error,
    }
}
