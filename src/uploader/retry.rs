//! Bounded retry with linear backoff
//!
//! Per file, the scheduler runs a small state machine:
//!
//! ```text
//! Attempting(n) --success--------------------------> Done(uploaded)
//! Attempting(n) --terminal failure-----------------> Done(failed)
//! Attempting(n) --retryable, n == max_retries + 1--> Done(failed, exhausted)
//! Attempting(n) --retryable, otherwise-------------> WaitingToRetry(n, base * n)
//! WaitingToRetry(n, d) --after d-------------------> Attempting(n + 1)
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::attempt::AttemptExecutor;
use super::clock::Sleeper;
use crate::config::RunConfig;
use crate::metrics;
use crate::transport::{AttemptOutcome, RetryContext};
use crate::{FileResult, UploadTarget};

/// Retry budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff base; the wait after attempt `n` is `n * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Policy from the run's retry settings
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay_base)
    }

    /// Attempts allowed in total
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait after failed attempt `attempt` (1-based) before the next one
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Retry state for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to make attempt `attempt` (1-based)
    Attempting {
        /// Attempt number
        attempt: u32,
    },
    /// Backing off after failed attempt `attempt`
    WaitingToRetry {
        /// Attempt that failed
        attempt: u32,
        /// Wait before the next attempt
        delay: Duration,
    },
    /// Finished
    Done(FileResult),
}

/// Drives attempts for one file until success, terminal failure or exhaustion
#[derive(Clone)]
pub struct RetryScheduler {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryScheduler {
    /// Create a scheduler
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Policy in use
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Upload `target`, retrying as the policy allows
    pub async fn run(&self, executor: &AttemptExecutor, target: &UploadTarget) -> FileResult {
        let mut state = RetryState::Attempting { attempt: 1 };
        loop {
            state = match state {
                RetryState::Attempting { attempt } => {
                    let outcome = executor.execute(target, attempt).await;
                    self.transition(target, attempt, outcome)
                }
                RetryState::WaitingToRetry { attempt, delay } => {
                    self.sleeper.sleep(delay).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Done(result) => return result,
            };
        }
    }

    /// Next state after attempt `attempt` produced `outcome`
    pub fn transition(
        &self,
        target: &UploadTarget,
        attempt: u32,
        outcome: AttemptOutcome,
    ) -> RetryState {
        let max_attempts = self.policy.max_attempts();
        let context = |backoff| {
            RetryContext::new(
                attempt,
                max_attempts,
                outcome.clone(),
                backoff,
                target.display_name(),
            )
        };

        match &outcome {
            AttemptOutcome::Success(status) => {
                if attempt > 1 {
                    info!("{}", context(Duration::ZERO).format_success());
                }
                RetryState::Done(FileResult::uploaded(target.clone(), *status, attempt))
            }
            AttemptOutcome::TerminalFailure(..) => {
                warn!("{}", context(Duration::ZERO).format_failure());
                RetryState::Done(FileResult::failed(
                    target.clone(),
                    outcome.detail(),
                    attempt,
                    false,
                ))
            }
            AttemptOutcome::RetryableFailure(..) if attempt >= max_attempts => {
                warn!("{}", context(Duration::ZERO).format_failure());
                RetryState::Done(FileResult::failed(
                    target.clone(),
                    outcome.detail(),
                    attempt,
                    true,
                ))
            }
            AttemptOutcome::RetryableFailure(..) => {
                let delay = self.policy.backoff_delay(attempt);
                warn!("{}", context(delay).format_retry());
                metrics::record_retry_backoff(delay, attempt);
                RetryState::WaitingToRetry { attempt, delay }
            }
        }
    }
}
