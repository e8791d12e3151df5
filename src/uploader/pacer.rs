//! Inter-file rate pacing
//!
//! Enforces a minimum spacing between the uploads of distinct files. Retries
//! of one file are not paced here; the retry scheduler's backoff covers them.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::clock::Sleeper;
use crate::config::{PacingMode, RunConfig};
use crate::metrics;

/// Single-mark pacer, one instance per run
///
/// The mark lives behind a short-lived lock that is never held across a
/// wait, so the pacer can be shared by reference between the gating stage
/// and the completion handler of a run.
#[derive(Debug)]
pub struct RatePacer {
    interval: Duration,
    mode: PacingMode,
    last_mark: Mutex<Option<Instant>>,
}

impl RatePacer {
    /// Create a pacer
    ///
    /// # Arguments
    /// * `interval` - Minimum spacing between files
    /// * `mode` - Whether spacing is measured from the previous start or completion
    pub fn new(interval: Duration, mode: PacingMode) -> Self {
        Self {
            interval,
            mode,
            last_mark: Mutex::new(None),
        }
    }

    /// Create a pacer from the run's sleep and pacing mode
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.sleep, config.pacing_mode)
    }

    /// Wait still required at `now`. Zero before the first file.
    pub fn required_wait(&self, now: Instant) -> Duration {
        match *self.mark() {
            Some(mark) => mark
                .checked_add(self.interval)
                .map_or(Duration::MAX, |deadline| deadline.saturating_duration_since(now)),
            None => Duration::ZERO,
        }
    }

    /// Wait until the next file may start, then record its start
    ///
    /// Callers must not gate two files concurrently.
    ///
    /// # Returns
    /// The wait that was applied
    pub async fn gate(&self, sleeper: &dyn Sleeper) -> Duration {
        let wait = self.required_wait(Instant::now());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Pacing before next file");
            sleeper.sleep(wait).await;
            metrics::record_pacing_wait(wait);
        }
        if self.mode == PacingMode::FromStart {
            *self.mark() = Some(Instant::now());
        }
        wait
    }

    /// Record that the current file finished
    pub fn mark_completed(&self) {
        if self.mode == PacingMode::FromCompletion {
            *self.mark() = Some(Instant::now());
        }
    }

    fn mark(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.last_mark.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
