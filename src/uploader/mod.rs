//! Upload orchestration
//!
//! Layered bottom-up:
//!
//! - [`attempt::AttemptExecutor`] makes exactly one transport call and classifies it
//! - [`retry::RetryScheduler`] repeats attempts for one file with linear backoff
//! - [`pacer::RatePacer`] spaces the starts (or completions) of distinct files
//! - [`batch::BatchUploader`] walks the selection, reports events in order and
//!   builds the [`RunSummary`]
//!
//! All waits go through a [`clock::Sleeper`], so the timing behaviour can be
//! asserted without real delays.

pub mod attempt;
pub mod batch;
pub mod clock;
pub mod pacer;
pub mod retry;

pub use attempt::AttemptExecutor;
pub use batch::BatchUploader;
pub use clock::{RecordingSleeper, Sleeper, TokioSleeper};
pub use pacer::RatePacer;
pub use retry::{RetryPolicy, RetryScheduler, RetryState};

use crate::config::ConfigError;
use crate::scanner::ScanError;
use crate::{FileResult, RunSummary};

/// Errors that abort a run before any file is attempted
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Root path could not be enumerated
    #[error("enumeration error: {0}")]
    Scan(#[from] ScanError),
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Per-file results in enumeration order
    pub results: Vec<FileResult>,
    /// Aggregated counts
    pub summary: RunSummary,
}
