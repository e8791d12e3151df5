//! # Sample Uploader Library
//!
//! Bulk submission of files to a remote file-analysis appliance over its
//! authenticated HTTP upload API.
//!
//! ## Features
//!
//! - **Deterministic enumeration**: name-sorted directory walks with shell-glob excludes
//! - **Failure classification**: retryable (timeout, connection, 429, 5xx) vs. terminal
//! - **Linear backoff**: `base`, `2 × base`, `3 × base`, ... between attempts of one file
//! - **Rate pacing**: minimum spacing between the uploads of distinct files
//! - **Ordered reporting**: one outcome per file, in enumeration order, plus a summary
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sample_uploader::config::RunConfig;
//! use sample_uploader::report::HumanReporter;
//! use sample_uploader::transport::HttpTransport;
//! use sample_uploader::uploader::BatchUploader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(RunConfig::new("https://a1000.example.com", "secret-token", "./samples"));
//! config.validate()?;
//!
//! let transport = Arc::new(HttpTransport::from_config(&config)?);
//! let uploader = BatchUploader::new(config, transport);
//!
//! let mut reporter = HumanReporter::stdout();
//! let report = uploader.run(&mut reporter).await?;
//! assert!(report.summary.total >= report.summary.uploaded);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`scanner`] - File enumeration with exclude patterns
//! - [`transport`] - Upload transport seam, reqwest implementation, outcome classification
//! - [`uploader`] - Attempt executor, retry scheduler, rate pacer, batch orchestrator
//! - [`report`] - Run event stream and its human/JSON renderers
//! - [`config`] - Immutable run configuration
//! - [`cli`] - Command-line front end resolving flags and environment into a config

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::transport::classify::FailureReason;

/// CLI command implementations
pub mod cli;

/// Immutable run configuration
pub mod config;

/// Upload metrics
pub mod metrics;

/// Run event reporting
pub mod report;

/// File enumeration
pub mod scanner;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Upload transport and outcome classification
pub mod transport;

/// Upload orchestration
pub mod uploader;

pub use config::RunConfig;

/// A file selected for upload.
///
/// Created by the enumerator and consumed read-only by everything downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTarget {
    path: PathBuf,
    display_name: String,
}

impl UploadTarget {
    /// Create a target from an absolute path and its name relative to the scan root
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// Absolute path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the scan root, used in reports
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Base name of the file, sent as the multipart file name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_name.clone())
    }
}

/// Final status of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// The service accepted the file
    Uploaded,
    /// The file could not be uploaded
    Failed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Uploaded => write!(f, "uploaded"),
            FileStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Last HTTP status or error reason observed for a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileDetail {
    /// The last attempt completed with this HTTP status
    Http(u16),
    /// The last attempt failed before a status was received
    Reason(FailureReason),
}

impl fmt::Display for FileDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileDetail::Http(status) => write!(f, "HTTP {status}"),
            FileDetail::Reason(reason) => write!(f, "{reason}"),
        }
    }
}

/// Terminal per-file record produced by the retry scheduler (immutable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    target: UploadTarget,
    status: FileStatus,
    detail: FileDetail,
    attempts: u32,
    retries_exhausted: bool,
}

impl FileResult {
    /// Record a successful upload
    pub fn uploaded(target: UploadTarget, http_status: u16, attempts: u32) -> Self {
        Self {
            target,
            status: FileStatus::Uploaded,
            detail: FileDetail::Http(http_status),
            attempts,
            retries_exhausted: false,
        }
    }

    /// Record a failed upload
    pub fn failed(
        target: UploadTarget,
        detail: FileDetail,
        attempts: u32,
        retries_exhausted: bool,
    ) -> Self {
        Self {
            target,
            status: FileStatus::Failed,
            detail,
            attempts,
            retries_exhausted,
        }
    }

    /// File this result belongs to
    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    /// Final status
    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Last HTTP status or error reason
    pub fn detail(&self) -> &FileDetail {
        &self.detail
    }

    /// Number of attempts made (at least 1)
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the file failed because the retry budget ran out
    pub fn retries_exhausted(&self) -> bool {
        self.retries_exhausted
    }

    /// Whether the file was uploaded
    pub fn is_uploaded(&self) -> bool {
        self.status == FileStatus::Uploaded
    }

    /// Detail text as shown to users, e.g. `HTTP 503 after 4 attempts`
    pub fn describe(&self) -> String {
        if self.retries_exhausted {
            format!("{} after {} attempts", self.detail, self.attempts)
        } else {
            self.detail.to_string()
        }
    }
}

/// Counts for a finished run. Produced once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    /// Files the service accepted
    pub uploaded: usize,
    /// Files that failed
    pub failed: usize,
    /// Files attempted (`uploaded + failed`)
    pub total: usize,
    /// Files skipped by exclude patterns
    pub excluded: usize,
    /// Files left untouched because the run was interrupted
    pub not_attempted: usize,
    /// Whether the run stopped early on a shutdown request
    pub interrupted: bool,
}

impl RunSummary {
    /// Build the summary from the ordered per-file results
    pub fn from_results(results: &[FileResult], excluded: usize, not_attempted: usize) -> Self {
        let uploaded = results.iter().filter(|r| r.is_uploaded()).count();
        let failed = results.len() - uploaded;
        Self {
            uploaded,
            failed,
            total: results.len(),
            excluded,
            not_attempted,
            interrupted: not_attempted > 0,
        }
    }

    /// True when nothing failed and the run was not interrupted
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }
}
