//! Run event reporting
//!
//! The orchestrator emits, in order: [`RunEvent::Started`], one
//! [`RunEvent::FileCompleted`] per file, optionally
//! [`RunEvent::EmptySelection`] or [`RunEvent::Interrupted`], and finally
//! [`RunEvent::Finished`]. How events are rendered is up to the [`Reporter`].

use serde::Serialize;
use std::path::PathBuf;

use crate::{FileResult, FileStatus, RunSummary};

pub mod human;
pub mod json;

pub use human::HumanReporter;
pub use json::JsonReporter;

/// Per-file completion event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEvent {
    /// 1-based position in enumeration order
    pub index: usize,
    /// Number of files in the run
    pub total: usize,
    /// Path relative to the scan root
    pub display_name: String,
    /// Final status
    pub outcome: FileStatus,
    /// HTTP status or reason, e.g. `HTTP 201` or `timeout after 4 attempts`
    pub detail: String,
    /// Last HTTP status, when one was received
    pub http_status: Option<u16>,
    /// Attempts made
    pub attempts: u32,
}

impl FileEvent {
    /// Build the event for the `index`-th (1-based) of `total` results
    pub fn from_result(index: usize, total: usize, result: &FileResult) -> Self {
        let http_status = match result.detail() {
            crate::FileDetail::Http(status) => Some(*status),
            crate::FileDetail::Reason(_) => None,
        };
        Self {
            index,
            total,
            display_name: result.target().display_name().to_string(),
            outcome: result.status(),
            detail: result.describe(),
            http_status,
            attempts: result.attempts(),
        }
    }
}

/// Observable run events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Enumeration finished, uploads are about to start
    Started {
        /// Root path as configured
        root: PathBuf,
        /// Whether subdirectories are walked
        recursive: bool,
        /// Whether the root is a single file
        single_file: bool,
        /// Files selected for upload
        total: usize,
        /// Files skipped by exclude patterns
        excluded: usize,
    },
    /// One file finished
    FileCompleted(FileEvent),
    /// Nothing matched; the run completes without uploads
    EmptySelection {
        /// Files skipped by exclude patterns
        excluded: usize,
    },
    /// A shutdown request stopped the run early
    Interrupted {
        /// Files that were never started
        not_attempted: usize,
    },
    /// Run finished
    Finished(RunSummary),
}

/// Consumer of run events
pub trait Reporter {
    /// Handle one event. Called in emission order from a single task.
    fn report(&mut self, event: &RunEvent);
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Vec<RunEvent>,
}

impl MemoryReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received so far
    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    /// Only the per-file events, in order
    pub fn file_events(&self) -> Vec<&FileEvent> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RunEvent::FileCompleted(file) => Some(file),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, event: &RunEvent) {
        self.events.push(event.clone());
    }
}
