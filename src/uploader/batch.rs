//! Batch orchestration
//!
//! Enumerates the root, then pushes every target through the pacing gate and
//! the retry scheduler. Up to `concurrency` files may be in flight, but starts
//! are gated one at a time and results are reported in enumeration order.
//!
//! A shutdown request stops new files from starting; files already in flight
//! run to completion and everything after them is counted as not attempted.

use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use super::attempt::AttemptExecutor;
use super::clock::{Sleeper, TokioSleeper};
use super::pacer::RatePacer;
use super::retry::{RetryPolicy, RetryScheduler};
use super::{RunReport, UploadError};
use crate::config::RunConfig;
use crate::metrics;
use crate::report::{FileEvent, Reporter, RunEvent};
use crate::scanner::{FileEnumerator, ScanError};
use crate::shutdown::SharedShutdown;
use crate::transport::Transport;
use crate::{FileResult, RunSummary, UploadTarget};

/// Uploads every file selected by a [`RunConfig`]
pub struct BatchUploader {
    config: Arc<RunConfig>,
    executor: AttemptExecutor,
    scheduler: RetryScheduler,
    sleeper: Arc<dyn Sleeper>,
    shutdown: Option<SharedShutdown>,
}

impl BatchUploader {
    /// Create an uploader with real (tokio) waits and no shutdown handle
    pub fn new(config: Arc<RunConfig>, transport: Arc<dyn Transport>) -> Self {
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        Self {
            executor: AttemptExecutor::new(transport),
            scheduler: RetryScheduler::new(RetryPolicy::from_config(&config), sleeper.clone()),
            sleeper,
            config,
            shutdown: None,
        }
    }

    /// Route pacing and backoff waits through `sleeper`
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.scheduler = RetryScheduler::new(self.scheduler.policy(), sleeper.clone());
        self.sleeper = sleeper;
        self
    }

    /// Stop starting new files once `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run the whole batch
    ///
    /// # Errors
    /// [`UploadError`] when the configuration is invalid or the root cannot
    /// be enumerated. Per-file failures are not errors; they are reported and
    /// counted in the summary.
    pub async fn run(&self, reporter: &mut dyn Reporter) -> Result<RunReport, UploadError> {
        self.config.validate()?;

        let enumeration = FileEnumerator::from_config(&self.config)?.scan()?;
        let single_file = enumeration.is_single_file();
        let (targets, excluded) = match enumeration.into_selection() {
            Ok(selection) => (selection.targets, selection.excluded),
            Err(ScanError::EmptySelection { excluded }) => (Vec::new(), excluded),
            Err(e) => return Err(e.into()),
        };
        let total = targets.len();

        info!(
            root = %self.config.path.display(),
            total,
            excluded,
            concurrency = self.config.concurrency,
            pacing = %self.config.pacing_mode,
            "Starting upload run"
        );
        reporter.report(&RunEvent::Started {
            root: self.config.path.clone(),
            recursive: self.config.recursive,
            single_file,
            total,
            excluded,
        });

        if targets.is_empty() {
            info!(excluded, "No files to upload");
            reporter.report(&RunEvent::EmptySelection { excluded });
            let summary = RunSummary::from_results(&[], excluded, 0);
            reporter.report(&RunEvent::Finished(summary));
            return Ok(RunReport {
                results: Vec::new(),
                summary,
            });
        }

        let results = self.upload_all(&targets, reporter).await;

        let not_attempted = total - results.len();
        if not_attempted > 0 {
            warn!(not_attempted, "Run interrupted before all files were started");
            reporter.report(&RunEvent::Interrupted { not_attempted });
        }

        let summary = RunSummary::from_results(&results, excluded, not_attempted);
        info!(
            uploaded = summary.uploaded,
            failed = summary.failed,
            excluded = summary.excluded,
            not_attempted = summary.not_attempted,
            "Upload run finished"
        );
        reporter.report(&RunEvent::Finished(summary));

        Ok(RunReport { results, summary })
    }

    async fn upload_all(
        &self,
        targets: &[UploadTarget],
        reporter: &mut dyn Reporter,
    ) -> Vec<FileResult> {
        let total = targets.len();
        let pacer = RatePacer::from_config(&self.config);
        let pacer = &pacer;
        let sleeper = self.sleeper.as_ref();

        // Gating runs sequentially in `then`, so starts stay paced and in
        // order even when several uploads are buffered behind it.
        let uploads = stream::iter(targets)
            .then(move |target| async move {
                if self.shutdown_requested() {
                    return None;
                }
                pacer.gate(sleeper).await;
                if self.shutdown_requested() {
                    return None;
                }
                Some(target)
            })
            .take_while(|target| future::ready(target.is_some()))
            .filter_map(future::ready)
            .map(|target| self.upload_one(target))
            .buffered(self.config.concurrency);
        futures::pin_mut!(uploads);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = uploads.next().await {
            pacer.mark_completed();
            let event = FileEvent::from_result(results.len() + 1, total, &result);
            reporter.report(&RunEvent::FileCompleted(event));
            results.push(result);
        }
        results
    }

    async fn upload_one(&self, target: &UploadTarget) -> FileResult {
        let started = Instant::now();
        let result = self
            .scheduler
            .run(&self.executor, target)
            .instrument(info_span!("upload", file = %target.display_name()))
            .await;
        metrics::record_file_result(&result, started.elapsed());
        result
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|shutdown| shutdown.is_shutdown_requested())
    }
}
