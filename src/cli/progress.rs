//! Terminal progress bar around another reporter

use indicatif::{ProgressBar, ProgressStyle};

use crate::report::{Reporter, RunEvent};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Shows a progress bar while forwarding every event to `inner`
///
/// Lines written by the inner reporter are printed above the bar.
pub struct ProgressReporter<R: Reporter> {
    inner: R,
    bar: Option<ProgressBar>,
}

impl<R: Reporter> ProgressReporter<R> {
    /// Wrap a reporter
    pub fn new(inner: R) -> Self {
        Self { inner, bar: None }
    }

    /// Recover the wrapped reporter
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn create_bar(total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message("Uploading");
        pb
    }
}

impl<R: Reporter> Reporter for ProgressReporter<R> {
    fn report(&mut self, event: &RunEvent) {
        match &self.bar {
            Some(bar) => bar.suspend(|| self.inner.report(event)),
            None => self.inner.report(event),
        }

        match event {
            RunEvent::Started { total, .. } if *total > 0 => {
                self.bar = Some(Self::create_bar(*total));
            }
            RunEvent::FileCompleted(file) => {
                if let Some(bar) = &self.bar {
                    bar.set_message(file.display_name.clone());
                    bar.inc(1);
                }
            }
            RunEvent::Interrupted { .. } | RunEvent::Finished(_) => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {}
        }
    }
}
