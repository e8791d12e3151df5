//! Console rendering of run events

use std::io::{self, Write};
use tracing::warn;

use super::{FileEvent, Reporter, RunEvent};
use crate::{FileStatus, RunSummary};

const TITLE: &str = "Bulk Uploader";

/// Plain-text reporter
///
/// ```text
/// [1/3] [OK]   a.bin (HTTP 201)
/// [2/3] [FAIL] b.bin (HTTP 400)
/// ```
pub struct HumanReporter<W: Write> {
    out: W,
    width: usize,
}

impl HumanReporter<io::Stdout> {
    /// Reporter writing to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> HumanReporter<W> {
    /// Reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self { out, width: 1 }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write report output");
        }
    }

    fn started(
        &mut self,
        root: &str,
        recursive: bool,
        single_file: bool,
        total: usize,
        excluded: usize,
    ) {
        self.width = total.to_string().len();

        let mut lines = vec![
            String::new(),
            TITLE.to_string(),
            "\u{2500}".repeat(TITLE.chars().count()),
        ];
        if single_file {
            lines.push(format!("Path:       {root} (single file)"));
        } else {
            lines.push(format!("Path:       {root}"));
            lines.push(format!(
                "Recursive:  {}",
                if recursive { "yes" } else { "no" }
            ));
        }
        lines.push(String::new());
        if excluded > 0 {
            lines.push(format!(
                "Found {} files ({excluded} excluded)",
                total + excluded
            ));
        } else {
            lines.push(format!("Found {total} files"));
        }
        lines.push(String::new());

        self.emit(&lines.join("\n"));
    }

    fn file_completed(&mut self, file: &FileEvent) {
        let tag = match file.outcome {
            FileStatus::Uploaded => "[OK]  ",
            FileStatus::Failed => "[FAIL]",
        };
        let line = format!(
            "[{:>width$}/{}] {tag} {} ({})",
            file.index,
            file.total,
            file.display_name,
            file.detail,
            width = self.width
        );
        self.emit(&line);
    }

    fn finished(&mut self, summary: &RunSummary) {
        let text = format_summary(summary);
        let bar = "\u{2550}".repeat(text.chars().count() + 8);
        self.emit(&format!("\n{bar}\n  Done.  {text}\n{bar}"));
    }
}

/// `2 uploaded │ 1 failed │ 3 skipped │ 3 total`; skipped only when non-zero
pub fn format_summary(summary: &RunSummary) -> String {
    let mut parts = vec![
        format!("{} uploaded", summary.uploaded),
        format!("{} failed", summary.failed),
    ];
    if summary.excluded > 0 {
        parts.push(format!("{} skipped", summary.excluded));
    }
    if summary.not_attempted > 0 {
        parts.push(format!("{} not attempted", summary.not_attempted));
    }
    parts.push(format!("{} total", summary.total));
    parts.join(" \u{2502} ")
}

impl<W: Write> Reporter for HumanReporter<W> {
    fn report(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started {
                root,
                recursive,
                single_file,
                total,
                excluded,
            } => self.started(
                &root.display().to_string(),
                *recursive,
                *single_file,
                *total,
                *excluded,
            ),
            RunEvent::FileCompleted(file) => self.file_completed(file),
            RunEvent::EmptySelection { .. } => self.emit("No files to upload."),
            RunEvent::Interrupted { not_attempted } => self.emit(&format!(
                "\nInterrupted: {not_attempted} file(s) not attempted."
            )),
            RunEvent::Finished(summary) => self.finished(summary),
        }
    }
}
