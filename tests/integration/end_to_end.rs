//! End-to-end runs against scripted transports

use std::sync::Arc;

use sample_uploader::report::{HumanReporter, JsonReporter, MemoryReporter, RunEvent};
use sample_uploader::scanner::FileEnumerator;
use sample_uploader::uploader::{BatchUploader, RecordingSleeper};
use sample_uploader::{FileStatus, RunConfig};

use super::common::{config_for, sample_tree, status, ScriptedTransport};

async fn run_batch(
    config: RunConfig,
    transport: Arc<ScriptedTransport>,
) -> (sample_uploader::uploader::RunReport, MemoryReporter) {
    let mut reporter = MemoryReporter::new();
    let report = BatchUploader::new(Arc::new(config), transport)
        .with_sleeper(Arc::new(RecordingSleeper::new()))
        .run(&mut reporter)
        .await
        .unwrap();
    (report, reporter)
}

#[tokio::test]
async fn single_file_root_is_uploaded_once() {
    let dir = sample_tree(&["sample.bin"]);
    let transport = Arc::new(ScriptedTransport::accepting());

    let (report, reporter) =
        run_batch(config_for(&dir.path().join("sample.bin")), transport.clone()).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.summary.uploaded, 1);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.total, 1);
    assert_eq!(transport.calls(), vec!["sample.bin"]);
    assert!(matches!(
        reporter.events().first(),
        Some(RunEvent::Started {
            single_file: true,
            ..
        })
    ));
}

#[tokio::test]
async fn exclude_pattern_filters_directory() {
    let dir = sample_tree(&["a.bin", "b.txt", "c.bin"]);

    let names: Vec<String> = FileEnumerator::new(
        dir.path(),
        false,
        sample_uploader::scanner::ExcludeFilter::new(&["*.txt"]).unwrap(),
    )
    .scan()
    .unwrap()
    .map(|t| t.display_name().to_string())
    .collect();
    assert_eq!(names, vec!["a.bin", "c.bin"]);

    let transport = Arc::new(ScriptedTransport::accepting());
    let (report, _) = run_batch(
        config_for(dir.path()).with_exclude_patterns(["*.txt"]),
        transport.clone(),
    )
    .await;
    assert_eq!(transport.calls(), vec!["a.bin", "c.bin"]);
    assert_eq!(report.summary.excluded, 1);
    assert_eq!(report.summary.total, 2);
}

#[tokio::test]
async fn rate_limited_twice_then_accepted() {
    let dir = sample_tree(&["a.bin"]);
    let transport = Arc::new(
        ScriptedTransport::accepting().script("a.bin", vec![status(429), status(429), status(201)]),
    );

    let (report, reporter) = run_batch(
        config_for(dir.path()).with_retries(3, std::time::Duration::from_secs(5)),
        transport.clone(),
    )
    .await;

    let result = &report.results[0];
    assert_eq!(result.status(), FileStatus::Uploaded);
    assert_eq!(result.attempts(), 3);
    assert_eq!(transport.calls().len(), 3);
    assert_eq!(reporter.file_events()[0].detail, "HTTP 201");
}

#[tokio::test]
async fn bad_request_fails_without_retry() {
    let dir = sample_tree(&["a.bin"]);
    let transport = Arc::new(ScriptedTransport::always(status(400)));

    let (report, _) = run_batch(config_for(dir.path()), transport.clone()).await;

    let result = &report.results[0];
    assert_eq!(result.status(), FileStatus::Failed);
    assert_eq!(result.attempts(), 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.uploaded, 0);
    assert!(!report.summary.is_success());
}

#[tokio::test]
async fn one_failure_does_not_stop_the_batch() {
    let dir = sample_tree(&["a.bin", "b.bin", "c.bin"]);
    let transport =
        Arc::new(ScriptedTransport::accepting().script("b.bin", vec![status(413)]));

    let (report, reporter) = run_batch(config_for(dir.path()), transport.clone()).await;

    assert_eq!(transport.calls(), vec!["a.bin", "b.bin", "c.bin"]);
    let outcomes: Vec<_> = reporter.file_events().iter().map(|f| f.outcome).collect();
    assert_eq!(
        outcomes,
        vec![FileStatus::Uploaded, FileStatus::Failed, FileStatus::Uploaded]
    );
    assert_eq!(report.summary.uploaded, 2);
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn recursive_run_uploads_nested_files() {
    let dir = sample_tree(&["top.bin", "nested/deep.bin", "nested/skip.log"]);
    let transport = Arc::new(ScriptedTransport::accepting());

    let (report, _) = run_batch(
        config_for(dir.path())
            .with_recursive(true)
            .with_exclude_patterns(["*.log"]),
        transport.clone(),
    )
    .await;

    let sep = std::path::MAIN_SEPARATOR;
    assert_eq!(
        transport.calls(),
        vec![format!("nested{sep}deep.bin"), "top.bin".to_string()]
    );
    assert_eq!(report.summary.excluded, 1);
}

#[tokio::test]
async fn human_report_matches_console_layout() {
    let dir = sample_tree(&["a.bin", "b.bin", "notes.txt"]);
    let transport = Arc::new(ScriptedTransport::accepting().script("b.bin", vec![status(400)]));
    let config = config_for(dir.path()).with_exclude_patterns(["*.txt"]);

    let mut reporter = HumanReporter::new(Vec::new());
    BatchUploader::new(Arc::new(config), transport)
        .with_sleeper(Arc::new(RecordingSleeper::new()))
        .run(&mut reporter)
        .await
        .unwrap();
    let output = String::from_utf8(reporter.into_inner()).unwrap();

    assert!(output.contains("Bulk Uploader"));
    assert!(output.contains("Recursive:  no"));
    assert!(output.contains("Found 3 files (1 excluded)"));
    assert!(output.contains("[1/2] [OK]   a.bin (HTTP 201)"));
    assert!(output.contains("[2/2] [FAIL] b.bin (HTTP 400)"));
    assert!(output
        .contains("Done.  1 uploaded \u{2502} 1 failed \u{2502} 1 skipped \u{2502} 2 total"));
}

#[tokio::test]
async fn json_report_emits_one_event_per_line() {
    let dir = sample_tree(&["a.bin", "b.bin"]);
    let transport = Arc::new(ScriptedTransport::accepting());

    let mut reporter = JsonReporter::new(Vec::new());
    BatchUploader::new(Arc::new(config_for(dir.path())), transport)
        .with_sleeper(Arc::new(RecordingSleeper::new()))
        .run(&mut reporter)
        .await
        .unwrap();
    let output = String::from_utf8(reporter.into_inner()).unwrap();

    let kinds: Vec<String> = output
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["started", "file_completed", "file_completed", "finished"]
    );
}

#[tokio::test]
async fn empty_directory_completes_successfully() {
    let dir = sample_tree(&[]);
    let transport = Arc::new(ScriptedTransport::accepting());

    let (report, reporter) = run_batch(config_for(dir.path()), transport.clone()).await;

    assert!(transport.calls().is_empty());
    assert!(report.summary.is_success());
    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, RunEvent::EmptySelection { excluded: 0 })));
}
