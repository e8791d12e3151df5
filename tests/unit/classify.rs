use std::time::Duration;

use sample_uploader::transport::{
    AttemptOutcome, FailureReason, RetryContext, TransportError, TransportResponse,
};
use sample_uploader::FileDetail;

fn context(outcome: AttemptOutcome) -> RetryContext {
    RetryContext::new(2, 4, outcome, Duration::from_secs(10), "nested/a.bin")
}

#[test]
fn format_retry_captures_attempt_and_wait() {
    let message = context(AttemptOutcome::from_status(429)).format_retry();
    assert!(message.contains("Attempt 2/4"));
    assert!(message.contains("HTTP 429 (rate limit exceeded)"));
    assert!(message.contains("retrying in 10s"));
    assert!(message.contains("nested/a.bin"));
}

#[test]
fn format_retry_without_status_uses_reason() {
    let message = context(AttemptOutcome::classify(&Err(TransportError::Timeout))).format_retry();
    assert!(message.contains("network timeout"));
    assert!(!message.contains("HTTP"));
}

#[test]
fn format_failure_lists_suggestions() {
    let output = context(AttemptOutcome::from_status(401)).format_failure();
    assert!(output.contains("[FAILED] nested/a.bin failed after 2 attempt(s)"));
    assert!(output.contains("authentication failed (401)"));
    assert!(output.contains("Verify the API token"));
    assert!(!output.contains("--retries"));
}

#[test]
fn retryable_failure_suggests_more_retries() {
    let suggestions = context(AttemptOutcome::from_status(503)).format_suggestions();
    assert!(suggestions.iter().any(|s| s.contains("--retries (current: 3)")));
}

#[test]
fn status_codes_classify_by_class() {
    for code in [200, 201, 202, 204] {
        assert_eq!(AttemptOutcome::from_status(code), AttemptOutcome::Success(code));
    }
    for code in [429, 500, 502, 503, 599] {
        assert!(AttemptOutcome::from_status(code).is_retryable(), "{code}");
    }
    for code in [301, 400, 401, 403, 404, 413, 422] {
        let outcome = AttemptOutcome::from_status(code);
        assert!(!outcome.is_retryable(), "{code}");
        assert_eq!(outcome.reason(), Some(&FailureReason::ClientError));
    }
}

#[test]
fn transport_errors_classify_by_kind() {
    let timeout = AttemptOutcome::classify(&Err(TransportError::Timeout));
    assert_eq!(
        timeout,
        AttemptOutcome::RetryableFailure(FailureReason::Timeout, None)
    );

    let refused =
        AttemptOutcome::classify(&Err(TransportError::Connection("refused".to_string())));
    assert!(refused.is_retryable());
    assert_eq!(
        refused.detail(),
        FileDetail::Reason(FailureReason::ConnectionError)
    );

    let unexpected =
        AttemptOutcome::classify(&Err(TransportError::Unexpected("disk error".to_string())));
    assert!(!unexpected.is_retryable());
    assert_eq!(unexpected.detail().to_string(), "disk error");
}

#[test]
fn detail_prefers_status() {
    let outcome = AttemptOutcome::classify(&Ok(TransportResponse::new(503)));
    assert_eq!(outcome.detail(), FileDetail::Http(503));
    assert_eq!(outcome.label(), "server_error");
}
