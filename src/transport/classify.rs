//! Attempt outcome classification and retry message formatting.
//!
//! Every upload attempt maps to exactly one [`AttemptOutcome`]:
//!
//! | Attempt result            | Outcome                          |
//! |---------------------------|----------------------------------|
//! | 2xx                       | `Success(status)`                |
//! | 429                       | `RetryableFailure(RateLimited)`  |
//! | 5xx                       | `RetryableFailure(ServerError)`  |
//! | timeout                   | `RetryableFailure(Timeout)`      |
//! | connection error          | `RetryableFailure(ConnectionError)` |
//! | any other status          | `TerminalFailure(ClientError)`   |
//! | any other transport error | `TerminalFailure(Other)`         |

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::{TransportError, TransportResult};
use crate::FileDetail;

/// Why an attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Request timed out
    Timeout,
    /// DNS failure, refused or reset connection
    ConnectionError,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Any non-2xx status other than 429 and 5xx
    ClientError,
    /// Unclassified error, with its message
    Other(String),
}

impl FailureReason {
    /// Short stable label, used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::Other(_) => "other",
        }
    }

    /// User-friendly description, refined by the status code when known
    pub fn description(&self, status: Option<u16>) -> &'static str {
        match (self, status) {
            (Self::Timeout, _) => "network timeout",
            (Self::ConnectionError, _) => "connection failed",
            (Self::RateLimited, _) => "rate limit exceeded",
            (Self::ServerError, Some(502)) => "bad gateway",
            (Self::ServerError, Some(503)) => "service unavailable",
            (Self::ServerError, Some(504)) => "gateway timeout",
            (Self::ServerError, _) => "server error",
            (Self::ClientError, Some(401)) => "authentication failed (401)",
            (Self::ClientError, Some(403)) => "permission denied (403)",
            (Self::ClientError, Some(404)) => "upload endpoint not found",
            (Self::ClientError, Some(413)) => "file too large for the service",
            (Self::ClientError, _) => "request rejected",
            (Self::Other(_), _) => "unexpected error",
        }
    }

    /// Suggested remediation after a final failure
    pub fn suggestion(&self, status: Option<u16>) -> &'static str {
        match (self, status) {
            (Self::Timeout, _) => "Raise --timeout for large files or check the network path",
            (Self::ConnectionError, _) => "Verify the host URL, DNS resolution and firewall rules",
            (Self::RateLimited, _) => "Increase --sleep to slow down submissions",
            (Self::ServerError, _) => "The appliance may be overloaded, try again later",
            (Self::ClientError, Some(401 | 403)) => "Verify the API token and its permissions",
            (Self::ClientError, Some(404)) => "Check that --host points at the appliance root URL",
            (Self::ClientError, _) => "Inspect the file and the appliance logs",
            (Self::Other(_), _) => "Check that the file is readable",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionError => write!(f, "connection error"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::ServerError => write!(f, "server error"),
            Self::ClientError => write!(f, "client error"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

/// Classified result of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response
    Success(u16),
    /// Transient failure, eligible for backoff and retry
    RetryableFailure(FailureReason, Option<u16>),
    /// Permanent failure, stop processing this file
    TerminalFailure(FailureReason, Option<u16>),
}

impl AttemptOutcome {
    /// Classify a completed HTTP call
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success(status),
            429 => Self::RetryableFailure(FailureReason::RateLimited, Some(status)),
            500..=599 => Self::RetryableFailure(FailureReason::ServerError, Some(status)),
            _ => Self::TerminalFailure(FailureReason::ClientError, Some(status)),
        }
    }

    /// Classify a transport-level failure
    pub fn from_transport_error(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout => Self::RetryableFailure(FailureReason::Timeout, None),
            TransportError::Connection(_) => {
                Self::RetryableFailure(FailureReason::ConnectionError, None)
            }
            TransportError::Unexpected(message) => {
                Self::TerminalFailure(FailureReason::Other(message.clone()), None)
            }
        }
    }

    /// Classify whatever the transport returned
    pub fn classify(result: &TransportResult) -> Self {
        match result {
            Ok(response) => Self::from_status(response.status),
            Err(err) => Self::from_transport_error(err),
        }
    }

    /// Whether another attempt may help
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableFailure(..))
    }

    /// HTTP status, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success(status) => Some(*status),
            Self::RetryableFailure(_, status) | Self::TerminalFailure(_, status) => *status,
        }
    }

    /// Failure reason, `None` on success
    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::RetryableFailure(reason, _) | Self::TerminalFailure(reason, _) => Some(reason),
        }
    }

    /// Detail recorded in the file result: the status if any, else the reason
    pub fn detail(&self) -> FileDetail {
        match (self.status(), self.reason()) {
            (Some(status), _) => FileDetail::Http(status),
            (None, Some(reason)) => FileDetail::Reason(reason.clone()),
            (None, None) => FileDetail::Reason(FailureReason::Other("unknown".to_string())),
        }
    }

    /// Metrics label for this outcome
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::RetryableFailure(reason, _) | Self::TerminalFailure(reason, _) => reason.label(),
        }
    }
}

/// Context for formatting retry log messages
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Attempt that just completed (1-based)
    pub attempt: u32,
    /// Attempts allowed in total
    pub max_attempts: u32,
    /// Outcome of the attempt
    pub outcome: AttemptOutcome,
    /// Wait before the next attempt
    pub backoff: Duration,
    /// File being uploaded
    pub display_name: String,
}

impl RetryContext {
    /// Convenience constructor
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        outcome: AttemptOutcome,
        backoff: Duration,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            outcome,
            backoff,
            display_name: display_name.into(),
        }
    }

    fn cause(&self) -> String {
        let detail = self.outcome.detail();
        match self.outcome.reason() {
            Some(reason) => match detail {
                FileDetail::Http(_) => {
                    format!("{detail} ({})", reason.description(self.outcome.status()))
                }
                FileDetail::Reason(_) => reason.description(None).to_string(),
            },
            None => detail.to_string(),
        }
    }

    /// `Attempt 1/4: HTTP 503 (service unavailable), retrying in 5s (a.bin)`
    pub fn format_retry(&self) -> String {
        format!(
            "Attempt {}/{}: {}, retrying in {:.0}s ({})",
            self.attempt,
            self.max_attempts,
            self.cause(),
            self.backoff.as_secs_f64(),
            self.display_name
        )
    }

    /// Message logged when a retried upload finally succeeds
    pub fn format_success(&self) -> String {
        format!(
            "Attempt {}/{} succeeded ({})",
            self.attempt, self.max_attempts, self.display_name
        )
    }

    /// Multi-line failure summary with remediation hints
    pub fn format_failure(&self) -> String {
        let mut lines = vec![
            format!(
                "[FAILED] {} failed after {} attempt(s)",
                self.display_name, self.attempt
            ),
            format!("  Last error: {}", self.cause()),
            "  Suggestions:".to_string(),
        ];
        for suggestion in self.format_suggestions() {
            lines.push(format!("    - {suggestion}"));
        }
        lines.join("\n")
    }

    /// Suggestions tailored to the last outcome
    pub fn format_suggestions(&self) -> Vec<String> {
        let mut suggestions = Vec::new();
        if let Some(reason) = self.outcome.reason() {
            suggestions.push(reason.suggestion(self.outcome.status()).to_string());
        }
        if self.outcome.is_retryable() {
            suggestions.push(format!(
                "Try increasing --retries (current: {})",
                self.max_attempts.saturating_sub(1)
            ));
        }
        suggestions
    }
}
