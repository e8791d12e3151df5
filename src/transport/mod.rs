//! Upload transport
//!
//! The [`Transport`] trait is the only seam between the orchestration engine
//! and the network. [`HttpTransport`] is the production implementation;
//! tests inject scripted transports.

use async_trait::async_trait;

use crate::UploadTarget;

pub mod classify;
pub mod http;

pub use classify::{AttemptOutcome, FailureReason, RetryContext};
pub use http::HttpTransport;

/// Transport-level failures (no HTTP status was received)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request did not complete within the configured timeout
    #[error("timeout")]
    Timeout,

    /// DNS failure, refused or reset connection
    #[error("connection error: {0}")]
    Connection(String),

    /// Anything else (unreadable file, client construction, protocol errors)
    #[error("{0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() || err.is_request() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Unexpected(err.to_string())
        }
    }
}

/// Completed upload call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code returned by the service
    pub status: u16,
}

impl TransportResponse {
    /// Wrap a status code
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

/// Result type for transport operations
pub type TransportResult = Result<TransportResponse, TransportError>;

/// One-shot file upload
#[async_trait]
pub trait Transport: Send + Sync {
    /// Upload one file, making exactly one network call
    ///
    /// # Errors
    /// [`TransportError`] when no HTTP status was received. Non-2xx statuses
    /// are returned as `Ok` and classified by the caller.
    async fn upload(&self, target: &UploadTarget) -> TransportResult;
}
