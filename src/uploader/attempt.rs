//! Single upload attempt

use std::sync::Arc;
use tracing::debug;

use crate::metrics::AttemptMetrics;
use crate::transport::{AttemptOutcome, Transport};
use crate::UploadTarget;

/// Performs exactly one transport call per [`execute`](Self::execute) and classifies it
#[derive(Clone)]
pub struct AttemptExecutor {
    transport: Arc<dyn Transport>,
}

impl AttemptExecutor {
    /// Create an executor over a transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Upload `target` once. Never retries.
    pub async fn execute(&self, target: &UploadTarget, attempt: u32) -> AttemptOutcome {
        let metrics = AttemptMetrics::start(attempt);
        let result = self.transport.upload(target).await;
        if let Err(e) = &result {
            debug!(error = %e, attempt, "Transport error");
        }
        let outcome = AttemptOutcome::classify(&result);
        metrics.record(&outcome);
        outcome
    }
}
