//! Upload observability metrics
//!
//! Counters and histograms for attempts, retries, pacing and per-file
//! outcomes, emitted through the `metrics` facade. Nothing is recorded
//! unless a recorder is installed, so library users pay nothing by default.
//!
//! ## Architecture
//!
//! - `metrics` macros at the call sites (attempt executor, retry scheduler, pacer)
//! - Optional Prometheus exporter bound by [`init_metrics`] (`--metrics-addr`)

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::transport::AttemptOutcome;
use crate::FileResult;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls return `Ok(())` without rebinding.
///
/// # Arguments
/// * `addr` - Socket address for the scrape endpoint (e.g., "127.0.0.1:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics exporter on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "upload_attempts_total",
        Unit::Count,
        "Upload attempts by classified outcome"
    );
    describe_histogram!(
        "upload_attempt_duration_seconds",
        Unit::Seconds,
        "Duration of a single upload attempt"
    );
    describe_counter!(
        "upload_retries_total",
        Unit::Count,
        "Retries scheduled after a retryable failure"
    );
    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Backoff waited before a retry"
    );
    describe_histogram!(
        "pacing_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for the inter-file pacing interval"
    );
    describe_counter!(
        "uploads_completed_total",
        Unit::Count,
        "Files accepted by the service"
    );
    describe_counter!(
        "uploads_failed_total",
        Unit::Count,
        "Files that could not be uploaded"
    );

    *initialized = true;
    Ok(())
}

/// Check if the exporter is installed
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Times one upload attempt
pub struct AttemptMetrics {
    start_time: Instant,
    attempt: u32,
}

impl AttemptMetrics {
    /// Start timing an attempt (1-based)
    pub fn start(attempt: u32) -> Self {
        Self {
            start_time: Instant::now(),
            attempt,
        }
    }

    /// Record the classified outcome of the attempt
    pub fn record(&self, outcome: &AttemptOutcome) {
        let duration = self.start_time.elapsed();

        counter!(
            "upload_attempts_total",
            "outcome" => outcome.label(),
            "first_attempt" => (self.attempt == 1).to_string(),
        )
        .increment(1);

        histogram!("upload_attempt_duration_seconds").record(duration.as_secs_f64());

        debug!(
            attempt = self.attempt,
            outcome = outcome.label(),
            status = outcome.status(),
            duration_ms = duration.as_millis() as u64,
            "Upload attempt finished"
        );
    }
}

/// Record a scheduled retry and its backoff
pub fn record_retry_backoff(duration: Duration, attempt: u32) {
    counter!("upload_retries_total").increment(1);
    histogram!("retry_backoff_duration_seconds").record(duration.as_secs_f64());

    debug!(
        attempt = attempt,
        backoff_ms = duration.as_millis() as u64,
        "Retry backoff recorded"
    );
}

/// Record time spent in the pacing gate
pub fn record_pacing_wait(duration: Duration) {
    histogram!("pacing_wait_seconds").record(duration.as_secs_f64());
}

/// Record the final outcome of one file
pub fn record_file_result(result: &FileResult, elapsed: Duration) {
    if result.is_uploaded() {
        counter!("uploads_completed_total").increment(1);
    } else {
        counter!("uploads_failed_total").increment(1);
    }

    debug!(
        file = %result.target().display_name(),
        status = %result.status(),
        attempts = result.attempts(),
        elapsed_ms = elapsed.as_millis() as u64,
        "File finished"
    );
}
