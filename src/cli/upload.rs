//! `sample-uploader` command line
//!
//! Resolves flags and `RL_*` environment variables into a [`RunConfig`],
//! builds the HTTP transport and runs the batch.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::progress::ProgressReporter;
use super::{CliError, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS};
use crate::config::{ConfigError, PacingMode, RunConfig, DEFAULT_MAX_RETRIES, MAX_CONCURRENCY};
use crate::metrics;
use crate::report::{HumanReporter, JsonReporter, Reporter};
use crate::shutdown::SharedShutdown;
use crate::transport::HttpTransport;
use crate::uploader::{BatchUploader, RunReport};
use crate::RunSummary;

/// Parse a non-negative number of seconds (fractions allowed)
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("'{s}' must be a non-negative number of seconds"));
    }
    Duration::try_from_secs_f64(value).map_err(|e| format!("'{s}' is out of range: {e}"))
}

/// Parse a strictly positive timeout in seconds
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let timeout = parse_seconds(s)?;
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(timeout)
}

/// Parse and validate concurrency (1..=MAX_CONCURRENCY)
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON lines, one object per event
    Json,
    /// Human-readable console output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

/// Bulk uploader for file-analysis appliances
#[derive(Parser, Debug)]
#[command(name = "sample-uploader")]
#[command(about = "Upload files to a file-analysis appliance", long_about = None)]
#[command(version)]
pub struct Cli {
    /// File or directory to upload
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// File or directory to upload (used when no positional PATH is given)
    #[arg(long = "path", value_name = "PATH", env = "RL_PATH")]
    pub path_flag: Option<PathBuf>,

    /// Appliance base URL, e.g. https://a1000.example.com
    #[arg(long, env = "RL_HOST")]
    pub host: Option<String>,

    /// API token
    #[arg(long, env = "RL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Verify the appliance's TLS certificate (default)
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_verify_ssl")]
    pub verify_ssl: bool,

    /// Skip TLS certificate verification
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "verify_ssl")]
    pub no_verify_ssl: bool,

    /// Descend into subdirectories
    #[arg(
        long,
        env = "RL_RECURSIVE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new(),
        overrides_with = "no_recursive"
    )]
    pub recursive: bool,

    /// Only upload files directly inside PATH (default)
    #[arg(long, action = ArgAction::SetTrue, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Skip files whose base name matches this glob (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Seconds between uploads of distinct files
    #[arg(long, env = "RL_SLEEP", default_value = "2", value_parser = parse_seconds)]
    pub sleep: Duration,

    /// Retries after the first attempt for retryable failures
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Base retry delay in seconds; the n-th retry waits n times this
    #[arg(long, default_value = "5", value_parser = parse_seconds)]
    pub retry_delay: Duration,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "300", value_parser = parse_timeout)]
    pub timeout: Duration,

    /// Measure the sleep interval from the previous file's start or completion
    #[arg(long, default_value = "start")]
    pub pace_from: PacingMode,

    /// Files uploaded at once (1 = strictly sequential)
    #[arg(long, default_value = "1", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Output format (human or json)
    #[arg(long, default_value = "human")]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address, e.g. 127.0.0.1:9090
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Never show a progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl Cli {
    /// Resolve flags and environment into a validated [`RunConfig`]
    pub fn to_run_config(&self) -> Result<RunConfig, CliError> {
        let path = self
            .path
            .clone()
            .or_else(|| self.path_flag.clone())
            .ok_or(ConfigError::MissingPath)?;
        let host = self.host.clone().ok_or(ConfigError::MissingHost)?;
        let token = self.token.clone().ok_or(ConfigError::MissingToken)?;

        let config = RunConfig::new(host, token, path)
            .with_verify_tls(self.verify_ssl || !self.no_verify_ssl)
            .with_recursive(self.recursive && !self.no_recursive)
            .with_exclude_patterns(self.exclude.iter().cloned())
            .with_sleep(self.sleep)
            .with_retries(self.retries, self.retry_delay)
            .with_timeout(self.timeout)
            .with_pacing_mode(self.pace_from)
            .with_concurrency(self.concurrency);

        config.validate()?;
        debug!(?config, "Resolved run configuration");
        Ok(config)
    }

    /// Whether the progress bar should be drawn
    fn show_progress(&self) -> bool {
        !self.no_progress
            && self.output_format == OutputFormat::Human
            && std::io::stderr().is_terminal()
    }

    /// Run the upload and return its summary
    ///
    /// # Errors
    /// [`CliError`] when the run cannot start. Per-file failures are part of
    /// the returned summary.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<RunSummary, CliError> {
        let config = Arc::new(self.to_run_config()?);

        if let Some(addr) = self.metrics_addr {
            metrics::init_metrics(addr)
                .await
                .map_err(|e| CliError::Metrics(e.to_string()))?;
        }

        let transport = Arc::new(HttpTransport::from_config(&config)?);
        let uploader = BatchUploader::new(config, transport).with_shutdown(shutdown);

        let report = match self.output_format {
            OutputFormat::Json => run_with(&uploader, JsonReporter::stdout()).await?,
            OutputFormat::Human if self.show_progress() => {
                run_with(&uploader, ProgressReporter::new(HumanReporter::stdout())).await?
            }
            OutputFormat::Human => run_with(&uploader, HumanReporter::stdout()).await?,
        };

        Ok(report.summary)
    }
}

async fn run_with<R: Reporter>(
    uploader: &BatchUploader,
    mut reporter: R,
) -> Result<RunReport, CliError> {
    Ok(uploader.run(&mut reporter).await?)
}

/// Process exit status for a finished run
///
/// Interruption wins over failures: an interrupted run exits 130 even when
/// some of the attempted files failed.
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else if summary.failed > 0 {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}
