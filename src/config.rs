//! Run configuration
//!
//! [`RunConfig`] is built once by the configuration source (the CLI, or an
//! embedding application) and shared read-only for the whole run. Nothing
//! below this module reads environment variables or config files.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::scanner::ExcludeFilter;

/// Seconds to wait between uploads of distinct files.
/// Matches the appliance's implicit per-client submission budget.
pub const DEFAULT_SLEEP_SECS: f64 = 2.0;

/// Retries after the first attempt (so 4 attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base retry delay; the n-th retry waits `n * base`.
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 5.0;

/// HTTP request timeout. Large samples over slow links need minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Upper bound for concurrent uploads.
pub const MAX_CONCURRENCY: usize = 8;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No host configured
    #[error("host is required")]
    MissingHost,

    /// No token configured
    #[error("token is required")]
    MissingToken,

    /// No path configured
    #[error("path is required")]
    MissingPath,

    /// Host is not a usable http(s) URL
    #[error("invalid host URL {url:?}: {reason}")]
    InvalidHost {
        /// Host as given
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Exclude pattern does not compile
    #[error("invalid exclude pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern as given
        pattern: String,
        /// Parser message
        reason: String,
    },

    /// Numeric or combination constraint violated
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Reference point for inter-file pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Measure the interval from when the previous file's first attempt started
    #[default]
    FromStart,
    /// Measure the interval from when the previous file finished
    FromCompletion,
}

impl FromStr for PacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(PacingMode::FromStart),
            "completion" | "finish" => Ok(PacingMode::FromCompletion),
            _ => Err(format!(
                "Invalid pacing mode: {s}. Valid options: start, completion"
            )),
        }
    }
}

impl fmt::Display for PacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacingMode::FromStart => write!(f, "start"),
            PacingMode::FromCompletion => write!(f, "completion"),
        }
    }
}

/// Fully resolved settings for one run
#[derive(Clone)]
pub struct RunConfig {
    /// Base URL of the analysis appliance
    pub host: String,
    /// API token
    pub token: String,
    /// Verify the server's TLS certificate
    pub verify_tls: bool,
    /// File or directory to upload
    pub path: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Shell-glob patterns matched against file base names
    pub exclude_patterns: Vec<String>,
    /// Minimum spacing between distinct files
    pub sleep: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base of the linear retry backoff
    pub retry_delay_base: Duration,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Where the pacing interval is measured from
    pub pacing_mode: PacingMode,
    /// Files in flight at once (1 = strictly sequential)
    pub concurrency: usize,
}

impl RunConfig {
    /// Create a config with default pacing, retry and timeout settings
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            verify_tls: true,
            path: path.into(),
            recursive: false,
            exclude_patterns: Vec::new(),
            sleep: Duration::from_secs_f64(DEFAULT_SLEEP_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_base: Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pacing_mode: PacingMode::default(),
            concurrency: 1,
        }
    }

    /// Enable or disable TLS certificate verification
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Enable or disable recursion into subdirectories
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the exclude patterns
    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the inter-file pacing interval
    pub fn with_sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }

    /// Set the retry budget and backoff base
    pub fn with_retries(mut self, max_retries: u32, retry_delay_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_base = retry_delay_base;
        self
    }

    /// Set the HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pacing reference point
    pub fn with_pacing_mode(mut self, pacing_mode: PacingMode) -> Self {
        self.pacing_mode = pacing_mode;
        self
    }

    /// Set how many files may be in flight at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Compile the exclude patterns
    pub fn exclude_filter(&self) -> Result<ExcludeFilter, ConfigError> {
        ExcludeFilter::new(&self.exclude_patterns)
    }

    /// Check every invariant the core relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        let url = reqwest::Url::parse(host).map_err(|e| ConfigError::InvalidHost {
            url: self.host.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidHost {
                url: self.host.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidValue(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if self.concurrency > 1 && self.pacing_mode == PacingMode::FromCompletion {
            return Err(ConfigError::InvalidValue(
                "completion pacing requires concurrency 1".to_string(),
            ));
        }

        self.exclude_filter()?;
        Ok(())
    }

    /// Total attempts allowed per file
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("path", &self.path)
            .field("recursive", &self.recursive)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("sleep", &self.sleep)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_base", &self.retry_delay_base)
            .field("timeout", &self.timeout)
            .field("pacing_mode", &self.pacing_mode)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
