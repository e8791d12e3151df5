//! CLI error types and conversions

use crate::config::ConfigError;
use crate::transport::TransportError;
use crate::uploader::UploadError;

/// CLI errors. Every variant is fatal and maps to exit status 2.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be resolved
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Run aborted before any upload
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// HTTP client could not be built
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Prometheus exporter could not be installed
    #[error("metrics error: {0}")]
    Metrics(String),
}
