//! HTTP transport for the appliance upload API
//!
//! Posts each file as `multipart/form-data` (field `file`) to
//! `{host}/api/uploads/` with `Authorization: Token <token>`.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use super::{Transport, TransportError, TransportResponse, TransportResult};
use crate::config::RunConfig;
use crate::UploadTarget;

/// Upload endpoint path, relative to the host URL
pub const UPLOAD_ENDPOINT: &str = "/api/uploads/";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("sample-uploader/", env!("CARGO_PKG_VERSION"));

/// Longest response body excerpt kept in debug logs
const MAX_BODY_LOG_LEN: usize = 512;

/// reqwest-backed [`Transport`]
pub struct HttpTransport {
    client: Client,
    upload_url: String,
    token: String,
}

impl HttpTransport {
    /// Wrap an existing client
    ///
    /// # Arguments
    /// * `client` - Configured reqwest client (timeout, TLS policy)
    /// * `host` - Appliance base URL (e.g., "<https://a1000.example.com>")
    /// * `token` - API token
    pub fn new(client: Client, host: &str, token: impl Into<String>) -> Self {
        Self {
            client,
            upload_url: format!("{}{}", host.trim_end_matches('/'), UPLOAD_ENDPOINT),
            token: token.into(),
        }
    }

    /// Build a client honouring the run's timeout and TLS verification settings
    pub fn from_config(config: &RunConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        if !config.verify_tls {
            tracing::warn!("TLS certificate verification is disabled");
        }

        Ok(Self::new(client, &config.host, config.token.clone()))
    }

    /// Full URL uploads are posted to
    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    async fn build_form(target: &UploadTarget) -> Result<Form, TransportError> {
        let bytes = tokio::fs::read(target.path()).await.map_err(|e| {
            TransportError::Unexpected(format!("cannot read {}: {e}", target.path().display()))
        })?;
        let part = Part::bytes(bytes)
            .file_name(target.file_name())
            .mime_str("application/octet-stream")
            .map_err(|e| TransportError::Unexpected(e.to_string()))?;
        Ok(Form::new().part("file", part))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(&self, target: &UploadTarget) -> TransportResult {
        let form = Self::build_form(target).await?;

        debug!(url = %self.upload_url, file = %target.display_name(), "Posting upload");

        let response = self
            .client
            .post(&self.upload_url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Drain the body so the connection can be reused and the reason logged.
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(MAX_BODY_LOG_LEN).collect();
            debug!(status = status.as_u16(), body = %excerpt, "Upload rejected");
        }

        Ok(TransportResponse::new(status.as_u16()))
    }
}
