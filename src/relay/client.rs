//! Upstream chat-completions client
//!
//! Issues exactly one request per relay call. Non-success statuses are read
//! as text and turned into [`RelayError::Upstream`]; connection failures
//! become [`RelayError::Transport`]. Nothing is retried.

use crate::config::UpstreamConfig;
use crate::error::{RelayError, RelayResult};
use crate::middleware::RequestId;
use crate::relay::{ApiKey, RelayRequest, preview};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};

/// Informational header identifying the calling site to the upstream
pub const HTTP_REFERER: HeaderName = HeaderName::from_static("http-referer");
/// Informational header naming the calling application to the upstream
pub const X_TITLE: HeaderName = HeaderName::from_static("x-title");

/// Upstream error bodies are cut to this many characters in logs
const ERROR_PREVIEW_CHARS: usize = 200;

/// Shared client for the single upstream endpoint
///
/// Holds one pooled `reqwest::Client`; cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    default_referer: HeaderValue,
    default_title: HeaderValue,
}

impl UpstreamClient {
    /// Create a client from the `[upstream]` config section
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if a default header value is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> RelayResult<Self> {
        let default_referer = HeaderValue::from_str(config.default_referer()).map_err(|e| {
            RelayError::Config(format!("invalid upstream.default_referer: {}", e))
        })?;
        let default_title = HeaderValue::from_str(config.default_title())
            .map_err(|e| RelayError::Config(format!("invalid upstream.default_title: {}", e)))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.url().to_string(),
            default_referer,
            default_title,
        })
    }

    /// Upstream endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Forward `request` upstream and return the successful response unread
    ///
    /// The caller decides whether to buffer the body or pipe it through.
    pub async fn send(
        &self,
        api_key: &ApiKey,
        request: &RelayRequest,
        request_id: RequestId,
    ) -> RelayResult<reqwest::Response> {
        let referer = identification_header(request.referer(), &self.default_referer);
        let title = identification_header(request.title(), &self.default_title);

        let response = self
            .http
            .post(&self.url)
            .header(header::AUTHORIZATION, api_key.bearer_header()?)
            .header(header::CONTENT_TYPE, "application/json")
            .header(HTTP_REFERER, referer)
            .header(X_TITLE, title)
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    request_id = %request_id,
                    upstream_url = %self.url,
                    error = %e,
                    "Upstream request failed"
                );
                RelayError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        status = %status,
                        error = %e,
                        "Failed to read upstream error body"
                    );
                    None
                }
            };
            let message = upstream_error_message(status, body);
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                error_preview = %preview(&message, ERROR_PREVIEW_CHARS),
                "Upstream returned an error status"
            );
            return Err(RelayError::Upstream { status, message });
        }

        tracing::debug!(
            request_id = %request_id,
            status = %status,
            "Upstream accepted request"
        );

        Ok(response)
    }
}

/// Message wrapped into `RelayError::Upstream`
///
/// Falls back to the status's reason phrase when the upstream body is empty
/// or could not be read.
fn upstream_error_message(status: StatusCode, body: Option<String>) -> String {
    match body {
        Some(body) if !body.trim().is_empty() => body,
        _ => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("status {}", status.as_u16())),
    }
}

/// Client override if it is a valid header value, otherwise the default
fn identification_header(client_value: Option<&str>, default: &HeaderValue) -> HeaderValue {
    client_value
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| default.clone())
}
