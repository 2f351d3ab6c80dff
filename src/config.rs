//! Configuration management for chat-relay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every key has a default, so an empty file (or no file at all) is a valid
//! configuration. The upstream credential is never part of the file: only the
//! name of the environment variable that holds it.

use crate::error::{RelayError, RelayResult};
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

/// Chat-completions endpoint requests are relayed to unless configured otherwise
pub const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
/// Environment variable the upstream API key is read from
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// `HTTP-Referer` sent upstream when the client supplies none
pub const DEFAULT_REFERER: &str = "http://localhost:3000";
/// `X-Title` sent upstream when the client supplies none
pub const DEFAULT_TITLE: &str = "Chat Relay";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Inbound bodies larger than this are rejected before parsing
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Parsed bind address
    ///
    /// Hostnames are rejected rather than falling back to all interfaces.
    pub fn bind_ip(&self) -> RelayResult<IpAddr> {
        self.host.parse::<IpAddr>().map_err(|_| {
            RelayError::Config(format!(
                "server.host must be an IP address (e.g. 127.0.0.1 or 0.0.0.0), got '{}'",
                self.host
            ))
        })
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Upstream API configuration
///
/// Fields are private; the accessors hand out validated values only after
/// `Config::validate()` has accepted them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    url: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_referer")]
    default_referer: String,
    #[serde(default = "default_title")]
    default_title: String,
}

impl UpstreamConfig {
    /// Build an upstream section pointing at `url`, keeping the other defaults
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Full URL of the chat-completions endpoint
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Name of the environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Referer used when the client does not override it
    pub fn default_referer(&self) -> &str {
        &self.default_referer
    }

    /// Title used when the client does not override it
    pub fn default_title(&self) -> &str {
        &self.default_title
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            api_key_env: default_api_key_env(),
            default_referer: default_referer(),
            default_title: default_title(),
        }
    }
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Message previews in logs are cut to this many characters
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_preview_chars() -> usize {
    50
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns a contextual error naming the file if it cannot be read,
    /// does not parse, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RelayResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            RelayError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| RelayError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| RelayError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> RelayResult<()> {
        self.server.bind_ip()?;

        if self.server.port == 0 {
            return Err(RelayError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(RelayError::Config(
                "server.max_body_bytes must be greater than 0".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.upstream.url).map_err(|e| {
            RelayError::Config(format!(
                "upstream.url '{}' is not a valid URL: {}",
                self.upstream.url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::Config(format!(
                "upstream.url must use http:// or https://, got '{}'",
                self.upstream.url
            )));
        }

        if self.upstream.api_key_env.trim().is_empty() {
            return Err(RelayError::Config(
                "upstream.api_key_env cannot be empty".to_string(),
            ));
        }

        for (key, value) in [
            ("upstream.default_referer", &self.upstream.default_referer),
            ("upstream.default_title", &self.upstream.default_title),
        ] {
            if HeaderValue::from_str(value).is_err() {
                return Err(RelayError::Config(format!(
                    "{} is not a valid HTTP header value: {:?}",
                    key, value
                )));
            }
        }

        if self.observability.preview_chars == 0 {
            return Err(RelayError::Config(
                "observability.preview_chars must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = RelayError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| RelayError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
