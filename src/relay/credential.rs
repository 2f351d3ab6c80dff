//! Server-held upstream API key

use crate::error::{RelayError, RelayResult};
use axum::http::HeaderValue;
use std::fmt;

/// Upstream API key, read once at start-up and never derived from client input
///
/// `Debug` and `Display` are redacted so the key cannot end up in logs or
/// error messages by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, treating empty and whitespace-only values as absent
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Read the key from the environment variable `var`
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    /// `Authorization: Bearer <key>` header value, marked sensitive
    pub fn bearer_header(&self) -> RelayResult<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0)).map_err(|_| {
            tracing::error!("Upstream API key contains characters not allowed in a header");
            RelayError::Misconfiguration
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
