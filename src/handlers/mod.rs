//! HTTP request handlers for chat-relay

use crate::config::Config;
use crate::error::RelayResult;
use crate::middleware::{cors_middleware, request_id_middleware};
use crate::relay::{ApiKey, UpstreamClient};
use axum::{Router, extract::DefaultBodyLimit, middleware};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod relay;

/// Application state shared across all handlers
///
/// Read-only for the lifetime of the process. The API key is `None` when the
/// configured environment variable was unset; relay calls then fail with a
/// misconfiguration error instead of the server refusing to start.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    api_key: Option<Arc<ApiKey>>,
    upstream: Arc<UpstreamClient>,
}

impl AppState {
    /// Create a new AppState from configuration and the start-up credential
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream client cannot be built from config.
    pub fn new(config: Arc<Config>, api_key: Option<ApiKey>) -> RelayResult<Self> {
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);

        Ok(Self {
            config,
            api_key: api_key.map(Arc::new),
            upstream,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the upstream API key, if one is configured
    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_deref()
    }

    /// Get reference to the upstream client
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }
}

/// Build the full application router
///
/// Every path and method lands on the relay handler; preflights are
/// answered by the CORS layer before routing.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.config().server.max_body_bytes;

    Router::new()
        .fallback(relay::handler)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
