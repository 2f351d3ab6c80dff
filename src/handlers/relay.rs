//! Relay handler
//!
//! Serves `POST` on every path: validate, forward upstream once, then either
//! return the buffered JSON body or pipe the upstream byte stream through.
//!
//! Checks run in this order and stop at the first failure:
//! 1. method is `POST` (preflights never get here, see `middleware::cors`)
//! 2. an upstream API key is configured
//! 3. the body fits in `server.max_body_bytes` and is JSON
//! 4. `messages` and `modelName` are present and non-empty
//! 5. every message has a known role and text content

use crate::error::RelayError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::relay::{RelayRequest, preview};
use axum::{
    Extension,
    body::{Body, Bytes},
    extract::{
        FromRequest, Request, State,
        rejection::{BytesRejection, FailedToBufferBody},
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::de::IgnoredAny;

/// Media type of the streamed response
const EVENT_STREAM: HeaderValue = HeaderValue::from_static("text/event-stream");

/// Relay one chat-completion request upstream
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    request: Request,
) -> Result<Response, RelayError> {
    if request.method() != Method::POST {
        tracing::debug!(request_id = %request_id, method = %request.method(), "Rejected method");
        return Err(RelayError::MethodNotAllowed);
    }

    let Some(api_key) = state.api_key() else {
        tracing::error!(
            request_id = %request_id,
            api_key_env = %state.config().upstream.api_key_env(),
            "Upstream API key is not configured"
        );
        return Err(RelayError::Misconfiguration);
    };

    // Buffered only after the method and key checks, so an oversized body
    // cannot mask a 405 or 500.
    let body = Bytes::from_request(request, &())
        .await
        .map_err(|rejection| body_read_error(rejection, request_id))?;

    let request = RelayRequest::from_slice(&body).inspect_err(|e| {
        tracing::info!(request_id = %request_id, error = %e, "Rejected relay request");
    })?;

    let preview_chars = state.config().observability.preview_chars;
    tracing::info!(
        request_id = %request_id,
        model = %request.model_name(),
        messages_count = request.messages().len(),
        stream = request.stream(),
        last_message_preview = %request
            .messages()
            .last()
            .map(|m| preview(m.content(), preview_chars))
            .unwrap_or_default(),
        "Relaying chat request"
    );

    let upstream_response = state
        .upstream()
        .send(api_key, &request, request_id)
        .await?;

    if request.stream() {
        Ok(stream_response(upstream_response, request_id))
    } else {
        buffered_response(upstream_response, request_id, preview_chars).await
    }
}

/// Map a failed inbound body read onto the relay error taxonomy
fn body_read_error(rejection: BytesRejection, request_id: RequestId) -> RelayError {
    match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            tracing::info!(request_id = %request_id, "Rejected oversized request body");
            RelayError::PayloadTooLarge
        }
        other => {
            tracing::warn!(request_id = %request_id, error = %other, "Failed to read request body");
            RelayError::InvalidJson
        }
    }
}

/// Pipe the upstream body through chunk by chunk
///
/// Chunks are polled from upstream only when the outbound body asks for more,
/// so a slow client slows the upstream read. Frames are forwarded as is; the
/// upstream is expected to already speak Server-Sent Events.
fn stream_response(upstream: reqwest::Response, request_id: RequestId) -> Response {
    tracing::info!(request_id = %request_id, "Streaming upstream response");

    let chunks = upstream
        .bytes_stream()
        .inspect_ok(move |chunk| {
            tracing::trace!(request_id = %request_id, bytes = chunk.len(), "Forwarded chunk");
        })
        .inspect_err(move |e| {
            tracing::warn!(request_id = %request_id, error = %e, "Upstream stream interrupted");
        });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, EVENT_STREAM),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
        ],
        Body::from_stream(chunks),
    )
        .into_response()
}

/// Read the whole upstream body, check it is JSON, and return it verbatim
async fn buffered_response(
    upstream: reqwest::Response,
    request_id: RequestId,
    preview_chars: usize,
) -> Result<Response, RelayError> {
    let body = upstream.bytes().await.map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Failed to read upstream body");
        RelayError::Transport(e.to_string())
    })?;

    if let Err(e) = serde_json::from_slice::<IgnoredAny>(&body) {
        tracing::error!(
            request_id = %request_id,
            body_preview = %preview(&String::from_utf8_lossy(&body), preview_chars),
            "Upstream body is not JSON"
        );
        return Err(RelayError::InvalidUpstreamBody(e.to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        bytes = body.len(),
        "Returning upstream response"
    );

    Ok((
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response())
}
