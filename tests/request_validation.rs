//! Inbound validation tests for the relay endpoint.
//!
//! Every rejected request must fail before the upstream is contacted, so each
//! test mounts a mock upstream that expects zero calls.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chat_relay::{
    config::{Config, UpstreamConfig},
    handlers::{self, AppState},
    relay::ApiKey,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::any};

async fn silent_upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .expect(0)
        .mount(&server)
        .await;
    server
}

fn create_test_app(upstream: &MockServer, api_key: Option<&str>) -> Router {
    let config = Config {
        upstream: UpstreamConfig::with_url(format!("{}/v1/chat/completions", upstream.uri())),
        ..Config::default()
    };
    let state = AppState::new(Arc::new(config), api_key.and_then(ApiKey::new))
        .expect("AppState::new should succeed");
    handlers::app(state)
}

async fn post(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*",
        "error responses must carry CORS headers"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).expect("error body should be JSON");
    (status, json)
}

fn error_text(json: &Value) -> &str {
    json["error"].as_str().expect("error should be a string")
}

// -------------------------------------------------------------------------
// Credential
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_api_key_returns_500_for_valid_body() {
    let upstream = silent_upstream().await;
    let app = create_test_app(&upstream, None);

    let (status, json) = post(
        app,
        json!({"messages": [{"role": "user", "content": "Hi"}], "modelName": "m"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_text(&json), "Server configuration error");
}

#[tokio::test]
async fn test_missing_api_key_returns_500_for_invalid_body() {
    let upstream = silent_upstream().await;

    for body in ["{broken", "{}", r#"{"messages": [{"role": "x"}], "modelName": "m"}"#] {
        let app = create_test_app(&upstream, None);
        let (status, _) = post(app, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {body}");
    }
}

#[tokio::test]
async fn test_blank_api_key_counts_as_missing() {
    let upstream = silent_upstream().await;
    let app = create_test_app(&upstream, Some("   "));

    let (status, _) = post(
        app,
        json!({"messages": [{"role": "user", "content": "Hi"}], "modelName": "m"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// -------------------------------------------------------------------------
// Body shape
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let upstream = silent_upstream().await;

    for body in ["", "{", "not json", r#"{"messages": [}"#, "{'single': 'quotes'}"] {
        let app = create_test_app(&upstream, Some("sk-test"));
        let (status, json) = post(app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body:?}");
        assert!(
            error_text(&json).contains("invalid JSON"),
            "unexpected error for {body:?}: {json}"
        );
    }
}

#[tokio::test]
async fn test_missing_fields_return_400() {
    let upstream = silent_upstream().await;

    for body in [
        json!({}),
        json!({"modelName": "openai/gpt-4o"}),
        json!({"messages": [], "modelName": "openai/gpt-4o"}),
        json!({"messages": [{"role": "user", "content": "Hi"}]}),
        json!({"messages": [{"role": "user", "content": "Hi"}], "modelName": ""}),
        json!({"messages": [{"role": "user", "content": "Hi"}], "modelName": null}),
    ] {
        let app = create_test_app(&upstream, Some("sk-test"));
        let (status, json) = post(app, body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(
            error_text(&json).contains("Missing required fields"),
            "unexpected error for {body}: {json}"
        );
    }
}

#[tokio::test]
async fn test_invalid_messages_return_400() {
    let upstream = silent_upstream().await;

    for message in [
        json!({"role": "tool", "content": "x"}),
        json!({"role": "function", "content": "x"}),
        json!({"role": "user", "content": 1}),
        json!({"role": "user", "content": null}),
        json!({"role": "user", "content": {"text": "x"}}),
        json!({"content": "no role"}),
    ] {
        let app = create_test_app(&upstream, Some("sk-test"));
        let body = json!({
            "messages": [{"role": "system", "content": "ok"}, message.clone()],
            "modelName": "openai/gpt-4o"
        });
        let (status, json) = post(app, body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "message: {message}");
        assert!(
            error_text(&json).contains("Invalid message format"),
            "unexpected error for {message}: {json}"
        );
    }
}

// -------------------------------------------------------------------------
// Body size
// -------------------------------------------------------------------------

/// App with a 64-byte body limit
fn create_small_limit_app(upstream: &MockServer, api_key: Option<&str>) -> Router {
    let mut config = Config {
        upstream: UpstreamConfig::with_url(format!("{}/v1/chat/completions", upstream.uri())),
        ..Config::default()
    };
    config.server.max_body_bytes = 64;
    let state = AppState::new(Arc::new(config), api_key.and_then(ApiKey::new))
        .expect("AppState::new should succeed");
    handlers::app(state)
}

fn oversized_body() -> String {
    json!({
        "messages": [{"role": "user", "content": "x".repeat(1024)}],
        "modelName": "m"
    })
    .to_string()
}

#[tokio::test]
async fn test_oversized_body_is_rejected_with_json_error() {
    let upstream = silent_upstream().await;
    let app = create_small_limit_app(&upstream, Some("sk-test"));

    let (status, json) = post(app, oversized_body()).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_text(&json), "Request body too large");
}

#[tokio::test]
async fn test_oversized_body_does_not_mask_method_check() {
    let upstream = silent_upstream().await;

    for method in ["GET", "PUT"] {
        let app = create_small_limit_app(&upstream, Some("sk-test"));
        let request = Request::builder()
            .method(method)
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(oversized_body()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).expect("error body should be JSON");
        assert_eq!(error_text(&json), "Method not allowed");
    }
}

#[tokio::test]
async fn test_oversized_body_does_not_mask_missing_api_key() {
    let upstream = silent_upstream().await;
    let app = create_small_limit_app(&upstream, None);

    let (status, json) = post(app, oversized_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_text(&json), "Server configuration error");
}
