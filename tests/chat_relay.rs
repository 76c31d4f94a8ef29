//! Integration tests for the /chat streaming relay
//!
//! The generation endpoint is a wiremock server answering with NDJSON, so the
//! whole path (validation, prompt assembly, decoding, streaming response) is
//! exercised without a real model.

mod common;

use agrirelay::metrics::ChatOutcome;
use agrirelay::relay::SYSTEM_PROMPT;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{app_for, body_json, body_text, ndjson, post_json, send};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_answer(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_chat_relays_fragments_in_order() {
    let server = MockServer::start().await;
    mount_answer(&server, ndjson(&["Hello", " ", "world"])).await;

    let (app, state) = app_for(&server.uri());
    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(body_text(response).await, "Hello world");

    assert_eq!(state.metrics().chat_requests_count(ChatOutcome::Streamed), 1);
    assert_eq!(state.metrics().relayed_fragments_count(), 3);
}

#[tokio::test]
async fn test_chat_sends_prompt_history_and_system_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3",
            "stream": true,
            "system": SYSTEM_PROMPT,
            "prompt": "User: Hi\nAssistant: Namaste!\nUser: How much urea per acre?\nAssistant:",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(ndjson(&["About 50 kg."]), "application/x-ndjson"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = app_for(&server.uri());
    let response = send(
        &app,
        post_json(
            "/chat",
            r#"{"message":"How much urea per acre?","history":[{"role":"user","content":"Hi"},{"role":"assistant","content":"Namaste!"}]}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "About 50 kg.");
}

#[tokio::test]
async fn test_malformed_line_is_skipped() {
    let server = MockServer::start().await;
    let body = "{\"response\":\"Sow \"}\nnot json at all\n{\"response\":\"in October\"}\n{\"done\":true}\n";
    mount_answer(&server, body.to_string()).await;

    let (app, state) = app_for(&server.uri());
    let response = send(&app, post_json("/chat", r#"{"message":"When to sow wheat?"}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Sow in October");
    assert_eq!(state.metrics().malformed_lines_count(), 1);
}

#[tokio::test]
async fn test_trailing_line_without_newline_is_relayed() {
    let server = MockServer::start().await;
    mount_answer(
        &server,
        "{\"response\":\"Water \"}\n{\"response\":\"twice a week\"}".to_string(),
    )
    .await;

    let (app, _) = app_for(&server.uri());
    let response = send(&app, post_json("/chat", r#"{"message":"Irrigation?"}"#)).await;

    assert_eq!(body_text(response).await, "Water twice a week");
}

#[tokio::test]
async fn test_empty_answer_is_empty_body() {
    let server = MockServer::start().await;
    mount_answer(&server, ndjson(&[])).await;

    let (app, _) = app_for(&server.uri());
    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "");
}

#[tokio::test]
async fn test_identical_requests_relay_identical_bodies() {
    let server = MockServer::start().await;
    mount_answer(&server, ndjson(&["Use ", "drip ", "irrigation", "."])).await;

    let (app, _) = app_for(&server.uri());
    let first = body_text(send(&app, post_json("/chat", r#"{"message":"Tips?"}"#)).await).await;
    let second = body_text(send(&app, post_json("/chat", r#"{"message":"Tips?"}"#)).await).await;

    assert_eq!(first, "Use drip irrigation.");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_blank_message_rejected_without_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, state) = app_for(&server.uri());
    for body in [r#"{"message":""}"#, r#"{"message":"   "}"#, r#"{}"#] {
        let response = send(&app, post_json("/chat", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Message is required", "body: {}", body);
    }

    assert_eq!(state.metrics().chat_requests_count(ChatOutcome::Rejected), 3);
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let server = MockServer::start().await;
    let (app, _) = app_for(&server.uri());

    let response = send(&app, post_json("/chat", "{not json")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_rejected() {
    let server = MockServer::start().await;
    let (app, _) = app_for(&server.uri());

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .body(Body::from(r#"{"message":"Hi"}"#))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Content-Type must be application/json"
    );
}

#[tokio::test]
async fn test_upstream_error_status_is_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .expect(1)
        .mount(&server)
        .await;

    let (app, state) = app_for(&server.uri());
    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "AI service is currently unavailable. Please try again later."
    );
    assert_eq!(json["fallback"], true);
    assert_eq!(
        state.metrics().chat_requests_count(ChatOutcome::Unavailable),
        1
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_service_unavailable() {
    // Nothing listens on the discard port
    let (app, _) = app_for("http://127.0.0.1:9");
    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["fallback"], true);
}

#[tokio::test]
async fn test_every_response_carries_request_id() {
    let server = MockServer::start().await;
    mount_answer(&server, ndjson(&["ok"])).await;
    let (app, _) = app_for(&server.uri());

    let ok = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;
    assert!(ok.headers().contains_key("x-request-id"));

    let rejected = send(&app, post_json("/chat", r#"{"message":""}"#)).await;
    assert!(rejected.headers().contains_key("x-request-id"));

    let supplied = "0b7e2f0a-52c4-4b7e-9d6e-2a51f5d7f3a1";
    let mut request = post_json("/chat", r#"{"message":"Hi"}"#);
    request
        .headers_mut()
        .insert("x-request-id", supplied.parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], supplied);
}
