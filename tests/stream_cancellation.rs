//! Integration tests for relay lifetime
//!
//! A hand-driven upstream controls chunk boundaries and observes when the
//! relay closes its connection.

mod common;

use agrirelay::metrics::ChatOutcome;
use agrirelay::relay::SESSION_HEADER;
use axum::http::StatusCode;
use common::{RawUpstream, app_for, body_text, post_json, send};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_multibyte_character_split_across_chunks() {
    let upstream = RawUpstream::bind().await;
    let (app, _) = app_for(&upstream.base_url());

    let server = tokio::spawn(async move {
        let mut conn = upstream.accept().await;
        assert!(conn.request.starts_with("POST /api/generate"));
        conn.send_head().await;

        let body = "{\"response\":\"Namaste \"}\n{\"response\":\"🌾\"}\n{\"response\":\" ok\",\"done\":true}\n"
            .as_bytes();
        let emoji_start = body.iter().position(|&b| b == 0xF0).unwrap();

        conn.send_chunk(&body[..emoji_start + 2]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        conn.send_chunk(&body[emoji_start + 2..]).await;
        conn.finish().await;
    });

    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Namaste 🌾 ok");

    server.await.unwrap();
}

#[tokio::test]
async fn test_fragments_arrive_before_upstream_finishes() {
    let upstream = RawUpstream::bind().await;
    let (app, _) = app_for(&upstream.base_url());
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let mut conn = upstream.accept().await;
        conn.send_head().await;
        conn.send_chunk(b"{\"response\":\"First\"}\n").await;
        let _ = release_rx.await;
        conn.send_chunk(b"{\"response\":\" second\",\"done\":true}\n").await;
        conn.finish().await;
    });

    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;
    let mut body = response.into_body().into_data_stream();

    let first = timeout(WAIT, body.next())
        .await
        .expect("first fragment should not wait for the rest")
        .unwrap()
        .unwrap();
    assert_eq!(&first[..], b"First");

    release_tx.send(()).unwrap();
    let second = timeout(WAIT, body.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(&second[..], b" second");
    assert!(timeout(WAIT, body.next()).await.unwrap().is_none());

    server.await.unwrap();
}

#[tokio::test]
async fn test_dropping_response_closes_upstream_connection() {
    let upstream = RawUpstream::bind().await;
    let (app, state) = app_for(&upstream.base_url());
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut conn = upstream.accept().await;
        conn.send_head().await;
        conn.send_chunk(b"{\"response\":\"Partial\"}\n").await;
        // Never finish: only a caller disconnect ends this connection
        conn.wait_for_close().await;
        let _ = closed_tx.send(());
    });

    let mut request = post_json("/chat", r#"{"message":"Hi"}"#);
    request
        .headers_mut()
        .insert(SESSION_HEADER, "farmer-7".parse().unwrap());
    let response = send(&app, request).await;
    let mut body = response.into_body().into_data_stream();

    let first = timeout(WAIT, body.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(&first[..], b"Partial");
    assert!(state.relay().sessions().is_active("farmer-7"));

    drop(body);

    timeout(WAIT, closed_rx)
        .await
        .expect("upstream connection should close once the caller goes away")
        .unwrap();
    assert!(!state.relay().sessions().is_active("farmer-7"));
}

#[tokio::test]
async fn test_new_message_supersedes_running_relay() {
    let upstream = RawUpstream::bind().await;
    let (app, state) = app_for(&upstream.base_url());
    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut first = upstream.accept().await;
        first.send_head().await;
        first.send_chunk(b"{\"response\":\"Old answer\"}\n").await;

        let mut second = upstream.accept().await;
        second.send_head().await;
        second
            .send_chunk(b"{\"response\":\"New answer\",\"done\":true}\n")
            .await;
        second.finish().await;

        first.wait_for_close().await;
        let _ = closed_tx.send(());
    });

    let session_request = |message: &str| {
        let mut request = post_json("/chat", &serde_json::json!({ "message": message }).to_string());
        request
            .headers_mut()
            .insert(SESSION_HEADER, "farmer-9".parse().unwrap());
        request
    };

    let first = send(&app, session_request("First question")).await;
    let mut first_body = first.into_body().into_data_stream();
    let chunk = timeout(WAIT, first_body.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(&chunk[..], b"Old answer");

    let second = send(&app, session_request("Second question")).await;
    assert_eq!(second.status(), StatusCode::OK);

    // The superseded relay ends without further output
    assert!(timeout(WAIT, first_body.next()).await.unwrap().is_none());
    drop(first_body);

    assert_eq!(body_text(second).await, "New answer");
    timeout(WAIT, closed_rx)
        .await
        .expect("superseded upstream connection should close")
        .unwrap();

    assert_eq!(state.metrics().superseded_sessions_count(), 1);
    assert_eq!(state.metrics().chat_requests_count(ChatOutcome::Streamed), 2);
}

#[tokio::test]
async fn test_upstream_dropping_mid_stream_truncates_body() {
    let upstream = RawUpstream::bind().await;
    let (app, state) = app_for(&upstream.base_url());

    tokio::spawn(async move {
        let mut conn = upstream.accept().await;
        conn.send_head().await;
        conn.send_chunk(b"{\"response\":\"Half an \"}\n{\"respo").await;
        // Connection dropped without a terminating chunk
    });

    let response = send(&app, post_json("/chat", r#"{"message":"Hi"}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = timeout(WAIT, body_text(response)).await.unwrap();
    assert_eq!(text, "Half an ");
    assert_eq!(state.metrics().mid_stream_failures_count(), 1);
}
