//! Shared helpers for integration tests

#![allow(dead_code)]

use agrirelay::config::Config;
use agrirelay::handlers::{self, AppState};
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

/// Config pointing the generation endpoint at `base_url`
pub fn config_for(base_url: &str) -> Config {
    Config::from_str(&format!(
        r#"
[server]
host = "127.0.0.1"
port = 3000

[generation]
base_url = "{}"
model = "llama3"
"#,
        base_url
    ))
    .expect("should parse test config")
}

/// Full application router against the given generation endpoint
pub fn app_for(base_url: &str) -> (Router, AppState) {
    let state = AppState::new(Arc::new(config_for(base_url))).expect("should create AppState");
    (handlers::router(state.clone()), state)
}

/// Build a JSON POST request
pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request through a clone of the router
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Collect a response body as UTF-8 text
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Encode newline-terminated NDJSON fragments the way the generation endpoint does
pub fn ndjson(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&serde_json::json!({ "response": fragment, "done": false }).to_string());
        body.push('\n');
    }
    body.push_str(r#"{"response":"","done":true}"#);
    body.push('\n');
    body
}

/// Hand-driven HTTP/1.1 upstream for tests that need control over chunk
/// boundaries or connection lifetime
pub struct RawUpstream {
    listener: TcpListener,
}

impl RawUpstream {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.listener.local_addr().unwrap())
    }

    /// Accept one connection and consume its request
    pub async fn accept(&self) -> UpstreamConnection {
        let (mut socket, _) = self.listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        UpstreamConnection { socket, request }
    }
}

pub struct UpstreamConnection {
    socket: TcpStream,
    pub request: String,
}

impl UpstreamConnection {
    /// Send the response head of a chunked NDJSON answer
    pub async fn send_head(&mut self) {
        self.socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  content-type: application/x-ndjson\r\n\
                  transfer-encoding: chunked\r\n\r\n",
            )
            .await
            .unwrap();
        self.socket.flush().await.unwrap();
    }

    /// Send one body chunk
    pub async fn send_chunk(&mut self, data: &[u8]) {
        let mut frame = format!("{:x}\r\n", data.len()).into_bytes();
        frame.extend_from_slice(data);
        frame.extend_from_slice(b"\r\n");
        self.socket.write_all(&frame).await.unwrap();
        self.socket.flush().await.unwrap();
    }

    /// Terminate the chunked body
    pub async fn finish(&mut self) {
        self.socket.write_all(b"0\r\n\r\n").await.unwrap();
        self.socket.flush().await.unwrap();
    }

    /// Wait until the peer closes the connection
    pub async fn wait_for_close(mut self) {
        let mut buf = [0u8; 1024];
        loop {
            match self.socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a request");
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    String::from_utf8_lossy(&data).into_owned()
}
