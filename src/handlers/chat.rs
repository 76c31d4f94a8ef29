//! Chat endpoint handler
//!
//! Handles POST /chat by relaying the answer of the generation endpoint as a
//! plain-text stream.

use crate::error::AppError;
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::metrics::ChatOutcome;
use crate::middleware::RequestId;
use crate::relay::{ChatTurn, SESSION_HEADER};
use axum::{
    Extension,
    body::Body,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Maximum allowed message length in characters (100K chars)
const MAX_MESSAGE_LENGTH: usize = 100_000;

/// Chat request body as sent by the dashboard
///
/// Every field is optional at this stage so that a missing or blank message
/// is reported as `Message is required` rather than as a JSON error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
}

/// Validated chat request
///
/// Only constructed through `TryFrom<ChatPayload>`, so a held value always
/// has a non-blank message within the length limit.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    message: String,
    history: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the previous turns, oldest first
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }
}

impl TryFrom<ChatPayload> for ChatRequest {
    type Error = AppError;

    fn try_from(payload: ChatPayload) -> Result<Self, Self::Error> {
        let message = payload.message.unwrap_or_default();
        if message.trim().is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }

        // Count Unicode characters, not bytes
        let char_count = message.chars().count();
        if char_count > MAX_MESSAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "Message exceeds maximum length of {} characters (got {})",
                MAX_MESSAGE_LENGTH, char_count
            )));
        }

        Ok(ChatRequest {
            message,
            history: payload.history.unwrap_or_default(),
        })
    }
}

/// Extract the caller's chat session ID, ignoring blank values
fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// POST /chat handler
///
/// Returns `200 text/plain` with the relayed answer streamed as it arrives.
/// Validation failures answer 400 without contacting the upstream; an
/// unreachable upstream answers 503 with `fallback: true`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<ApiJson<ChatPayload>, AppError>,
) -> Result<Response, AppError> {
    let request = payload
        .and_then(|ApiJson(payload)| ChatRequest::try_from(payload))
        .inspect_err(|e| {
            tracing::debug!(request_id = %request_id, error = %e, "Rejected chat request");
            state.metrics().chat_request(ChatOutcome::Rejected);
        })?;

    let session_id = session_id(&headers);

    tracing::info!(
        request_id = %request_id,
        session_id = ?session_id,
        message_length = request.message().chars().count(),
        history_turns = request.history().len(),
        "Received chat request"
    );

    let stream = state
        .relay()
        .start(request.message(), request.history(), session_id, request_id)
        .await
        .inspect_err(|e| {
            let outcome = match e {
                AppError::ServiceUnavailable { .. } => ChatOutcome::Unavailable,
                _ => ChatOutcome::Failed,
            };
            state.metrics().chat_request(outcome);
        })?;

    state.metrics().chat_request(ChatOutcome::Streamed);

    let body = Body::from_stream(stream.map(Ok::<_, Infallible>));
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}
