//! Wire types for the `/api/generate` protocol

use serde::{Deserialize, Serialize};

/// Request body sent to the generation endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub stream: bool,
}

/// One line of a streamed generation
///
/// Only `response` is consumed; every other field the upstream sends
/// (`done`, `model`, `created_at`, timing counters) is ignored whatever its
/// type.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: Option<String>,
}

/// Body of a non-streaming generation
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}
