//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Model the relay forwards to
    pub generation_model: String,
    /// Chat sessions with a relay in flight
    pub active_sessions: usize,
}

/// Health check handler
///
/// Always 200 while the process serves requests; the generation upstream is
/// not probed.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            generation_model: state.relay().client().model().to_string(),
            active_sessions: state.relay().sessions().active_count(),
        }),
    )
}
