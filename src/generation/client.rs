//! HTTP client for the generation endpoint
//!
//! Wraps a shared `reqwest::Client` with the configured endpoint and model.

use crate::config::GenerationConfig;
use crate::error::{AppError, AppResult};
use std::time::Duration;

use super::types::{GenerateRequest, GenerateResponse};

/// Client for `POST {base_url}/api/generate`
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    request_timeout: Duration,
}

impl GenerationClient {
    /// Create a new client from configuration
    ///
    /// Only the connect timeout applies to every call. Streaming calls must
    /// not carry a total timeout, or long answers would be cut off.
    pub fn new(config: &GenerationConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/generate", config.base_url()),
            model: config.model().to_string(),
            request_timeout: config.request_timeout(),
        })
    }

    /// Get the full generate URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a streaming generation
    ///
    /// Returns the upstream response once its status is known to be a
    /// success; the body has not been read yet.
    ///
    /// # Errors
    ///
    /// `AppError::ServiceUnavailable` if the connection fails or the upstream
    /// answers with a non-success status.
    pub async fn stream(&self, prompt: &str, system: Option<&str>) -> AppResult<reqwest::Response> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: true,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Failed to reach generation endpoint"
                );
                AppError::generation_unavailable()
            })?;

        if !response.status().is_success() {
            tracing::error!(
                endpoint = %self.endpoint,
                status = %response.status(),
                "Generation endpoint returned non-success status"
            );
            return Err(AppError::generation_unavailable());
        }

        Ok(response)
    }

    /// Run a non-streaming generation and return the generated text
    ///
    /// # Errors
    ///
    /// - `AppError::ServiceUnavailable` on connection failure, timeout or
    ///   non-success status
    /// - `AppError::Internal` if the body is not a generate response
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> AppResult<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Non-streaming generation request failed"
                );
                AppError::generation_unavailable()
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                endpoint = %self.endpoint,
                status = %response.status(),
                "Non-streaming generation returned non-success status"
            );
            return Err(AppError::generation_unavailable());
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            AppError::Internal(format!("Invalid response from generation endpoint: {}", e))
        })?;

        Ok(parsed.response)
    }
}
