//! Crop classification backends
//!
//! The classifier is an opaque HTTP model: it receives a soil reading and
//! answers `{"predicted_crop": "..."}`.

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::time::Duration;

use super::soil::SoilReading;

/// Crops offered when the classifier cannot answer
pub const FALLBACK_CROPS: &[&str] = &[
    "Rice",
    "Wheat",
    "Maize",
    "Cotton",
    "Sugarcane",
    "Potato",
    "Tomato",
];

/// Pick a fallback crop uniformly at random
pub fn choose_fallback<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FALLBACK_CROPS.choose(rng).copied().unwrap_or("Rice")
}

/// Something that can name a suitable crop for a soil reading
#[async_trait]
pub trait CropClassifier: Send + Sync {
    /// Predict the crop for `soil`
    ///
    /// # Errors
    ///
    /// - `AppError::Config` when the classifier is not configured; callers
    ///   must surface this instead of falling back
    /// - any other error when the model call fails
    async fn classify(&self, soil: &SoilReading) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct Prediction {
    predicted_crop: String,
}

/// Classifier backed by an HTTP model endpoint
#[derive(Clone, Debug)]
pub struct HttpCropClassifier {
    http: reqwest::Client,
    url: Option<String>,
}

impl HttpCropClassifier {
    /// Create a classifier for `url`; `None` leaves it unconfigured
    pub fn new(url: Option<&str>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build crop model client: {}", e)))?;

        Ok(Self {
            http,
            url: url.map(str::to_string),
        })
    }
}

#[async_trait]
impl CropClassifier for HttpCropClassifier {
    async fn classify(&self, soil: &SoilReading) -> AppResult<String> {
        let Some(url) = &self.url else {
            return Err(AppError::Config(
                "crop model URL is not configured".to_string(),
            ));
        };

        let response = self
            .http
            .post(url)
            .json(soil)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Crop model request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Crop model returned status {}",
                response.status()
            )));
        }

        let prediction: Prediction = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid crop model response: {}", e)))?;

        Ok(prediction.predicted_crop)
    }
}
